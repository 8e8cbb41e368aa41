//! Pose snapshots.
//!
//! A [`PoseSnapshot`] records where a set of objects were at one point in
//! time. Snapshots back both accepted conditions (episodes) and the saved
//! pre-randomization poses a caller can revert to. They are immutable once
//! built.

use std::collections::BTreeMap;

use crate::transform::Pose;

/// Mapping from object id to the live-frame pose it had when captured.
///
/// Uses `BTreeMap` so iteration (and anything serialized from it) is in a
/// deterministic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseSnapshot {
    poses: BTreeMap<String, Pose>,
}

impl PoseSnapshot {
    /// Pose captured for `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Pose> {
        self.poses.get(id)
    }

    pub fn len(&self) -> usize {
        self.poses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Iterate `(id, pose)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Pose)> {
        self.poses.iter().map(|(id, pose)| (id.as_str(), pose))
    }

    /// Object ids present in this snapshot.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.poses.keys().map(String::as_str)
    }
}

impl FromIterator<(String, Pose)> for PoseSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, Pose)>>(iter: I) -> Self {
        Self {
            poses: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{DQuat, DVec3};

    #[test]
    fn iteration_is_ordered_by_id() {
        let snapshot: PoseSnapshot = [
            ("b".to_owned(), Pose::default()),
            ("a".to_owned(), Pose::new(DVec3::X, DQuat::IDENTITY)),
        ]
        .into_iter()
        .collect();

        let ids: Vec<&str> = snapshot.ids().collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(snapshot.get("a").map(|p| p.position), Some(DVec3::X));
        assert!(snapshot.get("missing").is_none());
    }
}
