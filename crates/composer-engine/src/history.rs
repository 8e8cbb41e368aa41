//! Accepted pose conditions ("episodes").
//!
//! The history is append-only: entries are never edited in place, only
//! appended one at a time or cleared together. Export writes them in
//! insertion order.

use composer_scene::snapshot::PoseSnapshot;

/// Ordered list of accepted pose snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionHistory {
    entries: Vec<PoseSnapshot>,
}

impl ConditionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a snapshot and return its zero-based episode index.
    pub fn push(&mut self, snapshot: PoseSnapshot) -> usize {
        self.entries.push(snapshot);
        let index = self.entries.len() - 1;
        tracing::debug!(episode = index, objects = self.entries[index].len(), "condition accepted");
        index
    }

    /// Drop every entry.
    pub fn clear(&mut self) {
        if !self.entries.is_empty() {
            tracing::debug!(dropped = self.entries.len(), "condition history cleared");
        }
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, episode: usize) -> Option<&PoseSnapshot> {
        self.entries.get(episode)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoseSnapshot> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[PoseSnapshot] {
        &self.entries
    }
}

impl FromIterator<PoseSnapshot> for ConditionHistory {
    fn from_iter<I: IntoIterator<Item = PoseSnapshot>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
