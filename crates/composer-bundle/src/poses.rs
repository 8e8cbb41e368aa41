//! The multi-episode pose document (`initial_conditions.json`).
//!
//! ```json
//! { "instruction": "pick up the box",
//!   "poses": [ { "Box": [x, y, z, qx, qy, qz, qw] }, ... ] }
//! ```
//!
//! Keys are block identifiers; values are export-frame poses.

use std::collections::BTreeMap;

use glam::{DQuat, DVec3};
use serde::{Deserialize, Serialize};

use composer_scene::transform::Pose;

use crate::BundleError;

/// `[x, y, z, qx, qy, qz, qw]`.
pub type PoseArray = [f64; 7];

/// Flatten a pose into its document array.
pub fn pose_to_array(pose: &Pose) -> PoseArray {
    let p = pose.position;
    let q = pose.orientation;
    [p.x, p.y, p.z, q.x, q.y, q.z, q.w]
}

/// Rebuild a pose from its document array.
pub fn pose_from_array(a: &PoseArray) -> Pose {
    Pose::new(
        DVec3::new(a[0], a[1], a[2]),
        DQuat::from_xyzw(a[3], a[4], a[5], a[6]),
    )
}

/// One accepted condition: identifier to export-frame pose.
pub type ConditionEntry = BTreeMap<String, PoseArray>;

/// The whole pose document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseDocument {
    #[serde(default)]
    pub instruction: String,
    #[serde(default)]
    pub poses: Vec<ConditionEntry>,
}

impl PoseDocument {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BundleError> {
        serde_json::from_slice(bytes).map_err(|e| BundleError::MalformedPoseDocument {
            details: e.to_string(),
        })
    }

    pub fn to_vec(&self, pretty: bool) -> Result<Vec<u8>, BundleError> {
        let result = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };
        result.map_err(|e| BundleError::MalformedPoseDocument {
            details: e.to_string(),
        })
    }
}
