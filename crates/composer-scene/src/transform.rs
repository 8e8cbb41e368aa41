//! Object transforms and poses.
//!
//! A [`Transform`] is the full placement of an object (position, orientation,
//! scale). A [`Pose`] is the subset captured by condition snapshots: position
//! and orientation only, since placement never changes scale.

use glam::{DQuat, DVec3};

// ---------------------------------------------------------------------------
// Pose
// ---------------------------------------------------------------------------

/// Position and orientation of an object, without scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Translation.
    pub position: DVec3,
    /// Unit quaternion orientation.
    pub orientation: DQuat,
}

impl Pose {
    /// Create a pose from its parts.
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(DVec3::ZERO, DQuat::IDENTITY)
    }
}

// ---------------------------------------------------------------------------
// Transform
// ---------------------------------------------------------------------------

/// Position, orientation and scale of an object.
///
/// Orientation is expected to stay unit-length and scale components are
/// expected to be non-zero. Neither is enforced here: values coming from
/// documents are taken as-is and non-finite values propagate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Translation.
    pub position: DVec3,
    /// Unit quaternion orientation.
    pub orientation: DQuat,
    /// Per-axis scale.
    pub scale: DVec3,
}

impl Transform {
    /// The identity transform: origin, no rotation, unit scale.
    pub const IDENTITY: Self = Self {
        position: DVec3::ZERO,
        orientation: DQuat::IDENTITY,
        scale: DVec3::ONE,
    };

    /// Identity transform moved to `position`.
    pub fn from_position(position: DVec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// The position/orientation part of this transform.
    pub fn pose(&self) -> Pose {
        Pose::new(self.position, self.orientation)
    }

    /// Replace position and orientation, keeping the scale.
    pub fn set_pose(&mut self, pose: Pose) {
        self.position = pose.position;
        self.orientation = pose.orientation;
    }

    /// Compare two transforms component-wise within `tolerance`.
    ///
    /// Orientations compare equal when they describe the same rotation, so
    /// `q` and `-q` match.
    pub fn approx_eq(&self, other: &Transform, tolerance: f64) -> bool {
        self.position.abs_diff_eq(other.position, tolerance)
            && self.scale.abs_diff_eq(other.scale, tolerance)
            && same_rotation(self.orientation, other.orientation, tolerance)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Whether two quaternions describe the same rotation within `tolerance`.
pub fn same_rotation(a: DQuat, b: DQuat, tolerance: f64) -> bool {
    a.abs_diff_eq(b, tolerance) || a.abs_diff_eq(-b, tolerance)
}
