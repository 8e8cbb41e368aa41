//! Conversion between the live frame and the export frame.
//!
//! - **Live frame**: right-handed, Y-up, +Z toward the viewer. Objects are
//!   edited in this frame.
//! - **Export frame**: right-handed, Z-up, +Y to the left of +X forward. The
//!   portable bundle stores transforms in this frame.
//!
//! The mapping is a fixed +90 degree rotation about X, so every function here
//! is a component permutation with a sign flip. Nothing is renormalized and
//! non-finite inputs pass through unchanged.
//!
//! ```
//! use composer_scene::frame;
//! use glam::DVec3;
//!
//! let live = DVec3::new(0.1, 0.2, 0.3);
//! let export = frame::position_to_export(live);
//! assert_eq!(export, DVec3::new(0.1, -0.3, 0.2));
//! assert_eq!(frame::position_from_export(export), live);
//! ```

use glam::{DQuat, DVec3, EulerRot};

use crate::transform::{Pose, Transform};

// ---------------------------------------------------------------------------
// Positions
// ---------------------------------------------------------------------------

/// Live `(x, y, z)` to export `(x, -z, y)`.
#[inline]
pub fn position_to_export(p: DVec3) -> DVec3 {
    DVec3::new(p.x, -p.z, p.y)
}

/// Export `(x, y, z)` to live `(x, z, -y)`.
#[inline]
pub fn position_from_export(p: DVec3) -> DVec3 {
    DVec3::new(p.x, p.z, -p.y)
}

// ---------------------------------------------------------------------------
// Orientations
// ---------------------------------------------------------------------------

/// Live `(w, x, y, z)` to export `(w, x, -z, y)`.
#[inline]
pub fn orientation_to_export(q: DQuat) -> DQuat {
    DQuat::from_xyzw(q.x, -q.z, q.y, q.w)
}

/// Export `(w, x, y, z)` to live `(w, x, z, -y)`.
#[inline]
pub fn orientation_from_export(q: DQuat) -> DQuat {
    DQuat::from_xyzw(q.x, q.z, -q.y, q.w)
}

// ---------------------------------------------------------------------------
// Scale
// ---------------------------------------------------------------------------

/// Swap the Y and Z scale factors. Scale has no sign along a physical axis,
/// so the swap is its own inverse.
#[inline]
pub fn scale_to_export(s: DVec3) -> DVec3 {
    DVec3::new(s.x, s.z, s.y)
}

/// Inverse of [`scale_to_export`] (the same permutation).
#[inline]
pub fn scale_from_export(s: DVec3) -> DVec3 {
    scale_to_export(s)
}

// ---------------------------------------------------------------------------
// Legacy Euler angles (degrees)
// ---------------------------------------------------------------------------

/// Live Euler triple `(rx, ry, rz)` to export `(rx, -rz, ry)`.
#[inline]
pub fn euler_degrees_to_export(r: DVec3) -> DVec3 {
    DVec3::new(r.x, -r.z, r.y)
}

/// Export Euler triple `(rx, ry, rz)` to live `(rx, rz, -ry)`.
#[inline]
pub fn euler_degrees_from_export(r: DVec3) -> DVec3 {
    DVec3::new(r.x, r.z, -r.y)
}

/// Quaternion from intrinsic XYZ Euler angles in radians.
pub fn quat_from_euler_xyz(radians: DVec3) -> DQuat {
    DQuat::from_euler(EulerRot::XYZ, radians.x, radians.y, radians.z)
}

/// Intrinsic XYZ Euler angles in radians from a quaternion.
pub fn quat_to_euler_xyz(q: DQuat) -> DVec3 {
    let (x, y, z) = q.to_euler(EulerRot::XYZ);
    DVec3::new(x, y, z)
}

// ---------------------------------------------------------------------------
// Whole transforms
// ---------------------------------------------------------------------------

/// Map a live-frame transform into the export frame.
pub fn transform_to_export(t: &Transform) -> Transform {
    Transform {
        position: position_to_export(t.position),
        orientation: orientation_to_export(t.orientation),
        scale: scale_to_export(t.scale),
    }
}

/// Map an export-frame transform into the live frame.
pub fn transform_from_export(t: &Transform) -> Transform {
    Transform {
        position: position_from_export(t.position),
        orientation: orientation_from_export(t.orientation),
        scale: scale_from_export(t.scale),
    }
}

/// Map a live-frame pose into the export frame.
pub fn pose_to_export(p: &Pose) -> Pose {
    Pose::new(
        position_to_export(p.position),
        orientation_to_export(p.orientation),
    )
}

/// Map an export-frame pose into the live frame.
pub fn pose_from_export(p: &Pose) -> Pose {
    Pose::new(
        position_from_export(p.position),
        orientation_from_export(p.orientation),
    )
}
