//! Composer Scene -- the data model shared by every layer of the composer.
//!
//! This crate owns the plain value types the rest of the workspace operates
//! on: [`Transform`](transform::Transform), [`SceneObject`](object::SceneObject),
//! [`SpawnVolume`](volume::SpawnVolume), [`PoseSnapshot`](snapshot::PoseSnapshot)
//! and the [`Scene`](scene::Scene) container. It also hosts the frame
//! converter, which maps transforms between the renderer's Y-up frame and
//! the Z-up export frame.
//!
//! # Quick Start
//!
//! ```
//! use composer_scene::prelude::*;
//! use glam::DVec3;
//!
//! let mut scene = Scene::new();
//! let mut table = SceneObject::new("t1", "Table", AssetRef::new("Table", "table.glb"));
//! table.transform.position = DVec3::new(1.0, 2.0, 3.0);
//! table.disable_gravity = true;
//! scene.add_object(table).unwrap();
//!
//! let exported = frame::position_to_export(DVec3::new(1.0, 2.0, 3.0));
//! assert_eq!(exported, DVec3::new(1.0, -3.0, 2.0));
//! assert_eq!(scene.static_exportable_count(), 1);
//! ```

#![deny(unsafe_code)]

pub mod bounds;
pub mod frame;
pub mod object;
pub mod scene;
pub mod snapshot;
pub mod transform;
pub mod volume;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by scene model operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// No object with the given id exists in the scene.
    #[error("object '{id}' does not exist in the scene")]
    UnknownObject { id: String },

    /// An object with the given id is already part of the scene.
    #[error("object id '{id}' is already used in the scene")]
    DuplicateObject { id: String },

    /// A spawn volume was built with `min > max` on some axis.
    #[error("spawn volume axis {axis} is inverted (min {min} > max {max})")]
    InvertedVolume { axis: char, min: f64, max: f64 },

    /// A spawn volume bound is NaN or infinite.
    #[error("spawn volume axis {axis} has a non-finite bound (min {min}, max {max})")]
    NonFiniteVolume { axis: char, min: f64, max: f64 },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::bounds::Aabb;
    pub use crate::frame;
    pub use crate::object::{AssetRef, SceneObject};
    pub use crate::scene::Scene;
    pub use crate::snapshot::PoseSnapshot;
    pub use crate::transform::{Pose, Transform};
    pub use crate::volume::SpawnVolume;
    pub use crate::SceneError;
}
