//! Composer Engine -- randomized placement, condition history and the
//! editing session.
//!
//! This crate builds on [`composer_scene`] and [`composer_bundle`]:
//!
//! - [`placement`] draws collision-free random poses for movable objects
//!   inside the spawn volume.
//! - [`history`] accumulates accepted pose conditions.
//! - [`loader`] turns asset folders into placeable geometry.
//! - [`session`] ties them together behind [`ComposerSession`](session::ComposerSession),
//!   including bundle export and atomic import.
//!
//! # Quick Start
//!
//! ```
//! use composer_engine::prelude::*;
//!
//! let mut session = ComposerSession::new(ComposerConfig::default()).unwrap();
//! let mesh = b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec();
//! let mut shelf = SceneObject::new(
//!     "s1",
//!     "Shelf",
//!     AssetRef::new("Shelf", "shelf.obj").with_file("shelf.obj", mesh),
//! );
//! shelf.disable_gravity = true;
//! session.add_object(shelf).unwrap();
//! session.set_instruction("tidy the shelf");
//!
//! let files = session.export_bundle().unwrap();
//! let mut other = ComposerSession::new(ComposerConfig::default()).unwrap();
//! other.import_bundle(&files).unwrap();
//! assert_eq!(other.scene().objects()[0].name, "Shelf");
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod history;
pub mod loader;
pub mod observer;
pub mod placement;
pub mod session;

use composer_bundle::BundleError;
use composer_scene::SceneError;

use crate::loader::LoadError;

/// Re-export the scene crate for convenience.
pub use composer_scene;

/// Re-export the bundle crate for convenience.
pub use composer_bundle;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors surfaced by session operations.
#[derive(Debug, thiserror::Error)]
pub enum ComposerError {
    #[error(transparent)]
    Scene(#[from] SceneError),

    #[error(transparent)]
    Bundle(#[from] BundleError),

    #[error(transparent)]
    Load(#[from] LoadError),

    /// A configuration value is out of range.
    #[error("invalid configuration: {details}")]
    InvalidConfig { details: String },

    /// Restore was requested before any placement pass.
    #[error("no saved poses to restore; run a placement pass first")]
    NothingSaved,
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use composer_bundle::prelude::*;
    pub use composer_scene::prelude::*;

    pub use crate::config::{ComposerConfig, ExportConfig, PlacementConfig};
    pub use crate::history::ConditionHistory;
    pub use crate::loader::{GeometryLoader, LoadError, LoadedGeometry, MeshBoundsLoader};
    pub use crate::observer::{RecordingObserver, SceneEvent, SceneObserver};
    pub use crate::placement::{PlacedObject, PlacementEngine, PlacementPass, SavedPoses};
    pub use crate::session::{ComposerSession, ImportReport};
    pub use crate::ComposerError;
}
