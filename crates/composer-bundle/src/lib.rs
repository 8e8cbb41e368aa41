//! Composer Bundle -- the portable scene bundle and its documents.
//!
//! A bundle is a flat set of named byte streams ([`BundleFiles`](files::BundleFiles)):
//!
//! | Path                      | Contents                                      |
//! |---------------------------|-----------------------------------------------|
//! | `scene.usda`              | export-frame description document             |
//! | `scene.json`              | live-frame manifest, the authoritative import |
//! | `initial_conditions.json` | instruction plus accepted pose conditions     |
//! | `assets/<identifier>/...` | per-object payload files                      |
//!
//! [`codec`] builds and parses bundles; [`transport`] moves them in and out
//! of a single storable unit (memory, directory or tar archive).
//!
//! # Example
//!
//! ```
//! use composer_bundle::prelude::*;
//! use composer_scene::prelude::*;
//!
//! let mut scene = Scene::new();
//! let mut table = SceneObject::new("t1", "Table", AssetRef::new("Table", "table.glb"));
//! table.disable_gravity = true;
//! scene.add_object(table).unwrap();
//! scene.set_instruction("clear the table");
//!
//! let files = export_bundle(&scene, &[], &ExportOptions::default()).unwrap();
//! let parsed = parse_bundle(&files).unwrap();
//! assert_eq!(parsed.objects[0].name, "Table");
//! assert_eq!(parsed.instruction, "clear the table");
//! ```

#![deny(unsafe_code)]

pub mod codec;
pub mod files;
pub mod manifest;
pub mod naming;
pub mod poses;
pub mod transport;
pub mod usda;

use std::path::PathBuf;

/// Description document file name.
pub const DESCRIPTION_FILE: &str = "scene.usda";
/// Manifest file name.
pub const MANIFEST_FILE: &str = "scene.json";
/// Pose document file name.
pub const POSES_FILE: &str = "initial_conditions.json";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced while building, parsing or transporting a bundle.
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// Export was attempted with an empty or whitespace-only instruction.
    #[error("cannot export: the task instruction is empty")]
    MissingInstruction,

    /// Export was attempted without any static (gravity-disabled) object.
    #[error("cannot export: no exported object is static (gravity disabled)")]
    NoStaticObject,

    /// `scene.json` is present but could not be read or written.
    #[error("malformed manifest: {details}")]
    MalformedManifest { details: String },

    /// `initial_conditions.json` could not be read or written.
    #[error("malformed pose document: {details}")]
    MalformedPoseDocument { details: String },

    /// `scene.usda` failed to tokenize or parse.
    #[error("malformed description at {line}:{column}: {details}")]
    MalformedDescription {
        line: usize,
        column: usize,
        details: String,
    },

    /// Filesystem failure in a transport.
    #[error("i/o error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The archive container itself could not be built or read.
    #[error("archive error: {details}")]
    Archive { details: String },
}

impl BundleError {
    /// True for the two export preconditions (instruction and static object).
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::MissingInstruction | Self::NoStaticObject)
    }
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::codec::{
        export_bundle, parse_bundle, ExportOptions, ImportSource, ParsedBundle, ParsedObject,
    };
    pub use crate::files::BundleFiles;
    pub use crate::naming::sanitize_name;
    pub use crate::transport::{ArchiveTransport, DirectoryTransport, MemoryTransport, TarTransport};
    pub use crate::BundleError;
    pub use crate::{DESCRIPTION_FILE, MANIFEST_FILE, POSES_FILE};
}
