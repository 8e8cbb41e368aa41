//! Scene objects and their geometry references.

use std::collections::BTreeMap;

use crate::bounds::Aabb;
use crate::transform::Transform;

// ---------------------------------------------------------------------------
// AssetRef
// ---------------------------------------------------------------------------

/// Reference to the geometry payload backing an object.
///
/// The payload itself is opaque to the composer: it is carried as named byte
/// streams so it can be written back into a bundle untouched. Only the local
/// bounding box (computed by the geometry loader, un-rotated and un-scaled)
/// is used for placement.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRef {
    /// Asset folder name, as it appeared under `assets/` or as the dropped
    /// folder's name.
    pub folder: String,
    /// Path of the main geometry file, relative to the folder.
    pub main_file: String,
    /// Every payload file, keyed by path relative to the folder.
    pub files: BTreeMap<String, Vec<u8>>,
    /// Local bounds of the geometry in the live frame.
    pub local_bounds: Aabb,
}

impl AssetRef {
    /// An asset reference with no payload bytes and unit-cube bounds.
    pub fn new(folder: impl Into<String>, main_file: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            main_file: main_file.into(),
            files: BTreeMap::new(),
            local_bounds: Aabb::unit(),
        }
    }

    /// Builder-style setter for the local bounds.
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.local_bounds = bounds;
        self
    }

    /// Builder-style setter adding one payload file.
    pub fn with_file(mut self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.insert(path.into(), bytes);
        self
    }
}

// ---------------------------------------------------------------------------
// SceneObject
// ---------------------------------------------------------------------------

/// An object placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    /// Stable identifier, unique within a scene.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Live-frame transform.
    pub transform: Transform,
    /// Backing geometry.
    pub asset: AssetRef,
    /// Excluded from selection and placement.
    pub locked: bool,
    /// Never serialized into any bundle artifact.
    pub exclude_from_export: bool,
    /// Static/kinematic for physics; static objects are never placed.
    pub disable_gravity: bool,
}

impl SceneObject {
    /// A new object at the identity transform with every flag cleared.
    pub fn new(id: impl Into<String>, name: impl Into<String>, asset: AssetRef) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            transform: Transform::IDENTITY,
            asset,
            locked: false,
            exclude_from_export: false,
            disable_gravity: false,
        }
    }

    /// Eligible for randomized placement: not locked, not excluded, gravity on.
    pub fn is_movable(&self) -> bool {
        !self.locked && !self.exclude_from_export && !self.disable_gravity
    }

    pub fn is_exportable(&self) -> bool {
        !self.exclude_from_export
    }

    /// Gravity disabled.
    pub fn is_static(&self) -> bool {
        self.disable_gravity
    }

    /// Local bounds scaled by the object's scale, with neutral orientation.
    pub fn scaled_local_bounds(&self) -> Aabb {
        self.asset.local_bounds.scaled(self.transform.scale)
    }

    /// World-space bounds under the current transform.
    pub fn world_bounds(&self) -> Aabb {
        self.asset.local_bounds.transformed(&self.transform)
    }
}
