//! The structured manifest (`scene.json`).
//!
//! The manifest is the authoritative re-import path. It stores every exported
//! object's raw live-frame transform, with rotation as intrinsic XYZ Euler
//! angles in radians:
//!
//! ```json
//! { "version": 1,
//!   "assets": [ { "id": "a1", "name": "Box", "mainFile": "assets/Box/box.glb",
//!                 "position": {"x":1,"y":2,"z":3},
//!                 "rotation": {"x":0,"y":0,"z":0},
//!                 "scale": {"x":1,"y":1,"z":1},
//!                 "disableGravity": true } ] }
//! ```

use glam::DVec3;
use serde::{Deserialize, Serialize};

use composer_scene::frame;
use composer_scene::transform::Transform;

use crate::BundleError;

/// Manifest format version written by this crate.
pub const MANIFEST_VERSION: u32 = 1;

/// A `{x, y, z}` triple as it appears in the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<DVec3> for Xyz {
    fn from(v: DVec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

impl From<Xyz> for DVec3 {
    fn from(v: Xyz) -> Self {
        DVec3::new(v.x, v.y, v.z)
    }
}

fn unit_scale() -> Xyz {
    DVec3::ONE.into()
}

fn zero() -> Xyz {
    DVec3::ZERO.into()
}

/// One object entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAsset {
    pub id: String,
    pub name: String,
    /// Bundle path of the main geometry file (`assets/<folder>/<file>`).
    pub main_file: String,
    #[serde(default = "zero")]
    pub position: Xyz,
    /// Intrinsic XYZ Euler angles, radians, live frame.
    #[serde(default = "zero")]
    pub rotation: Xyz,
    #[serde(default = "unit_scale")]
    pub scale: Xyz,
    #[serde(default)]
    pub disable_gravity: bool,
}

impl ManifestAsset {
    /// The live-frame transform this entry describes.
    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position.into(),
            orientation: frame::quat_from_euler_xyz(self.rotation.into()),
            scale: self.scale.into(),
        }
    }

    /// Store a live-frame transform into this entry.
    pub fn set_transform(&mut self, transform: &Transform) {
        self.position = transform.position.into();
        self.rotation = frame::quat_to_euler_xyz(transform.orientation).into();
        self.scale = transform.scale.into();
    }
}

/// The whole manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub assets: Vec<ManifestAsset>,
}

impl Manifest {
    pub fn new(assets: Vec<ManifestAsset>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            assets,
        }
    }

    /// Parse manifest JSON. Any syntax or shape error is a hard failure.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, BundleError> {
        let manifest: Manifest =
            serde_json::from_slice(bytes).map_err(|e| BundleError::MalformedManifest {
                details: e.to_string(),
            })?;
        if manifest.version > MANIFEST_VERSION {
            tracing::warn!(
                version = manifest.version,
                supported = MANIFEST_VERSION,
                "manifest is newer than this reader, reading known fields only"
            );
        }
        Ok(manifest)
    }

    pub fn to_vec(&self, pretty: bool) -> Result<Vec<u8>, BundleError> {
        let result = if pretty {
            serde_json::to_vec_pretty(self)
        } else {
            serde_json::to_vec(self)
        };
        result.map_err(|e| BundleError::MalformedManifest {
            details: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DQuat;

    #[test]
    fn json_shape_uses_camel_case_keys() {
        let mut asset = ManifestAsset {
            id: "a1".into(),
            name: "Box".into(),
            main_file: "assets/Box/box.glb".into(),
            position: zero(),
            rotation: zero(),
            scale: unit_scale(),
            disable_gravity: true,
        };
        asset.set_transform(&Transform::from_position(DVec3::new(1.0, 2.0, 3.0)));
        let json: serde_json::Value =
            serde_json::from_slice(&Manifest::new(vec![asset]).to_vec(false).unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        let entry = &json["assets"][0];
        assert_eq!(entry["mainFile"], "assets/Box/box.glb");
        assert_eq!(entry["disableGravity"], true);
        assert_eq!(entry["position"]["y"], 2.0);
    }

    #[test]
    fn optional_fields_default() {
        let json = br#"{"version":1,"assets":[{"id":"x","name":"X","mainFile":"assets/X/x.obj"}]}"#;
        let manifest = Manifest::from_slice(json).unwrap();
        let t = manifest.assets[0].transform();
        assert_eq!(t.position, DVec3::ZERO);
        assert_eq!(t.scale, DVec3::ONE);
        assert!(!manifest.assets[0].disable_gravity);
    }

    #[test]
    fn malformed_json_is_a_hard_error() {
        let err = Manifest::from_slice(b"{ not json").unwrap_err();
        assert!(matches!(err, BundleError::MalformedManifest { .. }));
    }

    #[test]
    fn rotation_survives_euler_storage() {
        let q = DQuat::from_euler(glam::EulerRot::XYZ, 0.3, -0.2, 1.4);
        let mut asset = ManifestAsset {
            id: "r".into(),
            name: "R".into(),
            main_file: "assets/R/r.obj".into(),
            position: zero(),
            rotation: zero(),
            scale: unit_scale(),
            disable_gravity: false,
        };
        asset.set_transform(&Transform {
            orientation: q,
            ..Transform::IDENTITY
        });
        let back = asset.transform().orientation;
        assert!(composer_scene::transform::same_rotation(q, back, 1e-9));
    }
}
