//! The scene description document (`scene.usda`).
//!
//! The description is a redundant, export-frame encoding of the scene: one
//! `Xform` block per exported object under a `World` root, each carrying a
//! reference to the object's payload, its translate/orient/scale ops and its
//! kinematic flag. It is written deterministically ([`writer`]) and read back
//! with a small recursive-descent parser ([`parser`]) when a bundle has no
//! manifest.

pub mod lexer;
pub mod parser;
pub mod writer;

use glam::{DQuat, DVec3};

use composer_scene::frame;
use composer_scene::transform::Transform;

use crate::BundleError;
use parser::{Layer, Prim, Value};

/// Name of the root prim every block is nested under.
pub const ROOT_PRIM: &str = "World";

pub const ATTR_TRANSLATE: &str = "xformOp:translate";
pub const ATTR_ORIENT: &str = "xformOp:orient";
pub const ATTR_ROTATE_XYZ: &str = "xformOp:rotateXYZ";
pub const ATTR_SCALE: &str = "xformOp:scale";
pub const ATTR_OP_ORDER: &str = "xformOpOrder";
pub const ATTR_KINEMATIC: &str = "physics:kinematicEnabled";

/// The operation order every block declares.
pub const OP_ORDER: [&str; 3] = [ATTR_TRANSLATE, ATTR_ORIENT, ATTR_SCALE];

// ---------------------------------------------------------------------------
// DescriptionBlock
// ---------------------------------------------------------------------------

/// The fields of one object block, in the export frame.
///
/// Missing fields take their defaults: zero translate, no orientation, unit
/// scale, not kinematic.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptionBlock {
    /// Sanitized block identifier.
    pub identifier: String,
    /// Payload reference, as written (e.g. `./assets/Box/box.glb`).
    pub reference: Option<String>,
    pub translate: DVec3,
    /// `(w, x, y, z)` quaternion, if present.
    pub orientation: Option<DQuat>,
    /// Legacy Euler angles in degrees, if present.
    pub rotate_xyz: Option<DVec3>,
    pub scale: DVec3,
    pub kinematic: bool,
}

impl DescriptionBlock {
    /// A block with every field at its default.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            reference: None,
            translate: DVec3::ZERO,
            orientation: None,
            rotate_xyz: None,
            scale: DVec3::ONE,
            kinematic: false,
        }
    }

    /// Orientation in the export frame. The quaternion wins over the legacy
    /// Euler triple; with neither the orientation is identity.
    pub fn export_orientation(&self) -> DQuat {
        if let Some(q) = self.orientation {
            return q;
        }
        match self.rotate_xyz {
            Some(degrees) => {
                // Legacy angles are converted in the live frame, where they
                // were authored, then brought back to export.
                let live = frame::euler_degrees_from_export(degrees);
                let q = frame::quat_from_euler_xyz(live * std::f64::consts::PI / 180.0);
                frame::orientation_to_export(q)
            }
            None => DQuat::IDENTITY,
        }
    }

    /// The block's transform in the export frame.
    pub fn export_transform(&self) -> Transform {
        Transform {
            position: self.translate,
            orientation: self.export_orientation(),
            scale: self.scale,
        }
    }

    /// The block's transform converted into the live frame.
    pub fn live_transform(&self) -> Transform {
        frame::transform_from_export(&self.export_transform())
    }

    /// Build a block from a parsed prim.
    fn from_prim(prim: &Prim) -> Self {
        let mut block = DescriptionBlock::new(prim.name.clone());
        block.reference = prim
            .metadata("references")
            .or_else(|| prim.metadata("payload"))
            .and_then(Value::first_asset)
            .map(str::to_owned);

        let numbers3 = |name: &str| {
            prim.attribute(name)
                .and_then(|a| a.value.as_ref())
                .and_then(Value::as_numbers::<3>)
                .map(DVec3::from_array)
        };

        if let Some(t) = numbers3(ATTR_TRANSLATE) {
            block.translate = t;
        }
        if let Some(s) = numbers3(ATTR_SCALE) {
            block.scale = s;
        }
        block.rotate_xyz = numbers3(ATTR_ROTATE_XYZ);
        block.orientation = prim
            .attribute(ATTR_ORIENT)
            .and_then(|a| a.value.as_ref())
            .and_then(Value::as_numbers::<4>)
            .map(|[w, x, y, z]| DQuat::from_xyzw(x, y, z, w));
        block.kinematic = prim
            .attribute(ATTR_KINEMATIC)
            .and_then(|a| a.value.as_ref())
            .and_then(Value::as_bool)
            .unwrap_or(false);
        block
    }
}

// ---------------------------------------------------------------------------
// Description
// ---------------------------------------------------------------------------

/// A parsed description document.
#[derive(Debug, Clone, PartialEq)]
pub struct Description {
    /// Declared up axis (`"Z"` for documents this crate writes).
    pub up_axis: Option<String>,
    pub meters_per_unit: Option<f64>,
    pub blocks: Vec<DescriptionBlock>,
}

impl Description {
    /// Parse `scene.usda` text.
    pub fn parse(src: &str) -> Result<Self, BundleError> {
        let layer = parser::parse_layer(src)?;
        Ok(Self::from_layer(&layer))
    }

    /// Extract object blocks from a parsed layer.
    ///
    /// Every prim below the top level is a candidate block; top-level prims
    /// are only blocks when they carry a reference or transform ops, so a
    /// plain `World` container is skipped.
    pub fn from_layer(layer: &Layer) -> Self {
        // Root prims are containers unless they carry object data; every
        // nested prim is a block.
        let blocks = layer
            .walk()
            .into_iter()
            .filter(|(depth, prim)| *depth > 0 || is_object_block(prim))
            .map(|(_, prim)| DescriptionBlock::from_prim(prim))
            .collect();
        Self {
            up_axis: layer
                .metadata("upAxis")
                .and_then(Value::as_str)
                .map(str::to_owned),
            meters_per_unit: layer.metadata("metersPerUnit").and_then(Value::as_f64),
            blocks,
        }
    }

    /// First block with the given identifier.
    pub fn block(&self, identifier: &str) -> Option<&DescriptionBlock> {
        self.blocks.iter().find(|b| b.identifier == identifier)
    }
}

fn is_object_block(prim: &Prim) -> bool {
    prim.metadata("references").is_some()
        || prim.metadata("payload").is_some()
        || prim.attribute(ATTR_TRANSLATE).is_some()
        || prim.attribute(ATTR_ORIENT).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let doc = Description::parse("def Xform \"World\" { def Xform \"Empty\" {} }").unwrap();
        let block = doc.block("Empty").unwrap();
        assert_eq!(block.translate, DVec3::ZERO);
        assert_eq!(block.scale, DVec3::ONE);
        assert!(!block.kinematic);
        assert_eq!(block.export_orientation(), DQuat::IDENTITY);
        assert!(doc.block("World").is_none());
    }

    #[test]
    fn blocks_follow_document_order_at_any_depth() {
        let src = r#"
def Xform "Loose" {
    double3 xformOp:translate = (1, 2, 3)
}
def Xform "World" {
    def Xform "Shelf" {
        def Xform "Book" {}
    }
    def Xform "Cup" {}
}"#;
        let doc = Description::parse(src).unwrap();
        let ids: Vec<&str> = doc.blocks.iter().map(|b| b.identifier.as_str()).collect();
        assert_eq!(ids, vec!["Loose", "Shelf", "Book", "Cup"]);
        assert_eq!(doc.block("Loose").unwrap().translate, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn quaternion_takes_precedence_over_euler() {
        let src = r#"
def Xform "World" {
    def Xform "Both" {
        quatd xformOp:orient = (0.7071067811865476, 0, 0, 0.7071067811865476)
        double3 xformOp:rotateXYZ = (45, 0, 0)
    }
}"#;
        let doc = Description::parse(src).unwrap();
        let q = doc.block("Both").unwrap().export_orientation();
        assert!(q.abs_diff_eq(DQuat::from_rotation_z(std::f64::consts::FRAC_PI_2), 1e-12));
    }

    #[test]
    fn legacy_euler_is_used_without_quaternion() {
        let src = r#"
def Xform "World" {
    def Xform "Legacy" {
        float3 xformOp:rotateXYZ = (0, 0, 90)
    }
}"#;
        let doc = Description::parse(src).unwrap();
        let block = doc.block("Legacy").unwrap();
        // 90 degrees about export Z is a yaw, i.e. 90 degrees about live Y.
        let live = block.live_transform().orientation;
        assert!(live.abs_diff_eq(DQuat::from_rotation_y(std::f64::consts::FRAC_PI_2), 1e-9));
    }

    #[test]
    fn kinematic_flag_accepts_numeric_bool() {
        let src = "def Xform \"World\" { def Xform \"K\" { bool physics:kinematicEnabled = 1 } }";
        let doc = Description::parse(src).unwrap();
        assert!(doc.block("K").unwrap().kinematic);
    }
}
