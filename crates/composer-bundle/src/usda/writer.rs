//! Deterministic writer for the scene description document.
//!
//! Output for a given set of blocks is byte-for-byte stable: numbers use
//! Rust's shortest round-trip `f64` formatting and blocks keep caller order.

use std::fmt::{self, Write};

use super::{
    DescriptionBlock, ATTR_KINEMATIC, ATTR_OP_ORDER, ATTR_ORIENT, ATTR_SCALE, ATTR_TRANSLATE,
    OP_ORDER, ROOT_PRIM,
};

const INDENT: &str = "    ";

/// Render a complete `scene.usda` document.
///
/// Each block must already be in the export frame and carry an orientation;
/// blocks without one are written with the identity quaternion.
pub fn write_description(blocks: &[DescriptionBlock]) -> String {
    DescriptionText(blocks).to_string()
}

/// Display adapter over the blocks of one document.
struct DescriptionText<'a>(&'a [DescriptionBlock]);

impl fmt::Display for DescriptionText<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(out, "#usda 1.0")?;
        writeln!(out, "(")?;
        writeln!(out, "{INDENT}defaultPrim = \"{ROOT_PRIM}\"")?;
        writeln!(out, "{INDENT}metersPerUnit = 1")?;
        writeln!(out, "{INDENT}upAxis = \"Z\"")?;
        writeln!(out, ")\n")?;

        writeln!(out, "def Xform \"{ROOT_PRIM}\"")?;
        writeln!(out, "{{")?;
        for (i, block) in self.0.iter().enumerate() {
            if i > 0 {
                writeln!(out)?;
            }
            write_block(out, block)?;
        }
        writeln!(out, "}}")
    }
}

fn write_block(out: &mut impl Write, block: &DescriptionBlock) -> fmt::Result {
    let pad = INDENT;
    let inner = format!("{INDENT}{INDENT}");
    writeln!(out, "{pad}def Xform \"{}\" (", block.identifier)?;
    writeln!(out, "{inner}prepend apiSchemas = [\"PhysicsRigidBodyAPI\"]")?;
    if let Some(reference) = &block.reference {
        writeln!(out, "{inner}prepend references = @{reference}@")?;
    }
    writeln!(out, "{pad})")?;
    writeln!(out, "{pad}{{")?;

    writeln!(
        out,
        "{inner}bool {ATTR_KINEMATIC} = {}",
        if block.kinematic { "true" } else { "false" }
    )?;
    let t = block.translate;
    writeln!(
        out,
        "{inner}double3 {ATTR_TRANSLATE} = ({}, {}, {})",
        num(t.x),
        num(t.y),
        num(t.z)
    )?;
    let q = block.export_orientation();
    writeln!(
        out,
        "{inner}quatd {ATTR_ORIENT} = ({}, {}, {}, {})",
        num(q.w),
        num(q.x),
        num(q.y),
        num(q.z)
    )?;
    let s = block.scale;
    writeln!(
        out,
        "{inner}double3 {ATTR_SCALE} = ({}, {}, {})",
        num(s.x),
        num(s.y),
        num(s.z)
    )?;
    let order = OP_ORDER
        .iter()
        .map(|op| format!("\"{op}\""))
        .collect::<Vec<_>>()
        .join(", ");
    writeln!(out, "{inner}uniform token[] {ATTR_OP_ORDER} = [{order}]")?;
    writeln!(out, "{pad}}}")
}

/// Shortest decimal text that parses back to exactly `v`.
fn num(v: f64) -> String {
    if v == 0.0 {
        // Collapse -0 so the document does not depend on sign-of-zero noise.
        return "0".to_owned();
    }
    format!("{v}")
}
