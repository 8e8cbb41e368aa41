//! Bundle codec: scene to named byte streams and back.
//!
//! # Export
//!
//! [`export_bundle`] validates the scene, assigns one identifier per
//! exportable object (see [`naming`](crate::naming)) and emits:
//!
//! - `scene.usda` -- export-frame description document,
//! - `scene.json` -- live-frame manifest,
//! - `initial_conditions.json` -- instruction plus one entry per accepted
//!   condition (or the current dynamic poses when none were accepted),
//! - `assets/<identifier>/...` -- each object's payload files.
//!
//! Objects flagged `exclude_from_export` appear in none of these.
//!
//! # Import
//!
//! [`parse_bundle`] prefers the manifest. Without one it falls back to the
//! description document, matching blocks to discovered asset folders by
//! sanitized identifier. A manifest that is present but unparsable is an
//! error, never a fallback.

use std::collections::{BTreeMap, HashMap};

use composer_scene::frame;
use composer_scene::scene::Scene;
use composer_scene::snapshot::PoseSnapshot;
use composer_scene::transform::Transform;

use crate::files::{asset_path, split_asset_path, BundleFiles};
use crate::manifest::{Manifest, ManifestAsset};
use crate::naming::{sanitize_name, IdentifierTable};
use crate::poses::{pose_from_array, pose_to_array, ConditionEntry, PoseDocument};
use crate::usda::writer::write_description;
use crate::usda::{Description, DescriptionBlock};
use crate::{BundleError, DESCRIPTION_FILE, MANIFEST_FILE, POSES_FILE};

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Options controlling how documents are written.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Pretty-print the JSON documents.
    pub pretty_json: bool,
}

/// Serialize `scene` and its accepted `conditions` into a bundle.
///
/// Fails without producing anything when the instruction is blank or no
/// exportable object is static.
pub fn export_bundle(
    scene: &Scene,
    conditions: &[PoseSnapshot],
    options: &ExportOptions,
) -> Result<BundleFiles, BundleError> {
    if scene.instruction().trim().is_empty() {
        return Err(BundleError::MissingInstruction);
    }
    if scene.static_exportable_count() == 0 {
        return Err(BundleError::NoStaticObject);
    }

    let mut table = IdentifierTable::new();
    let exported: Vec<(String, &composer_scene::object::SceneObject)> = scene
        .exportable_objects()
        .map(|o| (table.assign(&o.name), o))
        .collect();
    let identifier_of: HashMap<&str, &str> = exported
        .iter()
        .map(|(ident, o)| (o.id.as_str(), ident.as_str()))
        .collect();

    let mut files = BundleFiles::new();
    let mut blocks = Vec::with_capacity(exported.len());
    let mut assets = Vec::with_capacity(exported.len());

    for (identifier, object) in &exported {
        let main_path = asset_path(identifier, &object.asset.main_file);
        let export = frame::transform_to_export(&object.transform);

        blocks.push(DescriptionBlock {
            identifier: identifier.clone(),
            reference: Some(format!("./{main_path}")),
            translate: export.position,
            orientation: Some(export.orientation),
            rotate_xyz: None,
            scale: export.scale,
            kinematic: object.is_static(),
        });

        let mut asset = ManifestAsset {
            id: object.id.clone(),
            name: object.name.clone(),
            main_file: main_path,
            position: glam::DVec3::ZERO.into(),
            rotation: glam::DVec3::ZERO.into(),
            scale: glam::DVec3::ONE.into(),
            disable_gravity: object.disable_gravity,
        };
        asset.set_transform(&object.transform);
        assets.push(asset);

        for (relative, bytes) in &object.asset.files {
            files.insert(asset_path(identifier, relative), bytes.clone());
        }
    }

    let poses: Vec<ConditionEntry> = if conditions.is_empty() {
        // Nothing accepted yet: the live dynamic poses become the only entry.
        let current = scene.capture_movable_poses();
        vec![condition_entry(&current, &identifier_of)]
    } else {
        conditions
            .iter()
            .map(|snapshot| condition_entry(snapshot, &identifier_of))
            .collect()
    };
    let pose_doc = PoseDocument {
        instruction: scene.instruction().to_owned(),
        poses,
    };

    files.insert(DESCRIPTION_FILE, write_description(&blocks).into_bytes());
    files.insert(MANIFEST_FILE, Manifest::new(assets).to_vec(options.pretty_json)?);
    files.insert(POSES_FILE, pose_doc.to_vec(options.pretty_json)?);

    tracing::info!(
        objects = exported.len(),
        conditions = pose_doc.poses.len(),
        streams = files.len(),
        "scene bundle exported"
    );
    Ok(files)
}

/// Export-frame entry for one snapshot, keeping only exported objects.
fn condition_entry(snapshot: &PoseSnapshot, identifier_of: &HashMap<&str, &str>) -> ConditionEntry {
    snapshot
        .iter()
        .filter_map(|(id, pose)| {
            let identifier = identifier_of.get(id)?;
            Some((
                (*identifier).to_owned(),
                pose_to_array(&frame::pose_to_export(pose)),
            ))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Which document the object list was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSource {
    Manifest,
    Description,
    /// Neither document was present; objects come from asset folders alone.
    AssetsOnly,
}

/// One object recovered from a bundle, before geometry is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedObject {
    pub id: String,
    pub name: String,
    /// Asset folder under `assets/`.
    pub folder: String,
    /// Main file relative to the folder, when the bundle names one.
    pub main_file: Option<String>,
    /// Payload files relative to the folder.
    pub files: BTreeMap<String, Vec<u8>>,
    /// Live-frame transform, or `None` to keep whatever the loader reports.
    pub transform: Option<Transform>,
    pub disable_gravity: bool,
}

/// Everything recovered from a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBundle {
    pub source: ImportSource,
    pub objects: Vec<ParsedObject>,
    pub instruction: String,
    /// Accepted conditions in document order, keyed by object id, live frame.
    pub conditions: Vec<PoseSnapshot>,
}

/// Recover objects, instruction and conditions from bundle streams.
pub fn parse_bundle(files: &BundleFiles) -> Result<ParsedBundle, BundleError> {
    let folders = files.asset_folders();

    let (source, objects) = if let Some(bytes) = files.get(MANIFEST_FILE) {
        let manifest = Manifest::from_slice(bytes)?;
        (ImportSource::Manifest, objects_from_manifest(&manifest, &folders))
    } else if let Some(bytes) = files.get(DESCRIPTION_FILE) {
        tracing::info!("bundle has no manifest, reading the description document");
        let text = std::str::from_utf8(bytes).map_err(|e| BundleError::MalformedDescription {
            line: 1,
            column: 1,
            details: format!("not UTF-8: {e}"),
        })?;
        let description = Description::parse(text)?;
        (
            ImportSource::Description,
            objects_from_description(&description, folders),
        )
    } else {
        tracing::warn!("bundle has neither manifest nor description, using asset folders only");
        let objects = folders
            .into_iter()
            .map(|(folder, files)| bare_object(folder, files, None, false))
            .collect();
        (ImportSource::AssetsOnly, objects)
    };

    let (instruction, conditions) = match files.get(POSES_FILE) {
        Some(bytes) => {
            let doc = PoseDocument::from_slice(bytes)?;
            let conditions = conditions_from_document(&doc, &objects);
            (doc.instruction, conditions)
        }
        None => (String::new(), Vec::new()),
    };

    tracing::info!(
        source = ?source,
        objects = objects.len(),
        conditions = conditions.len(),
        "scene bundle parsed"
    );
    Ok(ParsedBundle {
        source,
        objects,
        instruction,
        conditions,
    })
}

fn objects_from_manifest(
    manifest: &Manifest,
    folders: &BTreeMap<String, BTreeMap<String, Vec<u8>>>,
) -> Vec<ParsedObject> {
    let mut objects = Vec::with_capacity(manifest.assets.len());
    for asset in &manifest.assets {
        let normalized = asset.main_file.trim_start_matches("./");
        let Some((folder, main_file)) = split_asset_path(normalized) else {
            tracing::warn!(id = %asset.id, main_file = %asset.main_file, "manifest entry has no asset folder, skipped");
            continue;
        };
        let files = match folders.get(folder) {
            Some(payload) => payload.clone(),
            None => {
                tracing::debug!(id = %asset.id, folder, "manifest entry has no payload files");
                BTreeMap::new()
            }
        };
        objects.push(ParsedObject {
            id: asset.id.clone(),
            name: asset.name.clone(),
            folder: folder.to_owned(),
            main_file: Some(main_file.to_owned()),
            files,
            transform: Some(asset.transform()),
            disable_gravity: asset.disable_gravity,
        });
    }
    objects
}

fn objects_from_description(
    description: &Description,
    folders: BTreeMap<String, BTreeMap<String, Vec<u8>>>,
) -> Vec<ParsedObject> {
    let mut objects = Vec::with_capacity(folders.len());
    for (folder, files) in folders {
        let identifier = sanitize_name(&folder);
        match description.block(&identifier) {
            Some(block) => {
                let main_file = block
                    .reference
                    .as_deref()
                    .map(|r| r.trim_start_matches("./"))
                    .and_then(split_asset_path)
                    .filter(|(f, _)| *f == folder)
                    .map(|(_, main)| main.to_owned());
                let mut object = bare_object(folder, files, main_file, block.kinematic);
                object.transform = Some(block.live_transform());
                objects.push(object);
            }
            None => {
                tracing::debug!(folder = %folder, "no description block for asset folder");
                objects.push(bare_object(folder, files, None, false));
            }
        }
    }

    for block in &description.blocks {
        if !objects.iter().any(|o| sanitize_name(&o.folder) == block.identifier) {
            tracing::debug!(identifier = %block.identifier, "description block has no asset folder, ignored");
        }
    }
    objects
}

fn bare_object(
    folder: String,
    files: BTreeMap<String, Vec<u8>>,
    main_file: Option<String>,
    disable_gravity: bool,
) -> ParsedObject {
    ParsedObject {
        id: folder.clone(),
        name: folder.clone(),
        folder,
        main_file,
        files,
        transform: None,
        disable_gravity,
    }
}

/// Map document entries onto recovered objects. Names with no matching
/// object are dropped; object sets may differ between sessions.
fn conditions_from_document(doc: &PoseDocument, objects: &[ParsedObject]) -> Vec<PoseSnapshot> {
    let id_of: HashMap<String, &str> = objects
        .iter()
        .flat_map(|o| {
            [
                (sanitize_name(&o.folder), o.id.as_str()),
                (sanitize_name(&o.name), o.id.as_str()),
            ]
        })
        .rev()
        .collect();

    doc.poses
        .iter()
        .map(|entry| {
            entry
                .iter()
                .filter_map(|(name, array)| match id_of.get(name) {
                    Some(id) => Some((
                        (*id).to_owned(),
                        frame::pose_from_export(&pose_from_array(array)),
                    )),
                    None => {
                        tracing::debug!(name = %name, "pose entry names no known object, dropped");
                        None
                    }
                })
                .collect()
        })
        .collect()
}
