//! Geometry loading: turning an asset folder into placeable geometry.
//!
//! The composer never renders, so a loader only has to answer three
//! questions about a folder of payload files: which file is the main one,
//! what transform the object starts with, and how big it is.
//!
//! [`MeshBoundsLoader`] handles `.glb`/`.gltf` (via `gltf`, reading the
//! accessor bounds of every position attribute under the default scene's
//! node hierarchy) and `.obj` (via `tobj`).

use std::collections::BTreeMap;
use std::io::BufReader;

use glam::{DMat4, DVec3};

use composer_scene::bounds::Aabb;
use composer_scene::transform::Transform;

/// Main-file extensions in preference order.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["glb", "gltf", "obj"];

/// Errors produced by geometry loaders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    /// The folder has no file with a supported extension.
    #[error("no supported geometry format found in '{folder}'")]
    NoSupportedFormat { folder: String },

    /// A supported file failed to decode.
    #[error("failed to decode '{file}': {details}")]
    Decode { file: String, details: String },
}

/// What a loader reports about one asset folder.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedGeometry {
    /// Main file, relative to the folder.
    pub main_file: String,
    /// Initial live-frame transform.
    pub transform: Transform,
    /// Un-rotated, unscaled bounds in the object's local frame.
    pub local_bounds: Aabb,
}

/// Turns an asset folder into [`LoadedGeometry`].
pub trait GeometryLoader: Send {
    /// Load `folder`. `files` are keyed by path relative to the folder;
    /// `main_file`, when given, names the file to use.
    fn load(
        &self,
        folder: &str,
        files: &BTreeMap<String, Vec<u8>>,
        main_file: Option<&str>,
    ) -> Result<LoadedGeometry, LoadError>;
}

// ---------------------------------------------------------------------------
// MeshBoundsLoader
// ---------------------------------------------------------------------------

/// Reads mesh bounds from glTF and Wavefront OBJ payloads.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshBoundsLoader;

impl MeshBoundsLoader {
    /// Pick the main file: the requested one if it is supported, otherwise
    /// the first file of the most preferred extension.
    fn select<'a>(
        files: &'a BTreeMap<String, Vec<u8>>,
        main_file: Option<&'a str>,
    ) -> Option<(&'a str, &'static str)> {
        let requested = main_file
            .filter(|name| files.contains_key(*name))
            .and_then(|name| Some((name, supported(&extension(name)?)?)));
        if requested.is_some() {
            return requested;
        }
        SUPPORTED_EXTENSIONS.iter().find_map(|wanted| {
            files
                .keys()
                .find(|name| extension(name).as_deref() == Some(*wanted))
                .map(|name| (name.as_str(), *wanted))
        })
    }
}

impl GeometryLoader for MeshBoundsLoader {
    fn load(
        &self,
        folder: &str,
        files: &BTreeMap<String, Vec<u8>>,
        main_file: Option<&str>,
    ) -> Result<LoadedGeometry, LoadError> {
        let (name, ext) =
            Self::select(files, main_file).ok_or_else(|| LoadError::NoSupportedFormat {
                folder: folder.to_owned(),
            })?;
        let bytes = &files[name];
        let bounds = match ext {
            "obj" => obj_bounds(bytes),
            _ => gltf_bounds(bytes),
        }
        .map_err(|details| LoadError::Decode {
            file: format!("{folder}/{name}"),
            details,
        })?;

        tracing::debug!(folder, main_file = name, size = ?bounds.size(), "geometry loaded");
        Ok(LoadedGeometry {
            main_file: name.to_owned(),
            transform: Transform::IDENTITY,
            local_bounds: bounds,
        })
    }
}

fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(ext.to_ascii_lowercase())
}

fn supported(ext: &str) -> Option<&'static str> {
    SUPPORTED_EXTENSIONS.iter().copied().find(|e| *e == ext)
}

fn obj_bounds(bytes: &[u8]) -> Result<Aabb, String> {
    let mut reader = BufReader::new(bytes);
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions::default(),
        // Material libraries are not part of the bounds.
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| e.to_string())?;

    let points = models.iter().flat_map(|m| {
        m.mesh
            .positions
            .chunks_exact(3)
            .map(|p| DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2])))
    });
    Aabb::from_points(points).ok_or_else(|| "mesh has no vertices".to_owned())
}

fn gltf_bounds(bytes: &[u8]) -> Result<Aabb, String> {
    let gltf = gltf::Gltf::from_slice(bytes).map_err(|e| e.to_string())?;
    let document = &gltf.document;

    let mut bounds: Option<Aabb> = None;
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                visit_node(&node, DMat4::IDENTITY, &mut bounds);
            }
        }
        None => {
            for mesh in document.meshes() {
                accumulate_mesh(&mesh, DMat4::IDENTITY, &mut bounds);
            }
        }
    }
    bounds.ok_or_else(|| "document has no bounded mesh primitives".to_owned())
}

fn visit_node(node: &gltf::Node, parent: DMat4, bounds: &mut Option<Aabb>) {
    let local = node.transform().matrix().map(|col| col.map(f64::from));
    let world = parent * DMat4::from_cols_array_2d(&local);
    if let Some(mesh) = node.mesh() {
        accumulate_mesh(&mesh, world, bounds);
    }
    for child in node.children() {
        visit_node(&child, world, bounds);
    }
}

fn accumulate_mesh(mesh: &gltf::Mesh, world: DMat4, bounds: &mut Option<Aabb>) {
    for primitive in mesh.primitives() {
        let Some(positions) = primitive.get(&gltf::Semantic::Positions) else {
            continue;
        };
        if positions.min().is_none() || positions.max().is_none() {
            continue;
        }
        let bb = primitive.bounding_box();
        let local = Aabb::new(
            DVec3::from_array(bb.min.map(f64::from)),
            DVec3::from_array(bb.max.map(f64::from)),
        );
        let corners = local.corners().map(|c| world.transform_point3(c));
        if let Some(primitive_bounds) = Aabb::from_points(corners) {
            *bounds = Some(match bounds {
                Some(acc) => acc.union(&primitive_bounds),
                None => primitive_bounds,
            });
        }
    }
}
