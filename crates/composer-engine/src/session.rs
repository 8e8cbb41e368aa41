//! The composer session: one exclusively-owned scene plus everything that
//! operates on it.
//!
//! A [`ComposerSession`] threads the scene, the condition history, the
//! placement RNG, the geometry loader and the single observer through every
//! operation. There is no global state; callers own the session and pass it
//! where it is needed.
//!
//! Accepting a condition and drawing the next placement are two explicit
//! calls. [`accept_condition`](ComposerSession::accept_condition) returns only
//! after the snapshot is committed, so a following
//! [`draw_new_placement`](ComposerSession::draw_new_placement) can never
//! observe a half-written history.
//!
//! # Example
//!
//! ```
//! use composer_engine::prelude::*;
//! use glam::DVec3;
//!
//! let mut config = ComposerConfig::default();
//! config.placement.seed = Some(42);
//! let mut session = ComposerSession::new(config).unwrap();
//!
//! let mut table = SceneObject::new("t1", "Table", AssetRef::new("Table", "table.obj"));
//! table.disable_gravity = true;
//! session.add_object(table).unwrap();
//! session.add_object(SceneObject::new("c1", "Cup", AssetRef::new("Cup", "cup.obj"))).unwrap();
//! session.set_instruction("put the cup on the table");
//!
//! session.draw_new_placement();
//! session.accept_and_redraw();
//! session.accept_and_redraw();
//! assert_eq!(session.history().len(), 2);
//!
//! let bundle = session.export_bundle().unwrap();
//! assert!(bundle.contains("initial_conditions.json"));
//! ```

use rand::SeedableRng;
use rand_pcg::Pcg64;

use composer_bundle::codec::{self, ParsedBundle};
use composer_bundle::files::BundleFiles;
use composer_bundle::transport::ArchiveTransport;
use composer_scene::bounds::Aabb;
use composer_scene::object::{AssetRef, SceneObject};
use composer_scene::scene::Scene;
use composer_scene::transform::Transform;
use composer_scene::volume::SpawnVolume;

use crate::config::ComposerConfig;
use crate::history::ConditionHistory;
use crate::loader::{GeometryLoader, LoadedGeometry, MeshBoundsLoader};
use crate::observer::SceneObserver;
use crate::placement::{PlacedObject, PlacementEngine, SavedPoses};
use crate::ComposerError;

/// Summary of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportReport {
    pub source: codec::ImportSource,
    pub objects: usize,
    pub conditions: usize,
}

/// An editing session over one scene.
pub struct ComposerSession {
    scene: Scene,
    history: ConditionHistory,
    saved: Option<SavedPoses>,
    engine: PlacementEngine,
    rng: Pcg64,
    config: ComposerConfig,
    loader: Box<dyn GeometryLoader>,
    observer: Option<Box<dyn SceneObserver>>,
}

impl std::fmt::Debug for ComposerSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComposerSession")
            .field("objects", &self.scene.len())
            .field("conditions", &self.history.len())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ComposerSession {
    /// A session over an empty scene, using [`MeshBoundsLoader`].
    pub fn new(config: ComposerConfig) -> Result<Self, ComposerError> {
        Self::with_scene(Scene::new(), config)
    }

    /// A session over an existing scene.
    pub fn with_scene(scene: Scene, config: ComposerConfig) -> Result<Self, ComposerError> {
        config.validate()?;
        let rng = match config.placement.seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_entropy(),
        };
        Ok(Self {
            scene,
            history: ConditionHistory::new(),
            saved: None,
            engine: PlacementEngine::new(config.placement.max_attempts),
            rng,
            config,
            loader: Box::new(MeshBoundsLoader),
            observer: None,
        })
    }

    /// Replace the geometry loader used by imports.
    pub fn set_loader(&mut self, loader: impl GeometryLoader + 'static) {
        self.loader = Box::new(loader);
    }

    /// Register the single observer, replacing any previous one.
    pub fn set_observer(&mut self, observer: impl SceneObserver + 'static) {
        self.observer = Some(Box::new(observer));
    }

    pub fn clear_observer(&mut self) {
        self.observer = None;
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Scene editing
    // -----------------------------------------------------------------------

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn add_object(&mut self, object: SceneObject) -> Result<(), ComposerError> {
        Ok(self.scene.add_object(object)?)
    }

    pub fn remove_object(&mut self, id: &str) -> Result<SceneObject, ComposerError> {
        Ok(self.scene.remove_object(id)?)
    }

    /// Set one object's live-frame transform.
    pub fn set_transform(&mut self, id: &str, transform: Transform) -> Result<(), ComposerError> {
        self.scene.set_transform(id, transform)?;
        self.notify_transform(id, &transform);
        Ok(())
    }

    /// Update an object's flags. Each `None` leaves that flag unchanged.
    pub fn set_flags(
        &mut self,
        id: &str,
        locked: Option<bool>,
        exclude_from_export: Option<bool>,
        disable_gravity: Option<bool>,
    ) -> Result<(), ComposerError> {
        let object = self
            .scene
            .object_mut(id)
            .ok_or_else(|| composer_scene::SceneError::UnknownObject { id: id.to_owned() })?;
        if let Some(v) = locked {
            object.locked = v;
        }
        if let Some(v) = exclude_from_export {
            object.exclude_from_export = v;
        }
        if let Some(v) = disable_gravity {
            object.disable_gravity = v;
        }
        Ok(())
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.scene.set_instruction(instruction);
    }

    /// Replace the spawn volume wholesale.
    pub fn set_spawn_volume(&mut self, volume: SpawnVolume) {
        self.scene.set_spawn_volume(volume);
    }

    // -----------------------------------------------------------------------
    // Placement and conditions
    // -----------------------------------------------------------------------

    /// Run one placement pass over the movable objects.
    ///
    /// The poses from before the pass are kept for
    /// [`restore_saved_poses`](Self::restore_saved_poses).
    pub fn draw_new_placement(&mut self) -> Vec<PlacedObject> {
        let pass = self.engine.randomize(&mut self.scene, &mut self.rng);
        self.saved = Some(pass.saved);
        for placed in &pass.placed {
            self.notify_transform(&placed.id, &placed.transform);
        }
        pass.placed
    }

    /// Poses captured before the most recent placement pass.
    pub fn saved_poses(&self) -> Option<&SavedPoses> {
        self.saved.as_ref()
    }

    /// Put back the poses from before the most recent placement pass.
    /// Returns the number of objects restored.
    pub fn restore_saved_poses(&mut self) -> Result<usize, ComposerError> {
        let saved = self.saved.as_ref().ok_or(ComposerError::NothingSaved)?;
        let missing = saved.restore(&mut self.scene);
        if !missing.is_empty() {
            tracing::debug!(?missing, "saved poses refer to removed objects");
        }
        let restored: Vec<(String, Transform)> = saved
            .snapshot()
            .ids()
            .filter_map(|id| self.scene.object(id).map(|o| (id.to_owned(), o.transform)))
            .collect();
        for (id, transform) in &restored {
            self.notify_transform(id, transform);
        }
        Ok(restored.len())
    }

    /// Snapshot every movable object's pose into a new condition and return
    /// its episode index. The history is updated before this returns.
    pub fn accept_condition(&mut self) -> usize {
        let snapshot = self.scene.capture_movable_poses();
        let index = self.history.push(snapshot);
        if let Some(observer) = self.observer.as_mut() {
            observer.history_changed(self.history.len());
        }
        index
    }

    /// Accept the current poses, then draw a new placement.
    pub fn accept_and_redraw(&mut self) -> (usize, Vec<PlacedObject>) {
        let index = self.accept_condition();
        let placed = self.draw_new_placement();
        (index, placed)
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
        if let Some(observer) = self.observer.as_mut() {
            observer.history_changed(0);
        }
    }

    pub fn history(&self) -> &ConditionHistory {
        &self.history
    }

    // -----------------------------------------------------------------------
    // Export / import
    // -----------------------------------------------------------------------

    /// Serialize the scene and accepted conditions into bundle streams.
    pub fn export_bundle(&self) -> Result<BundleFiles, ComposerError> {
        let files = codec::export_bundle(
            &self.scene,
            self.history.as_slice(),
            &self.config.export.options(),
        )?;
        Ok(files)
    }

    /// Export and hand the bundle to `transport`.
    pub async fn export_to(&self, transport: &dyn ArchiveTransport) -> Result<BundleFiles, ComposerError> {
        let files = self.export_bundle()?;
        transport.pack(&files).await?;
        tracing::info!(transport = transport.name(), "bundle exported");
        Ok(files)
    }

    /// Replace the scene with the contents of `files`.
    ///
    /// Every object is parsed and loaded before anything changes, so a
    /// failure leaves the session exactly as it was.
    pub fn import_bundle(&mut self, files: &BundleFiles) -> Result<ImportReport, ComposerError> {
        let parsed = codec::parse_bundle(files)?;
        let ParsedBundle {
            source,
            objects: parsed_objects,
            instruction,
            conditions,
        } = parsed;

        let mut objects = Vec::with_capacity(parsed_objects.len());
        for parsed in parsed_objects {
            // Manifest entries may carry no payload; they keep their recorded
            // main file and unit bounds.
            let loaded = match (&parsed.main_file, parsed.files.is_empty()) {
                (Some(main_file), true) => LoadedGeometry {
                    main_file: main_file.clone(),
                    transform: Transform::IDENTITY,
                    local_bounds: Aabb::unit(),
                },
                _ => self
                    .loader
                    .load(&parsed.folder, &parsed.files, parsed.main_file.as_deref())?,
            };
            let mut asset = AssetRef::new(parsed.folder, loaded.main_file).with_bounds(loaded.local_bounds);
            asset.files = parsed.files;
            let mut object = SceneObject::new(parsed.id, parsed.name, asset);
            object.transform = parsed.transform.unwrap_or(loaded.transform);
            object.disable_gravity = parsed.disable_gravity;
            objects.push(object);
        }

        let mut scene = Scene::new();
        scene.replace_objects(objects)?;
        scene.set_spawn_volume(*self.scene.spawn_volume());
        scene.set_instruction(instruction);

        let report = ImportReport {
            source,
            objects: scene.len(),
            conditions: conditions.len(),
        };
        self.scene = scene;
        self.history = conditions.into_iter().collect();
        self.saved = None;
        if let Some(observer) = self.observer.as_mut() {
            observer.scene_replaced(&self.scene);
            observer.history_changed(self.history.len());
        }
        tracing::info!(
            source = ?report.source,
            objects = report.objects,
            conditions = report.conditions,
            "bundle imported"
        );
        Ok(report)
    }

    /// Unpack from `transport`, then [`import_bundle`](Self::import_bundle).
    pub async fn import_from(&mut self, transport: &dyn ArchiveTransport) -> Result<ImportReport, ComposerError> {
        let files = transport.unpack().await?;
        self.import_bundle(&files)
    }

    fn notify_transform(&mut self, id: &str, transform: &Transform) {
        if let Some(observer) = self.observer.as_mut() {
            observer.transform_changed(id, transform);
        }
    }
}
