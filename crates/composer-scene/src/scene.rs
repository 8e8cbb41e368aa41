//! The scene container.
//!
//! A [`Scene`] holds the ordered object list, the current spawn volume and
//! the free-text task instruction. Object order is significant: placement
//! visits movable objects in this order and export writes blocks in this
//! order.

use glam::DVec3;

use crate::object::SceneObject;
use crate::snapshot::PoseSnapshot;
use crate::transform::Transform;
use crate::volume::SpawnVolume;
use crate::SceneError;

/// Objects, spawn volume and instruction of one editing session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    objects: Vec<SceneObject>,
    spawn_volume: SpawnVolume,
    instruction: String,
}

impl Scene {
    /// An empty scene with the default spawn volume and no instruction.
    pub fn new() -> Self {
        Self::default()
    }

    // -- objects ------------------------------------------------------------

    /// Every object, in scene order.
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append an object. Fails if its id is already in use.
    pub fn add_object(&mut self, object: SceneObject) -> Result<(), SceneError> {
        if self.object(&object.id).is_some() {
            return Err(SceneError::DuplicateObject { id: object.id });
        }
        self.objects.push(object);
        Ok(())
    }

    /// Remove and return the object with the given id.
    pub fn remove_object(&mut self, id: &str) -> Result<SceneObject, SceneError> {
        let index = self
            .objects
            .iter()
            .position(|o| o.id == id)
            .ok_or_else(|| {
                tracing::debug!(id, "remove requested for unknown object");
                SceneError::UnknownObject { id: id.to_owned() }
            })?;
        Ok(self.objects.remove(index))
    }

    /// Replace the whole object list. Ids must be unique; on error the scene
    /// is left untouched.
    pub fn replace_objects(&mut self, objects: Vec<SceneObject>) -> Result<(), SceneError> {
        let mut seen = std::collections::HashSet::new();
        for object in &objects {
            if !seen.insert(object.id.as_str()) {
                return Err(SceneError::DuplicateObject {
                    id: object.id.clone(),
                });
            }
        }
        self.objects = objects;
        Ok(())
    }

    pub fn object(&self, id: &str) -> Option<&SceneObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    pub fn object_mut(&mut self, id: &str) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Set the transform of one object.
    pub fn set_transform(&mut self, id: &str, transform: Transform) -> Result<(), SceneError> {
        let object = self
            .object_mut(id)
            .ok_or_else(|| SceneError::UnknownObject { id: id.to_owned() })?;
        object.transform = transform;
        Ok(())
    }

    /// Objects eligible for randomized placement, in scene order.
    pub fn movable_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_movable())
    }

    /// Ids of the movable objects, in scene order.
    pub fn movable_ids(&self) -> Vec<String> {
        self.movable_objects().map(|o| o.id.clone()).collect()
    }

    /// Objects that may appear in a bundle, in scene order.
    pub fn exportable_objects(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.is_exportable())
    }

    /// Number of exportable objects that are static.
    pub fn static_exportable_count(&self) -> usize {
        self.exportable_objects().filter(|o| o.is_static()).count()
    }

    // -- poses --------------------------------------------------------------

    /// Snapshot the current pose of every movable object.
    pub fn capture_movable_poses(&self) -> PoseSnapshot {
        self.movable_objects()
            .map(|o| (o.id.clone(), o.transform.pose()))
            .collect()
    }

    /// Move objects to the poses recorded in `snapshot`.
    ///
    /// Ids with no matching object are skipped. Returns the ids that were
    /// applied, in scene order.
    pub fn apply_poses(&mut self, snapshot: &PoseSnapshot) -> Vec<String> {
        let mut applied = Vec::new();
        for object in &mut self.objects {
            if let Some(pose) = snapshot.get(&object.id) {
                object.transform.set_pose(*pose);
                applied.push(object.id.clone());
            }
        }
        if applied.len() < snapshot.len() {
            let skipped: Vec<&str> = snapshot
                .ids()
                .filter(|id| !applied.iter().any(|a| a == id))
                .collect();
            tracing::debug!(?skipped, "poses for unknown objects skipped");
        }
        applied
    }

    // -- volume / instruction ---------------------------------------------

    pub fn spawn_volume(&self) -> &SpawnVolume {
        &self.spawn_volume
    }

    /// Replace the spawn volume wholesale.
    pub fn set_spawn_volume(&mut self, volume: SpawnVolume) {
        self.spawn_volume = volume;
    }

    /// Replace the spawn volume from raw bounds.
    pub fn set_spawn_bounds(&mut self, min: DVec3, max: DVec3) -> Result<(), SceneError> {
        self.spawn_volume = SpawnVolume::new(min, max)?;
        Ok(())
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn set_instruction(&mut self, instruction: impl Into<String>) {
        self.instruction = instruction.into();
    }
}
