//! Change notifications for a single registered listener.
//!
//! A session holds at most one [`SceneObserver`]. Every hook runs
//! synchronously, inside the session call that made the change, after the
//! change is committed.

use std::sync::{Arc, Mutex, PoisonError};

use composer_scene::scene::Scene;
use composer_scene::transform::Transform;

/// Receives session change notifications. All hooks default to no-ops.
pub trait SceneObserver: Send {
    /// An object's transform changed (edit, placement or restore).
    fn transform_changed(&mut self, _id: &str, _transform: &Transform) {}

    /// The condition history now holds `len` entries.
    fn history_changed(&mut self, _len: usize) {}

    /// The whole object list was replaced by an import.
    fn scene_replaced(&mut self, _scene: &Scene) {}
}

/// Observer that records every notification, for tests and tooling.
///
/// Clones share one event log, so a caller can keep a handle after handing
/// the observer to a session.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<SceneEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every event recorded so far, oldest first.
    pub fn events(&self) -> Vec<SceneEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: SceneEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

/// One recorded notification.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    TransformChanged { id: String, transform: Transform },
    HistoryChanged { len: usize },
    SceneReplaced { objects: usize },
}

impl SceneObserver for RecordingObserver {
    fn transform_changed(&mut self, id: &str, transform: &Transform) {
        self.record(SceneEvent::TransformChanged {
            id: id.to_owned(),
            transform: *transform,
        });
    }

    fn history_changed(&mut self, len: usize) {
        self.record(SceneEvent::HistoryChanged { len });
    }

    fn scene_replaced(&mut self, scene: &Scene) {
        self.record(SceneEvent::SceneReplaced {
            objects: scene.len(),
        });
    }
}
