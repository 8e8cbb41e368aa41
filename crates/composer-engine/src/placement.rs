//! Randomized, collision-aware placement of movable objects.
//!
//! A placement pass visits every movable object in scene order. Each object
//! gets a fresh transform: a random position inside the spawn volume and a
//! random yaw about the vertical axis, with tilt cleared. Earlier objects
//! claim space first.
//!
//! All geometry here is in the export (Z-up) frame, the frame the spawn
//! volume is expressed in. Only the final transform is converted back to the
//! live frame.
//!
//! Per object:
//!
//! 1. The footprint is the object's local bounds times its scale, at neutral
//!    orientation, mapped into the export frame.
//! 2. The volume is shrunk by the footprint half extents. If that inverts an
//!    axis the object cannot fit, and the volume centre is the only candidate.
//! 3. Up to `max_attempts` candidates are drawn. A candidate is accepted when
//!    its box overlaps no box accepted earlier in the pass and, if the object
//!    fits, lies inside the unshrunk volume. When the budget runs out the
//!    last candidate is accepted anyway.
//!
//! # Example
//!
//! ```
//! use composer_engine::placement::PlacementEngine;
//! use composer_scene::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut scene = Scene::new();
//! scene.add_object(SceneObject::new("a", "A", AssetRef::new("A", "a.obj").with_bounds(Aabb::unit().scaled(glam::DVec3::splat(0.1))))).unwrap();
//! let engine = PlacementEngine::new(100);
//! let mut rng = rand_pcg::Pcg64::seed_from_u64(1);
//! let pass = engine.randomize(&mut scene, &mut rng);
//! assert_eq!(pass.placed.len(), 1);
//! assert!(pass.placed[0].collision_free);
//! ```

use std::f64::consts::TAU;

use glam::{DQuat, DVec3};
use rand::Rng;

use composer_scene::bounds::Aabb;
use composer_scene::frame;
use composer_scene::object::SceneObject;
use composer_scene::scene::Scene;
use composer_scene::snapshot::PoseSnapshot;
use composer_scene::transform::Transform;
use composer_scene::volume::SpawnVolume;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of placing one object.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedObject {
    pub id: String,
    /// New live-frame transform.
    pub transform: Transform,
    /// Accepted world box, export frame.
    pub world_bounds: Aabb,
    /// False when the footprint is larger than the volume on some axis.
    pub fits: bool,
    /// Candidates drawn, including the accepted one.
    pub attempts: u32,
    /// False when the retry budget ran out and the last candidate was kept.
    pub collision_free: bool,
}

/// Poses of every movable object captured before a pass.
///
/// Restoring is the caller's decision; the engine never reverts on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedPoses(PoseSnapshot);

impl SavedPoses {
    pub fn capture(scene: &Scene) -> Self {
        Self(scene.capture_movable_poses())
    }

    pub fn snapshot(&self) -> &PoseSnapshot {
        &self.0
    }

    /// Put the captured poses back. Returns ids no longer in the scene.
    pub fn restore(&self, scene: &mut Scene) -> Vec<String> {
        let applied = scene.apply_poses(&self.0);
        self.0
            .ids()
            .filter(|id| !applied.iter().any(|a| a == id))
            .map(str::to_owned)
            .collect()
    }
}

/// Result of [`PlacementEngine::randomize`].
#[derive(Debug, Clone)]
pub struct PlacementPass {
    /// Poses before the pass.
    pub saved: SavedPoses,
    /// One entry per movable object, in scene order.
    pub placed: Vec<PlacedObject>,
}

// ---------------------------------------------------------------------------
// PlacementEngine
// ---------------------------------------------------------------------------

/// Draws collision-free random transforms inside a spawn volume.
#[derive(Debug, Clone)]
pub struct PlacementEngine {
    max_attempts: u32,
}

impl PlacementEngine {
    /// An engine trying up to `max_attempts` candidates per object (at least 1).
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Capture current poses, then place every movable object of `scene`.
    pub fn randomize<R: Rng + ?Sized>(&self, scene: &mut Scene, rng: &mut R) -> PlacementPass {
        let saved = SavedPoses::capture(scene);
        let volume = *scene.spawn_volume();
        let movable: Vec<&SceneObject> = scene.movable_objects().collect();
        let placed = self.plan(&movable, &volume, rng);

        for p in &placed {
            if let Some(object) = scene.object_mut(&p.id) {
                object.transform = p.transform;
            }
        }

        let stuck = placed.iter().filter(|p| !p.collision_free).count();
        if stuck > 0 {
            tracing::warn!(
                objects = placed.len(),
                stuck,
                "placement budget exhausted for some objects, kept last attempt"
            );
        } else {
            tracing::debug!(objects = placed.len(), "placement pass complete");
        }
        PlacementPass { saved, placed }
    }

    /// Compute new transforms for `objects` without touching the scene.
    pub fn plan<R: Rng + ?Sized>(
        &self,
        objects: &[&SceneObject],
        volume: &SpawnVolume,
        rng: &mut R,
    ) -> Vec<PlacedObject> {
        let mut accepted: Vec<Aabb> = Vec::with_capacity(objects.len());
        let mut placed = Vec::with_capacity(objects.len());
        for object in objects {
            let result = self.place_one(object, volume, &accepted, rng);
            accepted.push(result.world_bounds);
            placed.push(result);
        }
        placed
    }

    fn place_one<R: Rng + ?Sized>(
        &self,
        object: &SceneObject,
        volume: &SpawnVolume,
        accepted: &[Aabb],
        rng: &mut R,
    ) -> PlacedObject {
        let footprint = Footprint::of(object);
        let range = volume.shrunk(footprint.half_extents);
        let fits = range.is_some();
        if !fits {
            tracing::debug!(id = %object.id, "object larger than spawn volume, using centre");
        }
        let bounds = volume.as_aabb();

        let mut attempts = 0;
        let candidate = loop {
            attempts += 1;
            let center = match &range {
                Some(r) => DVec3::new(
                    sample_axis(rng, r.min.x, r.max.x),
                    sample_axis(rng, r.min.y, r.max.y),
                    sample_axis(rng, r.min.z, r.max.z),
                ),
                None => volume.center(),
            };
            let yaw = rng.gen_range(0.0..TAU);
            let candidate = footprint.at(center, yaw);

            let clear = !accepted.iter().any(|b| b.intersects(&candidate.world_bounds));
            let inside = !fits || bounds.contains(&candidate.world_bounds);
            if clear && inside {
                break Candidate {
                    collision_free: true,
                    ..candidate
                };
            }
            if attempts >= self.max_attempts {
                break candidate;
            }
        };

        PlacedObject {
            id: object.id.clone(),
            transform: Transform {
                position: frame::position_from_export(candidate.position),
                orientation: frame::orientation_from_export(candidate.orientation),
                scale: object.transform.scale,
            },
            world_bounds: candidate.world_bounds,
            fits,
            attempts,
            collision_free: candidate.collision_free,
        }
    }
}

impl Default for PlacementEngine {
    fn default() -> Self {
        Self::new(100)
    }
}

/// Uniform draw from `[lo, hi]`. Collapses to `lo` for an empty or NaN
/// range, and interpolates when `hi - lo` overflows.
fn sample_axis<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if lo.is_nan() || hi.is_nan() || hi <= lo {
        return lo;
    }
    if (hi - lo).is_finite() {
        rng.gen_range(lo..=hi)
    } else if lo.is_finite() && hi.is_finite() {
        let t: f64 = rng.gen();
        lo * (1.0 - t) + hi * t
    } else {
        0.0f64.clamp(lo, hi)
    }
}

// ---------------------------------------------------------------------------
// Footprint
// ---------------------------------------------------------------------------

/// Un-rotated export-frame extent of an object.
#[derive(Debug, Clone, Copy)]
struct Footprint {
    /// Offset from the object origin to its box centre.
    offset: DVec3,
    half_extents: DVec3,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// Object origin, export frame.
    position: DVec3,
    orientation: DQuat,
    world_bounds: Aabb,
    collision_free: bool,
}

impl Footprint {
    fn of(object: &SceneObject) -> Self {
        let local = object.scaled_local_bounds();
        Self {
            offset: frame::position_to_export(local.center()),
            half_extents: frame::scale_to_export(local.half_extents()),
        }
    }

    /// Candidate whose world box is centred at `center`, turned by `yaw`
    /// about the vertical axis.
    fn at(&self, center: DVec3, yaw: f64) -> Candidate {
        let orientation = DQuat::from_rotation_z(yaw);
        let (sin, cos) = yaw.sin_cos();
        let (sin, cos) = (sin.abs(), cos.abs());
        let h = self.half_extents;
        let rotated = DVec3::new(cos * h.x + sin * h.y, sin * h.x + cos * h.y, h.z);
        Candidate {
            position: center - orientation * self.offset,
            orientation,
            world_bounds: Aabb::from_center_half_extents(center, rotated),
            collision_free: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use composer_scene::object::AssetRef;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn cube(id: &str, edge: f64) -> SceneObject {
        SceneObject::new(
            id,
            id,
            AssetRef::new(id, "m.obj").with_bounds(Aabb::unit().scaled(DVec3::splat(edge))),
        )
    }

    /// Live-frame world bounds mapped to export, for cross-checking.
    fn export_bounds(object: &SceneObject) -> Aabb {
        let live = object.world_bounds();
        Aabb::new(
            frame::position_to_export(live.min),
            frame::position_to_export(live.max),
        )
    }

    #[test]
    fn reported_bounds_match_the_applied_transform() {
        let mut scene = Scene::new();
        let mut object = SceneObject::new(
            "off",
            "off",
            AssetRef::new("off", "m.obj").with_bounds(Aabb::new(
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(0.2, 0.1, 0.05),
            )),
        );
        object.transform.scale = DVec3::new(1.0, 2.0, 0.5);
        scene.add_object(object).unwrap();

        let mut rng = Pcg64::seed_from_u64(3);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        let placed = &pass.placed[0];
        let actual = export_bounds(scene.object("off").unwrap());
        assert!(placed.world_bounds.min.abs_diff_eq(actual.min, 1e-9));
        assert!(placed.world_bounds.max.abs_diff_eq(actual.max, 1e-9));
        assert!(scene.spawn_volume().as_aabb().contains(&actual));
    }

    #[test]
    fn static_and_locked_objects_are_not_moved() {
        let mut scene = Scene::new();
        let mut table = cube("table", 0.5);
        table.disable_gravity = true;
        table.transform.position = DVec3::new(5.0, 0.0, 5.0);
        let mut lamp = cube("lamp", 0.1);
        lamp.locked = true;
        lamp.transform.position = DVec3::new(-5.0, 0.0, 0.0);
        scene.add_object(table).unwrap();
        scene.add_object(lamp).unwrap();
        scene.add_object(cube("cup", 0.1)).unwrap();

        let mut rng = Pcg64::seed_from_u64(9);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        assert_eq!(pass.placed.len(), 1);
        assert_eq!(pass.placed[0].id, "cup");
        assert_eq!(scene.object("table").unwrap().transform.position, DVec3::new(5.0, 0.0, 5.0));
        assert_eq!(scene.object("lamp").unwrap().transform.position, DVec3::new(-5.0, 0.0, 0.0));
    }

    #[test]
    fn saved_poses_restore_the_pre_pass_state() {
        let mut scene = Scene::new();
        let mut cup = cube("cup", 0.1);
        cup.transform.position = DVec3::new(3.0, 2.0, 1.0);
        scene.add_object(cup).unwrap();

        let mut rng = Pcg64::seed_from_u64(11);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        assert_ne!(scene.object("cup").unwrap().transform.position, DVec3::new(3.0, 2.0, 1.0));

        assert!(pass.saved.restore(&mut scene).is_empty());
        assert_eq!(scene.object("cup").unwrap().transform.position, DVec3::new(3.0, 2.0, 1.0));
    }

    #[test]
    fn restore_reports_objects_removed_since_capture() {
        let mut scene = Scene::new();
        scene.add_object(cube("cup", 0.1)).unwrap();
        scene.add_object(cube("bowl", 0.1)).unwrap();

        let mut rng = Pcg64::seed_from_u64(12);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        scene.remove_object("bowl").unwrap();

        assert_eq!(pass.saved.restore(&mut scene), vec!["bowl".to_owned()]);
        assert_eq!(scene.object("cup").unwrap().transform.position, DVec3::ZERO);
    }

    #[test]
    fn volume_wider_than_f64_span_still_samples() {
        let mut scene = Scene::new();
        scene
            .set_spawn_bounds(DVec3::splat(-1e308), DVec3::splat(1e308))
            .unwrap();
        scene.add_object(cube("cup", 0.1)).unwrap();

        let mut rng = Pcg64::seed_from_u64(4);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        assert_eq!(pass.placed.len(), 1);
        assert!(scene.object("cup").unwrap().transform.position.is_finite());
    }

    #[test]
    fn sample_axis_handles_degenerate_ranges() {
        let mut rng = Pcg64::seed_from_u64(8);
        assert_eq!(sample_axis(&mut rng, 2.0, 2.0), 2.0);
        assert_eq!(sample_axis(&mut rng, 3.0, 1.0), 3.0);
        assert!(sample_axis(&mut rng, f64::NAN, 1.0).is_nan());
        let wide = sample_axis(&mut rng, -f64::MAX, f64::MAX);
        assert!(wide.is_finite());
    }

    #[test]
    fn oversized_object_uses_volume_centre() {
        let mut scene = Scene::new();
        scene.add_object(cube("huge", 4.0)).unwrap();

        let mut rng = Pcg64::seed_from_u64(5);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut rng);
        let placed = &pass.placed[0];
        assert!(!placed.fits);
        assert!(placed.collision_free);
        assert_eq!(placed.attempts, 1);
        assert!(placed
            .world_bounds
            .center()
            .abs_diff_eq(scene.spawn_volume().center(), 1e-12));
    }

    #[test]
    fn crowded_volume_exhausts_budget_and_keeps_last_attempt() {
        let mut scene = Scene::new();
        // Zero-width volume: every candidate lands on the same point.
        scene.set_spawn_bounds(DVec3::splat(0.0), DVec3::splat(0.0)).unwrap();
        scene.add_object(cube("a", 0.0)).unwrap();
        let mut second = cube("b", 0.0);
        second.asset.local_bounds = Aabb::new(DVec3::splat(-1e-3), DVec3::splat(1e-3));
        scene.add_object(second).unwrap();

        let engine = PlacementEngine::new(7);
        let mut rng = Pcg64::seed_from_u64(2);
        let pass = engine.randomize(&mut scene, &mut rng);
        let b = &pass.placed[1];
        assert!(!b.fits);
        assert!(!b.collision_free);
        assert_eq!(b.attempts, 7);
    }

    #[test]
    fn placement_is_reproducible_with_a_seed() {
        let build = || {
            let mut scene = Scene::new();
            for i in 0..4 {
                scene.add_object(cube(&format!("o{i}"), 0.1)).unwrap();
            }
            scene
        };
        let mut a = build();
        let mut b = build();
        let engine = PlacementEngine::default();
        engine.randomize(&mut a, &mut Pcg64::seed_from_u64(77));
        engine.randomize(&mut b, &mut Pcg64::seed_from_u64(77));
        assert_eq!(a, b);
    }

    #[test]
    fn yaw_stays_about_the_live_vertical_axis() {
        let mut scene = Scene::new();
        scene.add_object(cube("cup", 0.1)).unwrap();
        let mut rng = Pcg64::seed_from_u64(21);
        PlacementEngine::default().randomize(&mut scene, &mut rng);

        let q = scene.object("cup").unwrap().transform.orientation;
        let up = q * DVec3::Y;
        assert!(up.abs_diff_eq(DVec3::Y, 1e-12));
    }
}
