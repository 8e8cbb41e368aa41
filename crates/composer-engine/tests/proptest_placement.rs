//! Property-based tests for randomized placement.
//!
//! Outcomes are random, so only invariants are checked: containment when the
//! object fits, and non-overlap between placements that stayed collision-free.

use composer_engine::placement::PlacementEngine;
use composer_scene::prelude::*;
use glam::DVec3;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;

fn extent() -> impl Strategy<Value = f64> {
    0.01f64..0.4
}

fn object_bounds() -> impl Strategy<Value = Aabb> {
    (extent(), extent(), extent(), -0.2f64..0.2).prop_map(|(x, y, z, off)| {
        Aabb::from_center_half_extents(DVec3::new(off, 0.0, -off), DVec3::new(x, y, z) * 0.5)
    })
}

fn volume() -> impl Strategy<Value = SpawnVolume> {
    (0.2f64..3.0, 0.2f64..3.0, 0.0f64..1.0, -1.0f64..1.0).prop_map(|(w, d, h, shift)| {
        SpawnVolume::new(
            DVec3::new(shift - w / 2.0, -d / 2.0, 0.0),
            DVec3::new(shift + w / 2.0, d / 2.0, h),
        )
        .unwrap()
    })
}

fn scene_with(bounds: &[Aabb], volume: SpawnVolume) -> Scene {
    let mut scene = Scene::new();
    scene.set_spawn_volume(volume);
    for (i, b) in bounds.iter().enumerate() {
        let id = format!("o{i}");
        scene
            .add_object(SceneObject::new(
                id.clone(),
                id.clone(),
                AssetRef::new(id, "m.obj").with_bounds(*b),
            ))
            .unwrap();
    }
    scene
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn fitting_placements_stay_inside_the_volume(
        bounds in proptest::collection::vec(object_bounds(), 1..8),
        volume in volume(),
        seed in any::<u64>(),
    ) {
        let mut scene = scene_with(&bounds, volume);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut Pcg64::seed_from_u64(seed));

        prop_assert_eq!(pass.placed.len(), bounds.len());
        for placed in &pass.placed {
            if placed.fits && placed.collision_free {
                prop_assert!(
                    volume.as_aabb().contains(&placed.world_bounds),
                    "{} escaped the volume: {:?}", placed.id, placed.world_bounds
                );
            }
            prop_assert!(placed.attempts >= 1 && placed.attempts <= 100);
        }
    }

    #[test]
    fn collision_free_placements_do_not_overlap(
        bounds in proptest::collection::vec(object_bounds(), 2..8),
        volume in volume(),
        seed in any::<u64>(),
    ) {
        let mut scene = scene_with(&bounds, volume);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut Pcg64::seed_from_u64(seed));

        let clean: Vec<_> = pass.placed.iter().filter(|p| p.collision_free).collect();
        for (i, a) in clean.iter().enumerate() {
            for b in &clean[i + 1..] {
                prop_assert!(
                    !a.world_bounds.intersects(&b.world_bounds),
                    "{} overlaps {}", a.id, b.id
                );
            }
        }
    }

    #[test]
    fn reported_bounds_match_the_scene(
        bounds in proptest::collection::vec(object_bounds(), 1..5),
        volume in volume(),
        seed in any::<u64>(),
    ) {
        let mut scene = scene_with(&bounds, volume);
        let pass = PlacementEngine::default().randomize(&mut scene, &mut Pcg64::seed_from_u64(seed));

        for placed in &pass.placed {
            let live = scene.object(&placed.id).unwrap().world_bounds();
            let exported = Aabb::new(
                frame::position_to_export(live.min),
                frame::position_to_export(live.max),
            );
            prop_assert!(exported.min.abs_diff_eq(placed.world_bounds.min, 1e-9));
            prop_assert!(exported.max.abs_diff_eq(placed.world_bounds.max, 1e-9));
        }
    }
}
