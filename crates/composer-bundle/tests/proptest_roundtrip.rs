//! Property-based tests for bundle round trips.
//!
//! The description document writes shortest round-trip decimals, so the
//! fallback import path must reproduce transforms to floating tolerance for
//! any finite input.

use composer_bundle::prelude::*;
use composer_scene::prelude::*;
use composer_scene::transform::same_rotation;
use glam::{DQuat, DVec3};
use proptest::prelude::*;

fn finite_f64() -> impl Strategy<Value = f64> {
    -1.0e4f64..1.0e4f64
}

fn vec3() -> impl Strategy<Value = DVec3> {
    (finite_f64(), finite_f64(), finite_f64()).prop_map(|(x, y, z)| DVec3::new(x, y, z))
}

fn unit_quat() -> impl Strategy<Value = DQuat> {
    (-1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0, -1.0f64..1.0).prop_filter_map(
        "degenerate quaternion",
        |(x, y, z, w)| {
            let q = DQuat::from_xyzw(x, y, z, w);
            (q.length() > 1e-3).then(|| q.normalize())
        },
    )
}

fn positive_scale() -> impl Strategy<Value = DVec3> {
    (0.01f64..50.0, 0.01f64..50.0, 0.01f64..50.0).prop_map(|(x, y, z)| DVec3::new(x, y, z))
}

fn transform() -> impl Strategy<Value = Transform> {
    (vec3(), unit_quat(), positive_scale()).prop_map(|(position, orientation, scale)| Transform {
        position,
        orientation,
        scale,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn description_path_reproduces_transforms(
        transforms in proptest::collection::vec(transform(), 1..6),
    ) {
        let mut scene = Scene::new();
        for (i, t) in transforms.iter().enumerate() {
            let name = format!("obj {i}");
            let mut object = SceneObject::new(
                format!("id{i}"),
                name.clone(),
                AssetRef::new(name, "mesh.obj").with_file("mesh.obj", vec![i as u8]),
            );
            object.transform = *t;
            object.disable_gravity = i == 0;
            scene.add_object(object).unwrap();
        }
        scene.set_instruction("sort the objects");

        let mut files = export_bundle(&scene, &[], &ExportOptions::default()).unwrap();
        files.remove(MANIFEST_FILE);
        let parsed = parse_bundle(&files).unwrap();
        prop_assert_eq!(parsed.objects.len(), transforms.len());

        for (i, original) in transforms.iter().enumerate() {
            let folder = format!("obj_{i}");
            let back = parsed
                .objects
                .iter()
                .find(|o| o.folder == folder)
                .and_then(|o| o.transform)
                .unwrap();
            prop_assert!(original.position.abs_diff_eq(back.position, 1e-9));
            prop_assert!(same_rotation(original.orientation, back.orientation, 1e-9));
            prop_assert!(original.scale.abs_diff_eq(back.scale, 1e-9));
        }
    }

    #[test]
    fn manifest_path_reproduces_positions_and_flags(
        position in vec3(),
        gravity_off in any::<bool>(),
    ) {
        let mut scene = Scene::new();
        let mut anchor = SceneObject::new("anchor", "Anchor", AssetRef::new("Anchor", "a.obj"));
        anchor.disable_gravity = true;
        scene.add_object(anchor).unwrap();
        let mut object = SceneObject::new("x", "X", AssetRef::new("X", "x.obj").with_file("x.obj", vec![0]));
        object.transform.position = position;
        object.disable_gravity = gravity_off;
        scene.add_object(object).unwrap();
        scene.set_instruction("move x");

        let files = export_bundle(&scene, &[], &ExportOptions::default()).unwrap();
        let parsed = parse_bundle(&files).unwrap();
        let anchor = parsed.objects.iter().find(|o| o.id == "anchor").unwrap();
        prop_assert!(anchor.disable_gravity);
        prop_assert!(anchor.files.is_empty());
        let back = parsed.objects.iter().find(|o| o.id == "x").unwrap();
        prop_assert_eq!(back.disable_gravity, gravity_off);
        prop_assert!(back.transform.unwrap().position.abs_diff_eq(position, 1e-9));
    }
}
