//! Property tests for the frame converter.
//!
//! Every mapping between the live and export frames must be an exact inverse
//! of its counterpart and must keep unit quaternions unit-length.

use composer_scene::frame;
use composer_scene::transform::Transform;
use glam::{DQuat, DVec3};
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-9;

/// Strategy that generates finite f64 values in a realistic scene range.
fn finite_f64() -> impl Strategy<Value = f64> {
    (-1_000_000i64..1_000_000i64).prop_map(|v| v as f64 * 0.001)
}

fn vec3() -> impl Strategy<Value = DVec3> {
    (finite_f64(), finite_f64(), finite_f64()).prop_map(|(x, y, z)| DVec3::new(x, y, z))
}

/// Unit quaternions built from a random axis and angle.
fn unit_quat() -> impl Strategy<Value = DQuat> {
    (vec3(), -10_000i64..10_000i64).prop_filter_map("degenerate axis", |(axis, angle)| {
        let axis = axis.try_normalize()?;
        Some(DQuat::from_axis_angle(axis, angle as f64 * 0.001))
    })
}

fn positive_scale() -> impl Strategy<Value = DVec3> {
    (1i64..100_000, 1i64..100_000, 1i64..100_000)
        .prop_map(|(x, y, z)| DVec3::new(x as f64, y as f64, z as f64) * 0.001)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2_000))]

    #[test]
    fn position_round_trips_both_ways(p in vec3()) {
        prop_assert!(frame::position_from_export(frame::position_to_export(p)).abs_diff_eq(p, TOLERANCE));
        prop_assert!(frame::position_to_export(frame::position_from_export(p)).abs_diff_eq(p, TOLERANCE));
    }

    #[test]
    fn orientation_round_trips_both_ways(q in unit_quat()) {
        prop_assert!(frame::orientation_from_export(frame::orientation_to_export(q)).abs_diff_eq(q, TOLERANCE));
        prop_assert!(frame::orientation_to_export(frame::orientation_from_export(q)).abs_diff_eq(q, TOLERANCE));
    }

    #[test]
    fn export_orientation_stays_unit(q in unit_quat()) {
        let exported = frame::orientation_to_export(q);
        prop_assert!((exported.length() - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn scale_round_trips_both_ways(s in positive_scale()) {
        prop_assert_eq!(frame::scale_from_export(frame::scale_to_export(s)), s);
        prop_assert_eq!(frame::scale_to_export(frame::scale_from_export(s)), s);
    }

    #[test]
    fn legacy_euler_round_trips(r in vec3()) {
        prop_assert_eq!(frame::euler_degrees_from_export(frame::euler_degrees_to_export(r)), r);
    }

    #[test]
    fn whole_transform_round_trips(p in vec3(), q in unit_quat(), s in positive_scale()) {
        let t = Transform { position: p, orientation: q, scale: s };
        let back = frame::transform_from_export(&frame::transform_to_export(&t));
        prop_assert!(back.approx_eq(&t, TOLERANCE));
    }

    #[test]
    fn rotation_commutes_with_frame_change(q in unit_quat(), v in vec3()) {
        let a = frame::position_to_export(q * v);
        let b = frame::orientation_to_export(q) * frame::position_to_export(v);
        prop_assert!(a.abs_diff_eq(b, 1e-6 * (1.0 + v.length())));
    }
}
