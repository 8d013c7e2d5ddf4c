use glam::{Mat4, Quat, Vec3};
use super::*;

#[test]
fn test_identity() {
    assert_eq!(Trs::default(), Trs::IDENTITY);
    assert_eq!(Trs::IDENTITY.to_matrix(), Mat4::IDENTITY);
}

#[test]
fn test_new_normalizes_rotation() {
    let trs = Trs::new(Vec3::ONE, Quat::from_xyzw(0.0, 2.0, 0.0, 2.0), Vec3::ZERO);
    assert!((trs.rotation.length() - 1.0).abs() < 1e-6);
}

#[test]
fn test_matrix_round_trip() {
    let trs = Trs::new(
        Vec3::new(2.0, 0.5, 1.5),
        Quat::from_euler(glam::EulerRot::YXZ, 0.3, -1.1, 0.7),
        Vec3::new(-4.0, 8.0, 1.0),
    );
    let decomposed = Trs::from_matrix(&trs.to_matrix());

    assert!((decomposed.scale - trs.scale).length() < 1e-4);
    assert!((decomposed.translation - trs.translation).length() < 1e-5);
    assert!(decomposed.rotation.angle_between(trs.rotation) < 1e-3);
}

#[test]
fn test_composes_scale_then_rotation_then_translation() {
    let trs = Trs::new(Vec3::splat(2.0), Quat::from_rotation_z(std::f32::consts::FRAC_PI_2), Vec3::new(0.0, 0.0, 5.0));
    let p = trs.to_matrix().transform_point3(Vec3::X);
    assert!((p - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);
}
