use super::math::{approach, lerp_clamped, wrap_deg};
use rand::{Rng, rng};

#[test]
fn test_wrap_deg_half_open_interval() {
    assert!((wrap_deg(180.0_f32) - 180.0).abs() < 1e-4);
    assert!((wrap_deg(-180.0_f32) - 180.0).abs() < 1e-4);
    assert!((wrap_deg(190.0_f32) + 170.0).abs() < 1e-4);
    assert!((wrap_deg(350.0_f32) + 10.0).abs() < 1e-4);
    assert!((wrap_deg(-350.0_f32) - 10.0).abs() < 1e-4);
    assert!((wrap_deg(720.0_f64)).abs() < 1e-9);
}

#[test]
fn test_wrap_deg_random_sweep() {
    let mut rng = rng();
    for _ in 0..10_000 {
        let deg: f64 = rng.random_range(-5000.0..5000.0);
        let wrapped = wrap_deg(deg);
        assert!(wrapped > -180.0 && wrapped <= 180.0, "{deg} wrapped to {wrapped}");
        let turns = (deg - wrapped) / 360.0;
        assert!((turns - turns.round()).abs() < 1e-6, "{deg} and {wrapped} differ by {turns} turns");
    }
}

#[test]
fn test_lerp_clamped_limits_factor() {
    assert!((lerp_clamped(0.0_f32, 10.0, 0.25) - 2.5).abs() < 1e-6);
    assert!((lerp_clamped(0.0_f32, 10.0, 4.0) - 10.0).abs() < 1e-6);
    assert!((lerp_clamped(0.0_f32, 10.0, -1.0)).abs() < 1e-6);
}

#[test]
fn test_approach_never_overshoots() {
    assert!((approach(48.0_f32, 5.0, 50.0) - 50.0).abs() < 1e-6);
    assert!((approach(48.0_f32, 1.0, 50.0) - 49.0).abs() < 1e-6);
    assert!((approach(11.0_f32, -3.0, 10.0) - 10.0).abs() < 1e-6);
    // coming back from the far side stops at the bound as well
    assert!((approach(53.0_f32, -5.0, 50.0) - 50.0).abs() < 1e-6);
    assert!((approach(50.0_f32, 0.0, 50.0) - 50.0).abs() < 1e-6);
}
