use strata_animation_core::{sample_curve, Curve, Ease, Interpolation, Keyframe, Tangent};

fn approx(a: f32, b: f32, eps: f32) {
    assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
}

fn ramp(interpolation: Interpolation) -> Curve {
    Curve::with_keys(interpolation, &[(0, 0.0), (10, 10.0)])
}

#[test]
fn linear_ramp_samples_and_holds() {
    let c = ramp(Interpolation::Linear);
    assert_eq!(c.sample(5.0), 5.0);
    assert_eq!(c.sample(10.0), 10.0);
    assert_eq!(c.sample(15.0), 10.0);
    assert_eq!(c.sample(-3.0), 0.0);
}

#[test]
fn constant_holds_left_value_until_next_key() {
    let c = ramp(Interpolation::Constant);
    assert_eq!(c.sample(5.0), 0.0);
    assert_eq!(c.sample(9.999), 0.0);
    assert_eq!(c.sample(10.0), 10.0);
}

#[test]
fn right_key_is_exact_in_every_mode() {
    let keys = [(0, 0.25), (7, -3.5), (12, 8.125), (30, 1.0)];
    for mode in [
        Interpolation::Constant,
        Interpolation::Linear,
        Interpolation::Bezier,
    ] {
        let mut c = Curve::with_keys(mode, &keys);
        for k in &mut c.keyframes {
            k.in_tangent = Tangent::new(-2.0, 1.5);
            k.out_tangent = Tangent::new(2.0, -1.5);
        }
        for &(frame, value) in &keys {
            assert_eq!(c.sample(frame as f32), value, "{mode:?} at {frame}");
        }
    }
}

#[test]
fn single_key_curve_is_constant_everywhere() {
    let c = Curve::with_keys(Interpolation::Bezier, &[(42, 3.0)]);
    for f in [-1000.0, 0.0, 41.5, 42.0, 43.0, 1.0e6] {
        assert_eq!(c.sample(f), 3.0);
    }
}

#[test]
fn empty_curve_samples_zero() {
    let c = Curve::new(Interpolation::Linear);
    assert_eq!(sample_curve(&c, 12.0), 0.0);
}

#[test]
fn bezier_is_finite_for_every_integer_frame() {
    let mut c = Curve::new(Interpolation::Bezier);
    c.keyframes = vec![
        Keyframe::new(0, 0.0).with_tangents(Tangent::ZERO, Tangent::new(40.0, 5.0)),
        Keyframe::new(8, 1.0).with_tangents(Tangent::new(-40.0, 2.0), Tangent::new(-5.0, 0.0)),
        Keyframe::new(9, 1.0).with_tangents(Tangent::new(3.0, 0.0), Tangent::new(0.0, 0.0)),
        Keyframe::new(20, -2.0).with_tangents(Tangent::new(0.0, 0.0), Tangent::ZERO),
    ];
    for f in 0..=20 {
        let v = c.sample(f as f32);
        assert!(v.is_finite(), "frame {f} produced {v}");
    }
}

#[test]
fn bezier_with_flat_thirds_is_symmetric() {
    let mut c = Curve::new(Interpolation::Bezier);
    c.keyframes = vec![
        Keyframe::new(0, 0.0).with_tangents(Tangent::ZERO, Tangent::new(10.0 / 3.0, 0.0)),
        Keyframe::new(10, 1.0).with_tangents(Tangent::new(-10.0 / 3.0, 0.0), Tangent::ZERO),
    ];
    approx(c.sample(5.0), 0.5, 1e-4);
    let early = c.sample(2.0);
    let late = c.sample(8.0);
    approx(early + late, 1.0, 1e-4);
    assert!(early < 0.2, "ease-in expected, got {early}");
}

#[test]
fn sampling_is_deterministic() {
    let mut c = ramp(Interpolation::Bezier);
    c.keyframes[0].out_tangent = Tangent::new(2.0, 4.0);
    c.keyframes[1].in_tangent = Tangent::new(-1.0, -6.0);
    let first: Vec<f32> = (0..100).map(|i| c.sample(i as f32 * 0.1)).collect();
    let second: Vec<f32> = (0..100).map(|i| c.sample(i as f32 * 0.1)).collect();
    assert_eq!(first, second);
}

#[test]
fn easing_overrides_bezier_tangents() {
    let mut c = ramp(Interpolation::Bezier);
    c.keyframes[0].out_tangent = Tangent::new(4.0, 9.0);
    c.keyframes[1].in_tangent = Tangent::new(-4.0, -9.0);
    c.keyframes[0].ease = Ease::CubicIn;
    approx(c.sample(5.0), 1.25, 1e-5);

    c.keyframes[0].ease = Ease::CubicOut;
    approx(c.sample(5.0), 8.75, 1e-5);
}

#[test]
fn constant_ignores_easing() {
    let mut c = ramp(Interpolation::Constant);
    c.keyframes[0].ease = Ease::CubicIn;
    assert_eq!(c.sample(5.0), 0.0);
    assert_eq!(c.sample(10.0), 10.0);
}

#[test]
fn fractional_frames_interpolate() {
    let c = ramp(Interpolation::Linear);
    approx(c.sample(2.5), 2.5, 1e-6);
    assert!(c.sample(f32::NAN).is_finite());
}
