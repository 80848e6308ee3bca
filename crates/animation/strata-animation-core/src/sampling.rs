//! Curve sampling.
//!
//! Model:
//! - Keys are sorted by frame and unique per frame.
//! - Outside the keyed span the curve holds the first/last value (no extrapolation).
//! - Inside segment [a, b]:
//!   * frame == b.frame returns b.value exactly (right key wins at the boundary)
//!   * Constant holds a.value
//!   * a.ease != None: lerp through the easing preset (overrides tangents)
//!   * Linear: plain lerp
//!   * Bezier: 2D cubic with handles from a.out_tangent / b.in_tangent, handle x
//!     clamped into [a.frame, b.frame] so x(t) is monotonic, inverted by bisection.
//!
//! Sampling is pure; it never mutates the curve.

use crate::data::{Curve, Ease, Interpolation, Keyframe};
use crate::interp::functions::{cubic_bezier, lerp_f32, solve_bezier_t};

/// Sample `curve` at continuous time `frame`.
pub fn sample_curve(curve: &Curve, frame: f32) -> f32 {
    let keys = &curve.keyframes;
    let (first, last) = match (keys.first(), keys.last()) {
        (Some(first), Some(last)) => (first, last),
        // No keys: neutral 0.0 (fail-soft).
        _ => return 0.0,
    };
    if keys.len() == 1 || frame.is_nan() || frame <= first.frame as f32 {
        return first.value;
    }
    if frame >= last.frame as f32 {
        return last.value;
    }

    // First key at or after `frame`; in 1..len because first.frame < frame < last.frame.
    let bi = keys.partition_point(|k| (k.frame as f32) < frame);
    let a = &keys[bi - 1];
    let b = &keys[bi];
    if frame == b.frame as f32 {
        return b.value;
    }
    sample_segment(curve.interpolation, a, b, frame)
}

fn sample_segment(mode: Interpolation, a: &Keyframe, b: &Keyframe, frame: f32) -> f32 {
    if mode == Interpolation::Constant {
        return a.value;
    }
    let x0 = a.frame as f32;
    let x3 = b.frame as f32;
    let span = (x3 - x0).max(f32::EPSILON);
    let t = ((frame - x0) / span).clamp(0.0, 1.0);

    if a.ease != Ease::None {
        return lerp_f32(a.value, b.value, a.ease.apply(t));
    }
    match mode {
        Interpolation::Linear => lerp_f32(a.value, b.value, t),
        _ => sample_bezier(a, b, frame),
    }
}

fn sample_bezier(a: &Keyframe, b: &Keyframe, frame: f32) -> f32 {
    let x0 = a.frame as f32;
    let x3 = b.frame as f32;
    let y0 = a.value;
    let y3 = b.value;

    let x1 = finite_or_zero(x0 + a.out_tangent.dx).clamp(x0, x3);
    let x2 = finite_or_zero(x3 + b.in_tangent.dx).clamp(x0, x3);
    let y1 = y0 + finite_or_zero(a.out_tangent.dy);
    let y2 = y3 + finite_or_zero(b.in_tangent.dy);

    let t = solve_bezier_t(x0, x1, x2, x3, frame);
    cubic_bezier(y0, y1, y2, y3, t)
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Keyframe, Tangent};

    #[test]
    fn non_finite_tangents_do_not_poison_the_sample() {
        let mut c = Curve::new(Interpolation::Bezier);
        let broken = Tangent::new(f32::NAN, f32::INFINITY);
        c.keyframes
            .push(Keyframe::new(0, 0.0).with_tangents(Tangent::ZERO, broken));
        c.keyframes.push(Keyframe::new(10, 10.0));
        for f in 0..=10 {
            assert!(c.sample(f as f32).is_finite());
        }
    }
}
