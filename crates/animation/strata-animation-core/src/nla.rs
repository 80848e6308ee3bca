//! NLA evaluation: strip weights, global -> local time mapping, and layered
//! per-entity blending.
//!
//! Per pass:
//! 1. collect strips with weight > 0 on live entities with a resolvable action
//! 2. group by entity, order by (layer, start); equal keys keep storage order
//! 3. blend each strip's sampled tracks into an accumulator seeded from the
//!    entity's current pose (see `accumulate.rs`)
//! 4. write touched translate/rotate/scale groups back and mark dirty

use log::{debug, trace};

use crate::accumulate::Accumulator;
use crate::channel::Pose;
use crate::data::{Action, ActionLibrary, Frame, NlaStrip};
use crate::ids::EntityId;
use crate::interp::saturate;
use crate::scratch::Scratch;
use crate::world::World;

/// Blend weight of `strip` at `frame`, in [0, 1].
pub fn strip_weight_at(strip: &NlaStrip, frame: Frame) -> f32 {
    if strip.muted || !strip.contains(frame) {
        return 0.0;
    }
    let mut w = if strip.influence.is_finite() {
        strip.influence
    } else {
        0.0
    };
    let f = frame as f32;
    if strip.fade_in > 0.0 && f < strip.start as f32 + strip.fade_in {
        w *= saturate((f - strip.start as f32) / strip.fade_in);
    }
    if strip.fade_out > 0.0 && f > strip.end as f32 - strip.fade_out {
        w *= saturate((strip.end as f32 - f) / strip.fade_out);
    }
    saturate(w)
}

/// Effective playback speed. Non-positive or non-finite scales play at 1x.
#[inline]
pub fn effective_time_scale(strip: &NlaStrip) -> f32 {
    if has_valid_time_scale(strip) {
        strip.time_scale
    } else {
        1.0
    }
}

#[inline]
pub(crate) fn has_valid_time_scale(strip: &NlaStrip) -> bool {
    strip.time_scale.is_finite() && strip.time_scale > 0.0
}

/// Map a global frame to the action-local frame read by `strip`.
///
/// Spans are computed in 64-bit so extreme frame numbers cannot overflow.
pub fn map_to_action_frame(strip: &NlaStrip, action: &Action, global: Frame) -> Frame {
    let (lo, hi) = (action.start.min(action.end), action.start.max(action.end));
    let span = i64::from(strip.out_frame) - i64::from(strip.in_frame);
    if span <= 0 {
        return strip.in_frame.clamp(lo, hi);
    }

    let window = (i64::from(strip.end) - i64::from(strip.start)).max(0) as f64;
    let elapsed = (i64::from(global) - i64::from(strip.start)) as f64;
    let dt = (elapsed * f64::from(effective_time_scale(strip))).clamp(0.0, window);
    let local = if strip.reverse {
        f64::from(strip.out_frame) - dt
    } else {
        f64::from(strip.in_frame) + dt
    };
    let (in_lo, in_hi) = (
        f64::from(strip.in_frame.min(strip.out_frame)),
        f64::from(strip.in_frame.max(strip.out_frame)),
    );
    let local = local.clamp(in_lo, in_hi).round();
    let local = if local.is_finite() {
        local as Frame
    } else {
        strip.in_frame
    };
    local.clamp(lo, hi)
}

/// Ordering key of active strips within one entity.
#[inline]
fn order_key(strip: &NlaStrip) -> (i32, Frame) {
    (strip.layer, strip.start)
}

/// Group the indices of strips that contribute at `frame` by target entity.
fn collect_active(
    strips: &[NlaStrip],
    actions: &ActionLibrary,
    world: &dyn World,
    frame: Frame,
    scratch: &mut Scratch,
) {
    scratch.begin_frame();
    for (i, strip) in strips.iter().enumerate() {
        if strip_weight_at(strip, frame) <= 0.0 {
            continue;
        }
        if !world.is_alive(strip.entity) {
            debug!("strip {i} skipped: entity {:?} is not alive", strip.entity);
            continue;
        }
        if !actions.contains(strip.action) {
            debug!("strip {i} skipped: action {:?} does not resolve", strip.action);
            continue;
        }
        scratch.push(strip.entity, i);
    }
    for list in scratch.groups.values_mut() {
        // Stable: equal (layer, start) keep storage order.
        list.sort_by_key(|&i| order_key(&strips[i]));
    }
}

/// Blend the given (already ordered) strips over `current`.
fn blend(
    strips: &[NlaStrip],
    indices: &[usize],
    actions: &ActionLibrary,
    current: &Pose,
    frame: Frame,
) -> Accumulator {
    let mut acc = Accumulator::new(current);
    for &i in indices {
        let strip = &strips[i];
        let Some(action) = actions.get(strip.action) else {
            continue;
        };
        let weight = strip_weight_at(strip, frame);
        let local = map_to_action_frame(strip, action, frame) as f32;
        for track in &action.tracks {
            acc.add(track.channel, track.curve.sample(local), weight, strip.blend);
        }
    }
    acc
}

/// NLA pass over all strips at `frame`. Appends written entities to `written`.
pub fn evaluate_nla(
    strips: &[NlaStrip],
    actions: &ActionLibrary,
    world: &mut dyn World,
    frame: Frame,
    scratch: &mut Scratch,
    written: &mut Vec<EntityId>,
) {
    collect_active(strips, actions, world, frame, scratch);

    for entity in &scratch.order {
        let Some(indices) = scratch.groups.get(entity) else {
            continue;
        };
        let Some(t) = world.transform_mut(*entity) else {
            continue;
        };
        let acc = blend(strips, indices, actions, &Pose::from_transform(t), frame);
        let touched = acc.touched();
        if !touched.any() {
            continue;
        }
        acc.finalize().write_to(t, touched);
        world.mark_world_dirty(*entity);
        written.push(*entity);
    }
    trace!(
        "nla pass at frame {frame}: {} strips, {} entities written",
        strips.len(),
        written.len()
    );
}

/// Blended pose of `entity` at `frame` without writing to the world.
pub fn blend_entity_pose(
    strips: &[NlaStrip],
    actions: &ActionLibrary,
    world: &dyn World,
    entity: EntityId,
    frame: Frame,
) -> Option<Pose> {
    if !world.is_alive(entity) {
        return None;
    }
    let current = Pose::from_transform(world.transform(entity)?);
    let mut indices: Vec<usize> = strips
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.entity == entity && actions.contains(s.action) && strip_weight_at(s, frame) > 0.0
        })
        .map(|(i, _)| i)
        .collect();
    indices.sort_by_key(|&i| order_key(&strips[i]));
    Some(blend(strips, &indices, actions, &current, frame).finalize())
}

/// Entity has strips but none contributes weight at `frame`.
pub fn is_disabled_at(strips: &[NlaStrip], entity: EntityId, frame: Frame) -> bool {
    let mut any = false;
    for s in strips.iter().filter(|s| s.entity == entity) {
        if strip_weight_at(s, frame) > 0.0 {
            return false;
        }
        any = true;
    }
    any
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ActionId;

    fn strip(start: Frame, end: Frame) -> NlaStrip {
        let mut action = Action::new("a");
        action.start = start;
        action.end = end;
        NlaStrip::for_action(ActionId(1), EntityId(0), &action)
    }

    #[test]
    fn weight_is_zero_outside_window_and_when_muted() {
        let mut s = strip(10, 20);
        assert_eq!(strip_weight_at(&s, 9), 0.0);
        assert_eq!(strip_weight_at(&s, 21), 0.0);
        assert_eq!(strip_weight_at(&s, 10), 1.0);
        s.muted = true;
        assert_eq!(strip_weight_at(&s, 15), 0.0);
    }

    #[test]
    fn overlapping_fades_multiply() {
        let mut s = strip(0, 10);
        s.fade_in = 10.0;
        s.fade_out = 10.0;
        // 0.5 in from the fade-in, 0.5 from the fade-out.
        assert!((strip_weight_at(&s, 5) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn out_of_range_influence_is_saturated() {
        let mut s = strip(0, 10);
        s.influence = 3.0;
        assert_eq!(strip_weight_at(&s, 5), 1.0);
        s.influence = f32::NAN;
        assert_eq!(strip_weight_at(&s, 5), 0.0);
    }

    #[test]
    fn mapping_applies_speed_and_clamps_to_window() {
        let mut action = Action::new("a");
        action.start = 0;
        action.end = 40;
        let mut s = NlaStrip::for_action(ActionId(1), EntityId(0), &action);
        s.start = 100;
        s.end = 120;
        s.in_frame = 0;
        s.out_frame = 40;
        s.time_scale = 2.0;
        assert_eq!(map_to_action_frame(&s, &action, 100), 0);
        assert_eq!(map_to_action_frame(&s, &action, 105), 10);
        // dt is clamped to the 20-frame global window.
        assert_eq!(map_to_action_frame(&s, &action, 150), 20);
        assert_eq!(map_to_action_frame(&s, &action, 90), 0);
    }

    #[test]
    fn extreme_frames_map_without_overflow() {
        let mut action = Action::new("a");
        action.start = 0;
        action.end = 10;
        let mut s = NlaStrip::for_action(ActionId(1), EntityId(0), &action);
        s.start = i32::MIN;
        s.end = i32::MAX;
        s.in_frame = i32::MIN;
        s.out_frame = 10;
        assert_eq!(map_to_action_frame(&s, &action, i32::MAX), 10);
        assert_eq!(map_to_action_frame(&s, &action, i32::MIN), 0);

        s.reverse = true;
        assert_eq!(map_to_action_frame(&s, &action, i32::MIN), 10);

        s.in_frame = 10;
        s.out_frame = i32::MIN;
        assert_eq!(map_to_action_frame(&s, &action, 0), 10);
    }

    #[test]
    fn mapping_reverse_and_degenerate_span() {
        let mut action = Action::new("a");
        action.start = 0;
        action.end = 10;
        let mut s = NlaStrip::for_action(ActionId(1), EntityId(0), &action);
        s.reverse = true;
        assert_eq!(map_to_action_frame(&s, &action, 0), 10);
        assert_eq!(map_to_action_frame(&s, &action, 3), 7);

        s.in_frame = 25;
        s.out_frame = 25;
        assert_eq!(map_to_action_frame(&s, &action, 3), 10);
    }

    #[test]
    fn non_positive_time_scale_plays_at_unit_speed() {
        let mut action = Action::new("a");
        action.start = 0;
        action.end = 10;
        let mut s = NlaStrip::for_action(ActionId(1), EntityId(0), &action);
        s.time_scale = 0.0;
        assert_eq!(map_to_action_frame(&s, &action, 4), 4);
        s.time_scale = -3.0;
        assert_eq!(map_to_action_frame(&s, &action, 4), 4);
    }
}
