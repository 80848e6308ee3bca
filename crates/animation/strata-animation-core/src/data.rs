//! Canonical animation data model: keyframe curves, actions and NLA strips.
//! The simple single-timeline clip model lives in `clip.rs`.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::ids::{ActionId, EntityId, StripId};
use crate::interp::functions as f;

/// Signed integer timeline unit. Ranges are inclusive on both ends.
pub type Frame = i32;

/// Bezier handle offset relative to its key, in (frames, value) units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Tangent {
    pub dx: f32,
    pub dy: f32,
}

impl Tangent {
    pub const ZERO: Tangent = Tangent { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }
}

/// Easing preset applied to the segment that starts at a key.
/// Anything other than `None` overrides Bezier tangents for that segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    #[default]
    None,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    BackIn,
    BackOut,
    BackInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

impl Ease {
    /// Map normalized segment time through the preset. `None` is identity.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Ease::None => t,
            Ease::CubicIn => f::cubic_in(t),
            Ease::CubicOut => f::cubic_out(t),
            Ease::CubicInOut => f::cubic_in_out(t),
            Ease::QuintIn => f::quint_in(t),
            Ease::QuintOut => f::quint_out(t),
            Ease::QuintInOut => f::quint_in_out(t),
            Ease::ExpoIn => f::expo_in(t),
            Ease::ExpoOut => f::expo_out(t),
            Ease::ExpoInOut => f::expo_in_out(t),
            Ease::BackIn => f::back_in(t),
            Ease::BackOut => f::back_out(t),
            Ease::BackInOut => f::back_in_out(t),
            Ease::BounceIn => f::bounce_in(t),
            Ease::BounceOut => f::bounce_out(t),
            Ease::BounceInOut => f::bounce_in_out(t),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub frame: Frame,
    pub value: f32,
    #[serde(default)]
    pub in_tangent: Tangent,
    #[serde(default)]
    pub out_tangent: Tangent,
    /// Easing of the segment leaving this key.
    #[serde(default)]
    pub ease: Ease,
}

impl Keyframe {
    /// Key with flat zero-length handles and no easing.
    pub fn new(frame: Frame, value: f32) -> Self {
        Self {
            frame,
            value,
            in_tangent: Tangent::ZERO,
            out_tangent: Tangent::ZERO,
            ease: Ease::None,
        }
    }

    pub fn with_tangents(mut self, in_tangent: Tangent, out_tangent: Tangent) -> Self {
        self.in_tangent = in_tangent;
        self.out_tangent = out_tangent;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Constant,
    #[default]
    Linear,
    Bezier,
}

/// Keyframes on one scalar channel, sorted ascending and unique per frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub interpolation: Interpolation,
    pub keyframes: Vec<Keyframe>,
}

impl Curve {
    pub fn new(interpolation: Interpolation) -> Self {
        Self {
            interpolation,
            keyframes: Vec::new(),
        }
    }

    pub fn with_keys(interpolation: Interpolation, keys: &[(Frame, f32)]) -> Self {
        let mut curve = Self::new(interpolation);
        curve
            .keyframes
            .extend(keys.iter().map(|&(frame, value)| Keyframe::new(frame, value)));
        curve.normalize();
        curve
    }

    /// Sample the curve; see [`crate::sampling::sample_curve`].
    #[inline]
    pub fn sample(&self, frame: f32) -> f32 {
        crate::sampling::sample_curve(self, frame)
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn key_at(&self, frame: Frame) -> Option<&Keyframe> {
        self.keyframes
            .binary_search_by_key(&frame, |k| k.frame)
            .ok()
            .map(|i| &self.keyframes[i])
    }

    pub fn key_at_mut(&mut self, frame: Frame) -> Option<&mut Keyframe> {
        match self.keyframes.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => Some(&mut self.keyframes[i]),
            Err(_) => None,
        }
    }

    /// First and last keyed frame.
    pub fn frame_span(&self) -> Option<(Frame, Frame)> {
        match (self.keyframes.first(), self.keyframes.last()) {
            (Some(a), Some(b)) => Some((a.frame, b.frame)),
            _ => None,
        }
    }

    /// Restore the sorted/unique invariant after direct edits.
    /// Stable sort, then among keys sharing a frame the later one in storage wins.
    pub fn normalize(&mut self) {
        self.keyframes.sort_by_key(|k| k.frame);
        self.keyframes.dedup_by(|later, kept| {
            if later.frame == kept.frame {
                std::mem::swap(later, kept);
                true
            } else {
                false
            }
        });
    }

    pub fn remove_key(&mut self, frame: Frame) -> Option<Keyframe> {
        match self.keyframes.binary_search_by_key(&frame, |k| k.frame) {
            Ok(i) => Some(self.keyframes.remove(i)),
            Err(_) => None,
        }
    }
}

/// Entity-agnostic channel curve inside an [`Action`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionTrack {
    pub channel: Channel,
    pub curve: Curve,
}

/// Reusable bundle of channel curves, placed onto entities through strips.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub start: Frame,
    pub end: Frame,
    pub tracks: Vec<ActionTrack>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn track(&self, channel: Channel) -> Option<&ActionTrack> {
        self.tracks.iter().find(|t| t.channel == channel)
    }

    pub fn track_mut(&mut self, channel: Channel) -> Option<&mut ActionTrack> {
        self.tracks.iter_mut().find(|t| t.channel == channel)
    }

    /// Find the track for `channel` or append an empty one.
    pub fn track_mut_or_insert(
        &mut self,
        channel: Channel,
        interpolation: Interpolation,
    ) -> &mut ActionTrack {
        let idx = match self.tracks.iter().position(|t| t.channel == channel) {
            Some(idx) => idx,
            None => {
                self.tracks.push(ActionTrack {
                    channel,
                    curve: Curve::new(interpolation),
                });
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[idx]
    }

    pub fn key_count(&self) -> usize {
        self.tracks.iter().map(|t| t.curve.keyframes.len()).sum()
    }

    /// Tighten `[start, end]` to the keyed span. Keying only ever widens.
    pub fn recompute_bounds(&mut self) {
        let span = self
            .tracks
            .iter()
            .filter_map(|t| t.curve.frame_span())
            .reduce(|(a0, a1), (b0, b1)| (a0.min(b0), a1.max(b1)));
        if let Some((start, end)) = span {
            self.start = start;
            self.end = end;
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    #[default]
    Replace,
    Add,
}

/// Placement of one action onto one entity's timeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NlaStrip {
    /// Assigned by `AnimationSystem::add_strip`.
    #[serde(default)]
    pub id: StripId,
    pub action: ActionId,
    pub entity: EntityId,
    /// Global window, inclusive.
    pub start: Frame,
    pub end: Frame,
    /// Local action-frame trim.
    pub in_frame: Frame,
    pub out_frame: Frame,
    pub time_scale: f32,
    #[serde(default)]
    pub reverse: bool,
    #[serde(default)]
    pub blend: BlendMode,
    /// Weight in [0, 1].
    pub influence: f32,
    /// Fade lengths in frames.
    #[serde(default)]
    pub fade_in: f32,
    #[serde(default)]
    pub fade_out: f32,
    /// Higher layers are applied later.
    #[serde(default)]
    pub layer: i32,
    #[serde(default)]
    pub muted: bool,
}

impl NlaStrip {
    /// Strip covering the action's own range one-to-one, at full influence.
    pub fn for_action(id: ActionId, entity: EntityId, action: &Action) -> Self {
        Self {
            id: StripId::default(),
            action: id,
            entity,
            start: action.start,
            end: action.end,
            in_frame: action.start,
            out_frame: action.end,
            time_scale: 1.0,
            reverse: false,
            blend: BlendMode::Replace,
            influence: 1.0,
            fade_in: 0.0,
            fade_out: 0.0,
            layer: 0,
            muted: false,
        }
    }

    #[inline]
    pub fn contains(&self, frame: Frame) -> bool {
        frame >= self.start && frame <= self.end
    }
}

/// Action storage. Ids are positions + 1; removal leaves a tombstone so ids
/// are never reused within a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionLibrary {
    items: Vec<Option<Action>>,
}

impl ActionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, action: Action) -> ActionId {
        self.items.push(Some(action));
        ActionId::from_index(self.items.len() - 1)
    }

    pub fn get(&self, id: ActionId) -> Option<&Action> {
        id.index()
            .and_then(|i| self.items.get(i))
            .and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        id.index()
            .and_then(|i| self.items.get_mut(i))
            .and_then(Option::as_mut)
    }

    pub fn remove(&mut self, id: ActionId) -> Option<Action> {
        id.index()
            .and_then(|i| self.items.get_mut(i))
            .and_then(Option::take)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.get(id).is_some()
    }

    /// Live actions with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (ActionId, &Action)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(i, a)| a.as_ref().map(|a| (ActionId::from_index(i), a)))
    }

    /// Live action count.
    pub fn len(&self) -> usize {
        self.items.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every action. Slots stay reserved so old ids keep resolving to nothing.
    pub fn clear(&mut self) {
        for slot in &mut self.items {
            *slot = None;
        }
    }
}
