//! Keying: record channel values as keyframes on an action.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::channel::{Channel, Pose};
use crate::data::{Action, Frame, Interpolation, Keyframe};
use crate::ids::{ActionId, EntityId};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyingMode {
    /// Overwrite the value of an existing key in place, keeping its tangents and easing.
    #[default]
    Replace,
    /// Always insert a fresh key; on a frame collision the new key wins.
    Add,
}

/// Which action auto-keying writes into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyingTarget {
    pub action: ActionId,
    /// Only key this entity when set.
    #[serde(default)]
    pub restrict_to_entity: Option<EntityId>,
}

impl KeyingTarget {
    pub fn accepts(&self, entity: EntityId) -> bool {
        self.restrict_to_entity.map_or(true, |e| e == entity)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyingSettings {
    pub mode: KeyingMode,
    pub key_translate: bool,
    pub key_rotate: bool,
    pub key_scale: bool,
    /// Key on every transform edit (`on_transform_edited`).
    pub auto_key: bool,
    pub target: KeyingTarget,
}

impl Default for KeyingSettings {
    fn default() -> Self {
        Self {
            mode: KeyingMode::Replace,
            key_translate: true,
            key_rotate: true,
            key_scale: true,
            auto_key: false,
            target: KeyingTarget::default(),
        }
    }
}

impl KeyingSettings {
    /// Channels enabled by the per-component flags, in pose order.
    pub fn channels(&self) -> impl Iterator<Item = Channel> + '_ {
        Channel::ALL.into_iter().filter(move |ch| match ch.index() / 3 {
            0 => self.key_translate,
            1 => self.key_rotate,
            _ => self.key_scale,
        })
    }
}

/// Insert or update the key of `channel` at `frame`.
///
/// Creates the channel track with `interpolation` when missing. The action's
/// bounds snap to `frame` on its first key and only widen afterwards.
pub fn key_value(
    action: &mut Action,
    channel: Channel,
    frame: Frame,
    value: f32,
    mode: KeyingMode,
    interpolation: Interpolation,
) {
    let first_key = action.key_count() == 0;
    let curve = &mut action.track_mut_or_insert(channel, interpolation).curve;

    let updated_in_place = match (mode, curve.key_at_mut(frame)) {
        (KeyingMode::Replace, Some(key)) => {
            key.value = value;
            true
        }
        _ => false,
    };
    if !updated_in_place {
        curve.keyframes.push(Keyframe::new(frame, value));
        curve.normalize();
    }

    if first_key {
        action.start = frame;
        action.end = frame;
    } else {
        action.start = action.start.min(frame);
        action.end = action.end.max(frame);
    }
}

/// Key every enabled channel of `pose` at `frame`. Returns the number of keys written.
pub fn key_pose(
    action: &mut Action,
    pose: &Pose,
    frame: Frame,
    settings: &KeyingSettings,
    interpolation: Interpolation,
) -> usize {
    let mut written = 0;
    for channel in settings.channels() {
        let value = pose.get(channel);
        if !value.is_finite() {
            debug!("skipping non-finite {channel:?} key at frame {frame}");
            continue;
        }
        key_value(action, channel, frame, value, settings.mode, interpolation);
        written += 1;
    }
    written
}
