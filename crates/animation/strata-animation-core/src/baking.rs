//! Baking API: sample every channel of an action over a frame window.

use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::data::{Action, Frame};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakingConfig {
    /// First frame, inclusive.
    pub start: Frame,
    /// Last frame, inclusive. `None` uses the action's end.
    pub end: Option<Frame>,
    /// Frame stride (clamped to >= 1).
    pub step: u32,
}

impl Default for BakingConfig {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            step: 1,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedTrack {
    pub channel: Channel,
    /// Sampled values at each baked frame.
    pub values: Vec<f32>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BakedAction {
    pub name: String,
    pub frames: Vec<Frame>,
    pub tracks: Vec<BakedTrack>,
}

/// Bake a single action using the provided config.
pub fn bake_action(action: &Action, cfg: &BakingConfig) -> BakedAction {
    let end = cfg.end.unwrap_or(action.end);
    let step = cfg.step.max(1) as usize;
    let frames: Vec<Frame> = if end >= cfg.start {
        (cfg.start..=end).step_by(step).collect()
    } else {
        Vec::new()
    };

    let tracks = action
        .tracks
        .iter()
        .map(|track| BakedTrack {
            channel: track.channel,
            values: frames
                .iter()
                .map(|&f| track.curve.sample(f as f32))
                .collect(),
        })
        .collect();

    BakedAction {
        name: action.name.clone(),
        frames,
        tracks,
    }
}

/// Baked action as a JSON value (`Null` if serialization fails).
pub fn export_baked_json(baked: &BakedAction) -> serde_json::Value {
    serde_json::to_value(baked).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Curve, Interpolation};

    #[test]
    fn bakes_every_step_inclusive() {
        let mut action = Action::new("slide");
        action
            .track_mut_or_insert(Channel::TranslateX, Interpolation::Linear)
            .curve = Curve::with_keys(Interpolation::Linear, &[(0, 0.0), (10, 10.0)]);
        action.end = 10;
        let baked = bake_action(
            &action,
            &BakingConfig {
                step: 5,
                ..BakingConfig::default()
            },
        );
        assert_eq!(baked.frames, vec![0, 5, 10]);
        assert_eq!(baked.tracks[0].values, vec![0.0, 5.0, 10.0]);

        let json = export_baked_json(&baked);
        assert_eq!(json["tracks"][0]["channel"], "translate_x");
    }

    #[test]
    fn inverted_window_is_empty() {
        let action = Action::new("empty");
        let baked = bake_action(
            &action,
            &BakingConfig {
                start: 5,
                end: Some(1),
                step: 1,
            },
        );
        assert!(baked.frames.is_empty());
    }
}
