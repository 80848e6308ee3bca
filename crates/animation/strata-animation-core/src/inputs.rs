//! Playback commands for hosts that queue controls and apply them once per tick.

use serde::{Deserialize, Serialize};

use crate::data::Frame;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum PlaybackCommand {
    Play,
    Pause,
    Toggle,
    Seek { frame: Frame },
    SetFps { fps: f32 },
}
