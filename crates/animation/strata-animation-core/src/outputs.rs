//! Output contracts from the animation system.
//!
//! Outputs describe what the last `tick`/`set_frame` did: discrete playback
//! events, which evaluation mode ran, and which entities were written.

use serde::{Deserialize, Serialize};

use crate::data::Frame;
use crate::ids::EntityId;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvalMode {
    /// Strips over actions.
    Nla,
    /// Active clip tracks and ranges.
    Clip,
}

/// Discrete signals emitted while stepping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CoreEvent {
    /// Current frame changed through playback or a seek.
    FrameChanged { from: Frame, to: Frame },
    /// Playback passed the last frame and wrapped to 0.
    Looped { from: Frame },
    /// A non-looping clip reached its last frame and paused.
    PlaybackEnded { frame: Frame },
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub events: Vec<CoreEvent>,
    /// Mode of the evaluation pass, if one ran.
    #[serde(default)]
    pub mode: Option<EvalMode>,
    /// Entities whose transform was written by the pass.
    #[serde(default)]
    pub written: Vec<EntityId>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.events.clear();
        self.mode = None;
        self.written.clear();
    }

    #[inline]
    pub fn push_event(&mut self, event: CoreEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn evaluated(&self) -> bool {
        self.mode.is_some()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.mode.is_none() && self.written.is_empty()
    }
}
