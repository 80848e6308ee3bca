//! Core configuration for strata-animation-core.

use serde::{Deserialize, Serialize};

use crate::data::Interpolation;

/// Playback defaults and sizing hints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Initial playback rate in frames per second (clamped to >= 1).
    pub fps: f32,
    /// Interpolation of channels created by keying.
    pub default_interpolation: Interpolation,
    /// Initial capacity hint for per-pass entity grouping.
    pub scratch_entities: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fps: 24.0,
            default_interpolation: Interpolation::Linear,
            scratch_entities: 64,
        }
    }
}
