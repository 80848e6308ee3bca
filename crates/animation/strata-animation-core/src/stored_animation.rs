//! Animation document: the full editable animation state (clip, actions,
//! strips, playback and keying settings) as one serde value.
//!
//! Field layout mirrors the in-memory types so a save/load round trip keeps
//! every frame number, tangent, blend mode and layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clip::Clip;
use crate::data::{ActionLibrary, Curve, Frame, NlaStrip};
use crate::keying::KeyingSettings;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimationDocument {
    pub fps: f32,
    #[serde(default)]
    pub frame: Frame,
    #[serde(default)]
    pub clip: Option<Clip>,
    /// Positional; `null` entries are deleted actions whose ids stay reserved.
    #[serde(default)]
    pub actions: ActionLibrary,
    #[serde(default)]
    pub strips: Vec<NlaStrip>,
    #[serde(default)]
    pub keying: KeyingSettings,
}

/// Errors produced while loading an animation document.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("animation document parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("fps must be finite and >= 1, got {0}")]
    InvalidFps(f32),
    #[error("non-finite keyframe data in {owner} at frame {frame}")]
    NonFiniteKey { owner: String, frame: Frame },
    #[error("strip {index} has non-finite {field}")]
    NonFiniteStrip { index: usize, field: &'static str },
}

/// Parse and validate an animation document, restoring the sorted/unique
/// keyframe invariant on every curve.
pub fn parse_animation_document_json(s: &str) -> Result<AnimationDocument, LoadError> {
    let mut doc: AnimationDocument = serde_json::from_str(s)?;
    doc.validate()?;
    doc.normalize();
    Ok(doc)
}

impl AnimationDocument {
    pub fn to_json(&self) -> Result<String, LoadError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), LoadError> {
        if !self.fps.is_finite() || self.fps < 1.0 {
            return Err(LoadError::InvalidFps(self.fps));
        }
        for (id, action) in self.actions.iter() {
            for track in &action.tracks {
                check_curve(&track.curve, || format!("action {} ({:?})", id.0, track.channel))?;
            }
        }
        if let Some(clip) = &self.clip {
            for track in &clip.tracks {
                check_curve(&track.curve, || {
                    format!("clip entity {} ({:?})", track.entity.0, track.channel)
                })?;
            }
        }
        for (index, strip) in self.strips.iter().enumerate() {
            let fields = [
                ("time_scale", strip.time_scale),
                ("influence", strip.influence),
                ("fade_in", strip.fade_in),
                ("fade_out", strip.fade_out),
            ];
            if let Some(&(field, _)) = fields.iter().find(|(_, v)| !v.is_finite()) {
                return Err(LoadError::NonFiniteStrip { index, field });
            }
        }
        Ok(())
    }

    fn normalize(&mut self) {
        if let Some(clip) = &mut self.clip {
            for track in &mut clip.tracks {
                track.curve.normalize();
            }
        }
        let ids: Vec<_> = self.actions.iter().map(|(id, _)| id).collect();
        for id in ids {
            if let Some(action) = self.actions.get_mut(id) {
                for track in &mut action.tracks {
                    track.curve.normalize();
                }
            }
        }
    }
}

fn check_curve(curve: &Curve, owner: impl Fn() -> String) -> Result<(), LoadError> {
    for k in &curve.keyframes {
        let values = [
            k.value,
            k.in_tangent.dx,
            k.in_tangent.dy,
            k.out_tangent.dx,
            k.out_tangent.dy,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(LoadError::NonFiniteKey {
                owner: owner(),
                frame: k.frame,
            });
        }
    }
    Ok(())
}
