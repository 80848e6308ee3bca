//! Strata Animation Core (scene-graph agnostic)
//!
//! Keyframe curves, clip tracks with per-entity ranges, actions placed on an
//! NLA timeline through strips, and keying. [`AnimationSystem`] owns playback
//! and writes evaluated transforms into any host implementing [`World`].

pub mod accumulate;
pub mod baking;
pub mod channel;
pub mod clip;
pub mod config;
pub mod data;
pub mod engine;
pub mod ids;
pub mod inputs;
pub mod interp;
pub mod keying;
pub mod nla;
pub mod outputs;
pub mod sampling;
pub mod scratch;
pub mod stored_animation;
pub mod world;

// Re-exports for hosts
pub use baking::{bake_action, export_baked_json, BakedAction, BakedTrack, BakingConfig};
pub use channel::{Channel, ChannelGroups, Pose};
pub use clip::{evaluate_clip, Clip, ClipTrack, EntityRange};
pub use config::Config;
pub use data::{
    Action, ActionLibrary, ActionTrack, BlendMode, Curve, Ease, Frame, Interpolation, Keyframe,
    NlaStrip, Tangent,
};
pub use engine::AnimationSystem;
pub use ids::{ActionId, BlockId, EntityId, StripId};
pub use inputs::PlaybackCommand;
pub use keying::{KeyingMode, KeyingSettings, KeyingTarget};
pub use nla::{map_to_action_frame, strip_weight_at};
pub use outputs::{CoreEvent, EvalMode, Outputs};
pub use sampling::sample_curve;
pub use stored_animation::{parse_animation_document_json, AnimationDocument, LoadError};
pub use world::{MemoryWorld, Transform, World};
