//! Interpolation math shared by curve sampling, blending and keying.
//!
//! Everything here is pure and allocation-free.

pub mod functions;

pub use functions::{euler_deg_to_quat, lerp_f32, quat_to_euler_deg, saturate};
