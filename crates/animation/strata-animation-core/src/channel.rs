//! Scalar transform channels and the canonical 9-slot pose buffer.
//!
//! Layout: slots 0..3 translate, 3..6 rotate (Euler degrees), 6..9 scale.
//! Rotation is only converted to/from a quaternion at the world boundary.

use serde::{Deserialize, Serialize};

use crate::interp::{euler_deg_to_quat, quat_to_euler_deg};
use crate::world::Transform;

pub const CHANNEL_COUNT: usize = 9;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl Channel {
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::TranslateX,
        Channel::TranslateY,
        Channel::TranslateZ,
        Channel::RotateX,
        Channel::RotateY,
        Channel::RotateZ,
        Channel::ScaleX,
        Channel::ScaleY,
        Channel::ScaleZ,
    ];

    pub const TRANSLATE: [Channel; 3] = [
        Channel::TranslateX,
        Channel::TranslateY,
        Channel::TranslateZ,
    ];
    pub const ROTATE: [Channel; 3] = [Channel::RotateX, Channel::RotateY, Channel::RotateZ];
    pub const SCALE: [Channel; 3] = [Channel::ScaleX, Channel::ScaleY, Channel::ScaleZ];

    /// Slot of this channel in a [`Pose`].
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn is_rotation(self) -> bool {
        matches!(self, Channel::RotateX | Channel::RotateY | Channel::RotateZ)
    }

    /// Component (0..3) within its translate/rotate/scale group.
    #[inline]
    pub const fn component(self) -> usize {
        self.index() % 3
    }
}

/// Nine scalar channel values of one transform.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose(pub [f32; CHANNEL_COUNT]);

impl Default for Pose {
    fn default() -> Self {
        Pose([0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0])
    }
}

impl Pose {
    pub fn from_transform(t: &Transform) -> Self {
        let r = quat_to_euler_deg(t.rotation);
        Pose([
            t.translation[0],
            t.translation[1],
            t.translation[2],
            r[0],
            r[1],
            r[2],
            t.scale[0],
            t.scale[1],
            t.scale[2],
        ])
    }

    #[inline]
    pub fn get(&self, channel: Channel) -> f32 {
        self.0[channel.index()]
    }

    #[inline]
    pub fn set(&mut self, channel: Channel, value: f32) {
        self.0[channel.index()] = value;
    }

    #[inline]
    pub fn translation(&self) -> [f32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    #[inline]
    pub fn euler_degrees(&self) -> [f32; 3] {
        [self.0[3], self.0[4], self.0[5]]
    }

    #[inline]
    pub fn scale(&self) -> [f32; 3] {
        [self.0[6], self.0[7], self.0[8]]
    }

    /// Write selected channel groups into `t`. Non-finite slots keep the
    /// transform's existing component. Marks the transform dirty.
    pub fn write_to(&self, t: &mut Transform, groups: ChannelGroups) {
        if groups.translate {
            t.translation = finite_or(self.translation(), t.translation);
        }
        if groups.rotate {
            let current = quat_to_euler_deg(t.rotation);
            t.rotation = euler_deg_to_quat(finite_or(self.euler_degrees(), current));
        }
        if groups.scale {
            t.scale = finite_or(self.scale(), t.scale);
        }
        t.dirty = true;
    }
}

/// Which translate/rotate/scale groups a blend touched.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelGroups {
    pub translate: bool,
    pub rotate: bool,
    pub scale: bool,
}

impl ChannelGroups {
    pub const ALL: ChannelGroups = ChannelGroups {
        translate: true,
        rotate: true,
        scale: true,
    };

    #[inline]
    pub fn mark(&mut self, channel: Channel) {
        match channel.index() / 3 {
            0 => self.translate = true,
            1 => self.rotate = true,
            _ => self.scale = true,
        }
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.translate || self.rotate || self.scale
    }
}

#[inline]
fn finite_or(v: [f32; 3], fallback: [f32; 3]) -> [f32; 3] {
    let mut out = v;
    for i in 0..3 {
        if !out[i].is_finite() {
            out[i] = fallback[i];
        }
    }
    out
}
