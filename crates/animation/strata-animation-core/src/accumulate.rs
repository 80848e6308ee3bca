//! Per-entity accumulation of strip contributions over the 9-slot pose.
//!
//! Replace slots start from the entity's current pose and move toward each
//! successive sample by its weight (sequential lerp, so later strips dominate).
//! Add slots start at zero and sum `sample * weight` independently of order.
//! The final value of a slot is replace + add.

use crate::channel::{Channel, ChannelGroups, Pose, CHANNEL_COUNT};
use crate::data::BlendMode;

#[derive(Clone, Debug)]
pub struct Accumulator {
    replace: [f32; CHANNEL_COUNT],
    add: [f32; CHANNEL_COUNT],
    touched: ChannelGroups,
}

impl Accumulator {
    /// Seed the Replace slots from `current`.
    pub fn new(current: &Pose) -> Self {
        Self {
            replace: current.0,
            add: [0.0; CHANNEL_COUNT],
            touched: ChannelGroups::default(),
        }
    }

    pub fn add(&mut self, channel: Channel, sample: f32, weight: f32, mode: BlendMode) {
        if weight <= 0.0 || !sample.is_finite() || !weight.is_finite() {
            return;
        }
        let i = channel.index();
        match mode {
            BlendMode::Replace => {
                let acc = self.replace[i];
                self.replace[i] = acc + (sample - acc) * weight;
            }
            BlendMode::Add => self.add[i] += sample * weight,
        }
        self.touched.mark(channel);
    }

    pub fn touched(&self) -> ChannelGroups {
        self.touched
    }

    pub fn finalize(&self) -> Pose {
        let mut out = [0.0; CHANNEL_COUNT];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.replace[i] + self.add[i];
        }
        Pose(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_weight_one_collapses_to_sample() {
        let mut acc = Accumulator::new(&Pose::default());
        acc.add(Channel::TranslateX, 3.0, 0.25, BlendMode::Replace);
        acc.add(Channel::TranslateX, 7.5, 1.0, BlendMode::Replace);
        assert_eq!(acc.finalize().get(Channel::TranslateX), 7.5);
    }

    #[test]
    fn replace_lerps_from_current_pose() {
        let mut pose = Pose::default();
        pose.set(Channel::ScaleX, 2.0);
        let mut acc = Accumulator::new(&pose);
        acc.add(Channel::ScaleX, 4.0, 0.5, BlendMode::Replace);
        assert_eq!(acc.finalize().get(Channel::ScaleX), 3.0);
    }

    #[test]
    fn add_layers_on_top_of_replace() {
        let mut acc = Accumulator::new(&Pose::default());
        acc.add(Channel::RotateZ, 10.0, 0.5, BlendMode::Add);
        acc.add(Channel::RotateZ, 90.0, 1.0, BlendMode::Replace);
        assert_eq!(acc.finalize().get(Channel::RotateZ), 95.0);
        let touched = acc.touched();
        assert!(touched.rotate && !touched.translate && !touched.scale);
    }

    #[test]
    fn zero_weight_is_ignored() {
        let mut acc = Accumulator::new(&Pose::default());
        acc.add(Channel::TranslateY, 5.0, 0.0, BlendMode::Replace);
        assert!(!acc.touched().any());
        assert_eq!(acc.finalize(), Pose::default());
    }
}
