//! Clip model: entity-bound channel tracks plus per-entity active ranges.
//!
//! A block groups the tracks of one entity that share a keyed window. When
//! several ranges of the same entity cover a frame, the one with the latest
//! start wins; on an exact tie the later range in storage order wins.

use hashbrown::HashMap;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::data::{Curve, Frame, Interpolation};
use crate::ids::{BlockId, EntityId};
use crate::interp::{euler_deg_to_quat, quat_to_euler_deg};
use crate::world::World;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipTrack {
    pub entity: EntityId,
    pub block: BlockId,
    pub channel: Channel,
    pub curve: Curve,
}

/// Active window, in global clip frames, for one block of one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRange {
    pub entity: EntityId,
    pub block: BlockId,
    pub start: Frame,
    pub end: Frame,
}

impl EntityRange {
    #[inline]
    pub fn contains(&self, frame: Frame) -> bool {
        frame >= self.start && frame <= self.end
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub name: String,
    pub last_frame: Frame,
    /// Recompute `last_frame` from keys and ranges after edits.
    #[serde(default)]
    pub auto_last_frame: bool,
    #[serde(default)]
    pub looping: bool,
    #[serde(default)]
    pub tracks: Vec<ClipTrack>,
    #[serde(default)]
    pub ranges: Vec<EntityRange>,
    #[serde(default)]
    pub next_block_id: u32,
}

impl Default for Clip {
    fn default() -> Self {
        Self {
            name: String::new(),
            last_frame: 250,
            auto_last_frame: false,
            looping: false,
            tracks: Vec::new(),
            ranges: Vec::new(),
            next_block_id: 0,
        }
    }
}

impl Clip {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn allocate_block(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id = self.next_block_id.wrapping_add(1);
        id
    }

    /// Declare a new keyed window for `entity` under a fresh block.
    pub fn add_range(&mut self, entity: EntityId, start: Frame, end: Frame) -> BlockId {
        let block = self.allocate_block();
        self.ranges.push(EntityRange {
            entity,
            block,
            start: start.min(end),
            end: start.max(end),
        });
        if self.auto_last_frame {
            self.recompute_last_frame();
        }
        block
    }

    pub fn track(&self, entity: EntityId, block: BlockId, channel: Channel) -> Option<&ClipTrack> {
        self.tracks
            .iter()
            .find(|t| t.entity == entity && t.block == block && t.channel == channel)
    }

    /// Find the track for (entity, block, channel) or append an empty one.
    pub fn track_mut(
        &mut self,
        entity: EntityId,
        block: BlockId,
        channel: Channel,
        interpolation: Interpolation,
    ) -> &mut ClipTrack {
        let idx = match self
            .tracks
            .iter()
            .position(|t| t.entity == entity && t.block == block && t.channel == channel)
        {
            Some(idx) => idx,
            None => {
                self.tracks.push(ClipTrack {
                    entity,
                    block,
                    channel,
                    curve: Curve::new(interpolation),
                });
                self.tracks.len() - 1
            }
        };
        &mut self.tracks[idx]
    }

    pub fn has_ranges(&self, entity: EntityId) -> bool {
        self.ranges.iter().any(|r| r.entity == entity)
    }

    /// Range authoritative for `entity` at `frame`.
    pub fn winning_range(&self, entity: EntityId, frame: Frame) -> Option<&EntityRange> {
        let mut best: Option<&EntityRange> = None;
        for r in self.ranges.iter().filter(|r| r.entity == entity && r.contains(frame)) {
            match best {
                Some(b) if r.start < b.start => {}
                _ => best = Some(r),
            }
        }
        best
    }

    pub fn winning_block(&self, entity: EntityId, frame: Frame) -> Option<BlockId> {
        self.winning_range(entity, frame).map(|r| r.block)
    }

    /// Winning block of every entity that has one at `frame`.
    pub fn winning_blocks(&self, frame: Frame) -> HashMap<EntityId, BlockId> {
        let mut best: HashMap<EntityId, EntityRange> = HashMap::new();
        for r in self.ranges.iter().filter(|r| r.contains(frame)) {
            let replace = best.get(&r.entity).map_or(true, |b| r.start >= b.start);
            if replace {
                best.insert(r.entity, *r);
            }
        }
        best.into_iter().map(|(e, r)| (e, r.block)).collect()
    }

    /// Latest keyed frame or range end across the clip, at least 1.
    pub fn content_last_frame(&self) -> Frame {
        let keys = self
            .tracks
            .iter()
            .filter_map(|t| t.curve.frame_span().map(|(_, end)| end));
        let ranges = self.ranges.iter().map(|r| r.end);
        keys.chain(ranges).max().unwrap_or(0).max(1)
    }

    /// Store [`Clip::content_last_frame`] into `last_frame`.
    pub fn recompute_last_frame(&mut self) -> Frame {
        self.last_frame = self.content_last_frame();
        self.last_frame
    }

    /// Last frame used by playback. With `auto_last_frame` it follows the
    /// current content, so direct edits of `tracks`/`ranges` are picked up.
    pub fn effective_last_frame(&self) -> Frame {
        if self.auto_last_frame {
            self.content_last_frame()
        } else {
            self.last_frame
        }
    }

    /// Split the range of (`entity`, `block`) at `at`: the original keeps
    /// `[start, at - 1]`, a new block takes `[at, end]` with copies of the
    /// block's tracks. Returns the new block, or `None` if `at` is not strictly
    /// inside the range.
    pub fn cut_range(&mut self, entity: EntityId, block: BlockId, at: Frame) -> Option<BlockId> {
        let idx = self
            .ranges
            .iter()
            .position(|r| r.entity == entity && r.block == block)?;
        let range = self.ranges[idx];
        if at <= range.start || at > range.end {
            return None;
        }
        let new_block = self.allocate_block();
        self.ranges[idx].end = at - 1;
        self.ranges.push(EntityRange {
            entity,
            block: new_block,
            start: at,
            end: range.end,
        });
        let copies: Vec<ClipTrack> = self
            .tracks
            .iter()
            .filter(|t| t.entity == entity && t.block == block)
            .map(|t| ClipTrack {
                block: new_block,
                ..t.clone()
            })
            .collect();
        self.tracks.extend(copies);
        Some(new_block)
    }

    /// Drop every track and range bound to `entity`.
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.tracks.retain(|t| t.entity != entity);
        self.ranges.retain(|r| r.entity != entity);
        if self.auto_last_frame {
            self.recompute_last_frame();
        }
    }

    /// Entity has ranges but none covers `frame`.
    pub fn is_disabled_at(&self, entity: EntityId, frame: Frame) -> bool {
        let mut any = false;
        for r in self.ranges.iter().filter(|r| r.entity == entity) {
            if r.contains(frame) {
                return false;
            }
            any = true;
        }
        any
    }
}

/// Clip-mode pass: sample the tracks of each entity's winning block at `frame`
/// and write them into the world. Appends written entities to `written`.
pub fn evaluate_clip(
    clip: &Clip,
    world: &mut dyn World,
    frame: Frame,
    written: &mut Vec<EntityId>,
) {
    let winners = clip.winning_blocks(frame);
    // Euler buffers seeded from the current rotation so untouched axes keep their value.
    let mut rotations: HashMap<EntityId, [f32; 3]> = HashMap::new();
    let sample_at = frame as f32;

    for track in &clip.tracks {
        if winners.get(&track.entity) != Some(&track.block) {
            continue;
        }
        if !world.is_alive(track.entity) {
            continue;
        }
        let value = track.curve.sample(sample_at);
        if !value.is_finite() {
            continue;
        }
        let Some(t) = world.transform_mut(track.entity) else {
            continue;
        };
        if track.channel.is_rotation() {
            let euler = rotations
                .entry(track.entity)
                .or_insert_with(|| quat_to_euler_deg(t.rotation));
            euler[track.channel.component()] = value;
            continue;
        }
        let c = track.channel.component();
        if track.channel.index() < 3 {
            t.translation[c] = value;
        } else {
            t.scale[c] = value;
        }
        t.dirty = true;
        world.mark_world_dirty(track.entity);
        if !written.contains(&track.entity) {
            written.push(track.entity);
        }
    }

    for (entity, euler) in rotations {
        if let Some(t) = world.transform_mut(entity) {
            t.rotation = euler_deg_to_quat(euler);
            t.dirty = true;
            world.mark_world_dirty(entity);
            if !written.contains(&entity) {
                written.push(entity);
            }
        }
    }
    trace!("clip pass at frame {frame}: {} entities written", written.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_last_frame_tracks_content_only_in_auto_mode() {
        let e = EntityId(2);
        let mut clip = Clip::new("c");
        clip.add_range(e, 0, 10);
        clip.ranges[0].end = 80;
        assert_eq!(clip.effective_last_frame(), 250);

        clip.auto_last_frame = true;
        assert_eq!(clip.effective_last_frame(), 80);
        assert_eq!(clip.last_frame, 250);
    }

    #[test]
    fn later_start_wins_then_storage_order() {
        let e = EntityId(1);
        let mut clip = Clip::new("c");
        let a = clip.add_range(e, 0, 100);
        let b = clip.add_range(e, 20, 60);
        let c = clip.add_range(e, 20, 80);
        assert_eq!(clip.winning_block(e, 10), Some(a));
        assert_eq!(clip.winning_block(e, 30), Some(c));
        assert_eq!(clip.winning_block(e, 70), Some(c));
        assert_eq!(clip.winning_block(e, 90), Some(a));
        assert_ne!(b, c);
        assert_eq!(clip.winning_blocks(30).get(&e), Some(&c));
    }

    #[test]
    fn cut_range_splits_and_duplicates_tracks() {
        let e = EntityId(4);
        let mut clip = Clip::new("c");
        let block = clip.add_range(e, 0, 40);
        clip.track_mut(e, block, Channel::TranslateX, Interpolation::Linear)
            .curve = Curve::with_keys(Interpolation::Linear, &[(0, 0.0), (40, 40.0)]);

        assert_eq!(clip.cut_range(e, block, 0), None);
        let new_block = clip.cut_range(e, block, 20).expect("cut inside range");
        assert_eq!(clip.winning_block(e, 19), Some(block));
        assert_eq!(clip.winning_block(e, 20), Some(new_block));
        let copy = clip
            .track(e, new_block, Channel::TranslateX)
            .expect("track copied");
        assert_eq!(copy.curve.sample(30.0), 30.0);
    }

    #[test]
    fn auto_last_frame_tracks_keys_and_ranges() {
        let e = EntityId(0);
        let mut clip = Clip::new("c");
        let block = clip.add_range(e, 0, 30);
        clip.track_mut(e, block, Channel::ScaleX, Interpolation::Linear)
            .curve = Curve::with_keys(Interpolation::Linear, &[(0, 1.0), (72, 2.0)]);
        assert_eq!(clip.recompute_last_frame(), 72);
    }

    #[test]
    fn disabled_only_when_ranges_exist() {
        let e = EntityId(0);
        let other = EntityId(1);
        let mut clip = Clip::new("c");
        clip.add_range(e, 10, 20);
        assert!(clip.is_disabled_at(e, 5));
        assert!(!clip.is_disabled_at(e, 15));
        assert!(!clip.is_disabled_at(other, 5));
    }
}
