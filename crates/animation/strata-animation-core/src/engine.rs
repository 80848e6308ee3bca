//! AnimationSystem: owns playback state, actions, strips and the active clip,
//! and dispatches evaluation into a host [`World`].
//!
//! Exactly one evaluation mode runs per pass: NLA when the strip list is
//! non-empty, otherwise the active clip.

use log::{debug, info, warn};

use crate::channel::{Channel, Pose};
use crate::clip::{evaluate_clip, Clip};
use crate::config::Config;
use crate::data::{Action, ActionLibrary, Frame, NlaStrip};
use crate::ids::{ActionId, EntityId, IdAllocator, StripId};
use crate::inputs::PlaybackCommand;
use crate::keying::{key_pose, key_value, KeyingMode, KeyingSettings};
use crate::nla;
use crate::outputs::{CoreEvent, EvalMode, Outputs};
use crate::scratch::Scratch;
use crate::stored_animation::AnimationDocument;
use crate::world::World;

#[derive(Debug)]
pub struct AnimationSystem {
    cfg: Config,
    ids: IdAllocator,
    actions: ActionLibrary,
    strips: Vec<NlaStrip>,
    clip: Option<Clip>,
    keying: KeyingSettings,

    // Playback
    frame: Frame,
    fps: f32,
    playing: bool,
    /// Seconds not yet consumed by whole frame steps.
    accumulator: f32,

    scratch: Scratch,
    outputs: Outputs,
}

impl Default for AnimationSystem {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl AnimationSystem {
    pub fn new(cfg: Config) -> Self {
        Self {
            scratch: Scratch::new(&cfg),
            fps: sanitize_fps(cfg.fps).unwrap_or(24.0),
            cfg,
            ids: IdAllocator::new(),
            actions: ActionLibrary::new(),
            strips: Vec::new(),
            clip: None,
            keying: KeyingSettings::default(),
            frame: 0,
            playing: false,
            accumulator: 0.0,
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    // ---- playback -------------------------------------------------------

    pub fn play(&mut self) {
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.playing = false;
    }

    pub fn toggle(&mut self) {
        self.playing = !self.playing;
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Set the playback rate, clamped to >= 1. Non-finite input is ignored.
    pub fn set_fps(&mut self, fps: f32) {
        match sanitize_fps(fps) {
            Some(fps) => self.fps = fps,
            None => warn!("ignoring non-finite fps {fps}"),
        }
    }

    /// Mode the next evaluation pass would use.
    pub fn mode(&self) -> Option<EvalMode> {
        if !self.strips.is_empty() {
            Some(EvalMode::Nla)
        } else if self.clip.is_some() {
            Some(EvalMode::Clip)
        } else {
            None
        }
    }

    /// Last frame of the active clip, if any.
    pub fn last_frame(&self) -> Option<Frame> {
        self.clip.as_ref().map(Clip::effective_last_frame)
    }

    /// Jump to `frame`, drop any partial frame time, evaluate once and refresh
    /// disabled-by-animation flags.
    pub fn set_frame(&mut self, world: &mut dyn World, frame: Frame) -> &Outputs {
        self.outputs.clear();
        let from = self.frame;
        self.frame = frame;
        self.accumulator = 0.0;
        if from != frame {
            self.outputs.push_event(CoreEvent::FrameChanged { from, to: frame });
        }
        self.evaluate_pass(world);
        self.refresh_disabled_flags(world);
        &self.outputs
    }

    /// Advance playback by `dt` seconds. The frame moves one step per `1/fps`
    /// seconds; evaluation runs at most once per call, only if the frame moved.
    pub fn tick(&mut self, world: &mut dyn World, dt: f32) -> &Outputs {
        self.outputs.clear();
        if self.mode().is_none() || !self.playing {
            return &self.outputs;
        }
        if !dt.is_finite() || dt <= 0.0 {
            return &self.outputs;
        }

        let step = 1.0 / self.fps;
        let from = self.frame;
        let mut advanced = false;
        self.accumulator += dt;
        while self.accumulator >= step {
            self.accumulator -= step;
            match self.step_frame() {
                Step::Advanced => advanced = true,
                Step::Ended { moved } => {
                    advanced |= moved;
                    break;
                }
            }
        }

        if advanced {
            if self.frame != from {
                self.outputs.push_event(CoreEvent::FrameChanged {
                    from,
                    to: self.frame,
                });
            }
            self.evaluate_pass(world);
            self.refresh_disabled_flags(world);
        }
        &self.outputs
    }

    /// Move one frame forward under the looping policy of the current mode.
    fn step_frame(&mut self) -> Step {
        let next = self.frame.saturating_add(1);
        let nla_mode = !self.strips.is_empty();
        let Some(clip) = self.clip.as_ref() else {
            self.frame = next;
            return Step::Advanced;
        };
        let (last, looping) = (clip.effective_last_frame(), clip.looping);

        if next <= last {
            self.frame = next;
            return Step::Advanced;
        }
        if looping {
            self.outputs.push_event(CoreEvent::Looped { from: self.frame });
            self.frame = 0;
            return Step::Advanced;
        }
        if nla_mode {
            // Strips outside their window contribute nothing; no clamping here.
            self.frame = next;
            return Step::Advanced;
        }

        let moved = self.frame != last;
        self.frame = last;
        self.playing = false;
        self.accumulator = 0.0;
        info!("playback ended at frame {last}");
        self.outputs.push_event(CoreEvent::PlaybackEnded { frame: last });
        Step::Ended { moved }
    }

    /// Run one evaluation pass at the current frame without touching playback state.
    pub fn evaluate(&mut self, world: &mut dyn World) -> &Outputs {
        self.outputs.clear();
        self.evaluate_pass(world);
        self.refresh_disabled_flags(world);
        &self.outputs
    }

    fn evaluate_pass(&mut self, world: &mut dyn World) {
        if !self.strips.is_empty() {
            nla::evaluate_nla(
                &self.strips,
                &self.actions,
                world,
                self.frame,
                &mut self.scratch,
                &mut self.outputs.written,
            );
            self.outputs.mode = Some(EvalMode::Nla);
        } else if let Some(clip) = &self.clip {
            evaluate_clip(clip, world, self.frame, &mut self.outputs.written);
            self.outputs.mode = Some(EvalMode::Clip);
        }
    }

    /// Recompute `disabled_by_animation` on every live entity for the current
    /// frame and mode. Entities without bindings are never flagged.
    pub fn refresh_disabled_flags(&self, world: &mut dyn World) {
        for entity in world.entities() {
            let disabled = match self.mode() {
                Some(EvalMode::Nla) => nla::is_disabled_at(&self.strips, entity, self.frame),
                Some(EvalMode::Clip) => self
                    .clip
                    .as_ref()
                    .is_some_and(|c| c.is_disabled_at(entity, self.frame)),
                None => false,
            };
            if let Some(t) = world.transform_mut(entity) {
                t.disabled_by_animation = disabled;
            }
        }
    }

    /// Reset `disabled_by_animation` on every live entity.
    pub fn clear_disabled_flags(&self, world: &mut dyn World) {
        for entity in world.entities() {
            if let Some(t) = world.transform_mut(entity) {
                t.disabled_by_animation = false;
            }
        }
    }

    /// Apply a queued playback command.
    pub fn apply(&mut self, world: &mut dyn World, cmd: PlaybackCommand) -> &Outputs {
        match cmd {
            PlaybackCommand::Seek { frame } => return self.set_frame(world, frame),
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause => self.pause(),
            PlaybackCommand::Toggle => self.toggle(),
            PlaybackCommand::SetFps { fps } => self.set_fps(fps),
        }
        self.outputs.clear();
        &self.outputs
    }

    // ---- clip -----------------------------------------------------------

    /// Install the clip used in clip mode, returning the previous one.
    pub fn set_active_clip(&mut self, clip: Option<Clip>) -> Option<Clip> {
        std::mem::replace(&mut self.clip, clip)
    }

    pub fn active_clip(&self) -> Option<&Clip> {
        self.clip.as_ref()
    }

    pub fn active_clip_mut(&mut self) -> Option<&mut Clip> {
        self.clip.as_mut()
    }

    // ---- actions --------------------------------------------------------

    pub fn create_action(&mut self, name: &str) -> ActionId {
        self.actions.insert(Action::new(name))
    }

    pub fn action(&self, id: ActionId) -> Option<&Action> {
        self.actions.get(id)
    }

    pub fn action_mut(&mut self, id: ActionId) -> Option<&mut Action> {
        self.actions.get_mut(id)
    }

    /// Delete an action. Its id is never reused; strips pointing at it go inactive.
    pub fn remove_action(&mut self, id: ActionId) -> Option<Action> {
        self.actions.remove(id)
    }

    pub fn actions(&self) -> &ActionLibrary {
        &self.actions
    }

    pub fn actions_mut(&mut self) -> &mut ActionLibrary {
        &mut self.actions
    }

    // ---- strips ---------------------------------------------------------

    /// Append a strip with a freshly allocated id.
    pub fn add_strip(&mut self, mut strip: NlaStrip) -> StripId {
        let id = self.ids.alloc_strip();
        strip.id = id;
        warn_degenerate_strip(&strip);
        self.strips.push(strip);
        id
    }

    pub fn remove_strip(&mut self, id: StripId) -> Option<NlaStrip> {
        let idx = self.strips.iter().position(|s| s.id == id)?;
        Some(self.strips.remove(idx))
    }

    pub fn strip(&self, id: StripId) -> Option<&NlaStrip> {
        self.strips.iter().find(|s| s.id == id)
    }

    pub fn strip_mut(&mut self, id: StripId) -> Option<&mut NlaStrip> {
        self.strips.iter_mut().find(|s| s.id == id)
    }

    pub fn strips(&self) -> &[NlaStrip] {
        &self.strips
    }

    /// Direct access for timeline editing. Strips pushed here keep whatever id they carry.
    pub fn strips_mut(&mut self) -> &mut Vec<NlaStrip> {
        &mut self.strips
    }

    pub fn strips_for_entity(&self, entity: EntityId) -> impl Iterator<Item = &NlaStrip> {
        self.strips.iter().filter(move |s| s.entity == entity)
    }

    /// Remove every strip targeting `entity`; returns how many were removed.
    pub fn remove_strips_for_entity(&mut self, entity: EntityId) -> usize {
        let before = self.strips.len();
        self.strips.retain(|s| s.entity != entity);
        before - self.strips.len()
    }

    /// Remove all strips, returning to clip mode.
    pub fn clear_nla(&mut self) {
        self.strips.clear();
    }

    /// NLA blend of `entity` at `frame`, without writing to the world.
    pub fn bake_entity_pose(
        &self,
        world: &dyn World,
        entity: EntityId,
        frame: Frame,
    ) -> Option<Pose> {
        nla::blend_entity_pose(&self.strips, &self.actions, world, entity, frame)
    }

    // ---- keying ---------------------------------------------------------

    pub fn keying_settings(&self) -> &KeyingSettings {
        &self.keying
    }

    pub fn keying_settings_mut(&mut self) -> &mut KeyingSettings {
        &mut self.keying
    }

    /// Key one channel value on action `id`. Returns false if the action does not resolve.
    pub fn key_value(
        &mut self,
        id: ActionId,
        channel: Channel,
        frame: Frame,
        value: f32,
        mode: KeyingMode,
    ) -> bool {
        let interpolation = self.cfg.default_interpolation;
        match self.actions.get_mut(id) {
            Some(action) => {
                key_value(action, channel, frame, value, mode, interpolation);
                true
            }
            None => {
                debug!("key_value: action {id:?} does not resolve");
                false
            }
        }
    }

    /// Key the enabled translate/rotate/scale channels of `entity` into the
    /// keying target action at `frame`. `euler_override` (degrees) replaces the
    /// rotation read from the transform. Returns the number of keys written;
    /// 0 when any gate fails.
    pub fn key_all_trs(
        &mut self,
        world: &dyn World,
        entity: EntityId,
        frame: Frame,
        euler_override: Option<[f32; 3]>,
    ) -> usize {
        let target = self.keying.target;
        if !target.accepts(entity) || !world.is_alive(entity) {
            return 0;
        }
        let Some(transform) = world.transform(entity) else {
            return 0;
        };
        let interpolation = self.cfg.default_interpolation;
        let Some(action) = self.actions.get_mut(target.action) else {
            debug!("key_all_trs: keying target {:?} does not resolve", target.action);
            return 0;
        };

        let mut pose = Pose::from_transform(transform);
        if let Some(euler) = euler_override {
            for (ch, v) in Channel::ROTATE.into_iter().zip(euler) {
                pose.set(ch, v);
            }
        }
        key_pose(action, &pose, frame, &self.keying, interpolation)
    }

    /// Auto-key hook for transform edits: keys at the current frame when auto-key is on.
    pub fn on_transform_edited(&mut self, world: &dyn World, entity: EntityId) -> usize {
        if !self.keying.auto_key {
            return 0;
        }
        self.key_all_trs(world, entity, self.frame, None)
    }

    // ---- persistence ----------------------------------------------------

    pub fn export_document(&self) -> AnimationDocument {
        AnimationDocument {
            fps: self.fps,
            frame: self.frame,
            clip: self.clip.clone(),
            actions: self.actions.clone(),
            strips: self.strips.clone(),
            keying: self.keying.clone(),
        }
    }

    /// Replace all animation state with `doc`. Playback pauses; nothing is evaluated.
    pub fn import_document(&mut self, doc: AnimationDocument) {
        self.set_fps(doc.fps);
        self.frame = doc.frame;
        self.accumulator = 0.0;
        self.playing = false;
        self.clip = doc.clip;
        self.actions = doc.actions;
        self.keying = doc.keying;
        self.ids.reset();
        for s in &doc.strips {
            self.ids.observe_strip(s.id);
            warn_degenerate_strip(s);
        }
        self.strips = doc.strips;
    }
}

enum Step {
    Advanced,
    /// Non-looping clip stopped at its last frame; `moved` if the frame changed.
    Ended { moved: bool },
}

fn sanitize_fps(fps: f32) -> Option<f32> {
    fps.is_finite().then(|| fps.max(1.0))
}

/// Reported once on insertion; evaluation substitutes 1.0 silently.
fn warn_degenerate_strip(strip: &NlaStrip) {
    if !nla::has_valid_time_scale(strip) {
        warn!(
            "strip {:?}: time scale {} will play at 1.0",
            strip.id, strip.time_scale
        );
    }
}
