//! Scene-graph contract consumed by the animation core.
//!
//! The host (editor, runtime, ECS adapter) implements [`World`] and passes it
//! into `AnimationSystem::tick`/`set_frame`. [`MemoryWorld`] is a small
//! implementation for tests and headless tools.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::ids::EntityId;

/// Local transform component of an entity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub translation: [f32; 3],
    /// Unit quaternion (x, y, z, w)
    pub rotation: [f32; 4],
    pub scale: [f32; 3],
    /// Set whenever the animation core writes this component.
    #[serde(default)]
    pub dirty: bool,
    /// The entity has animation bindings but none covers the current frame.
    /// Read by host render/camera-selection logic; never acted on here.
    #[serde(default)]
    pub disabled_by_animation: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            scale: [1.0; 3],
            dirty: false,
            disabled_by_animation: false,
        }
    }
}

/// Host scene graph. Lookups fail soft: a dead entity simply has no transform.
pub trait World {
    fn is_alive(&self, entity: EntityId) -> bool;
    fn transform(&self, entity: EntityId) -> Option<&Transform>;
    fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform>;
    /// Invalidate the cached world matrix of `entity`.
    fn mark_world_dirty(&mut self, entity: EntityId);
    /// All live entities.
    fn entities(&self) -> Vec<EntityId>;
}

#[derive(Clone, Debug, Default)]
struct Slot {
    transform: Transform,
    world_dirty: bool,
}

/// In-memory [`World`] keyed by entity id.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorld {
    next: u64,
    slots: HashMap<EntityId, Slot>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        self.slots.insert(
            id,
            Slot {
                transform,
                world_dirty: false,
            },
        );
        id
    }

    pub fn despawn(&mut self, entity: EntityId) -> Option<Transform> {
        self.slots.remove(&entity).map(|s| s.transform)
    }

    pub fn is_world_dirty(&self, entity: EntityId) -> bool {
        self.slots.get(&entity).is_some_and(|s| s.world_dirty)
    }

    /// Reset local and world dirty flags, as a host would after propagating transforms.
    pub fn clear_dirty(&mut self) {
        for slot in self.slots.values_mut() {
            slot.transform.dirty = false;
            slot.world_dirty = false;
        }
    }
}

impl World for MemoryWorld {
    fn is_alive(&self, entity: EntityId) -> bool {
        self.slots.contains_key(&entity)
    }

    fn transform(&self, entity: EntityId) -> Option<&Transform> {
        self.slots.get(&entity).map(|s| &s.transform)
    }

    fn transform_mut(&mut self, entity: EntityId) -> Option<&mut Transform> {
        self.slots.get_mut(&entity).map(|s| &mut s.transform)
    }

    fn mark_world_dirty(&mut self, entity: EntityId) {
        if let Some(slot) = self.slots.get_mut(&entity) {
            slot.world_dirty = true;
        }
    }

    fn entities(&self) -> Vec<EntityId> {
        let mut out: Vec<EntityId> = self.slots.keys().copied().collect();
        out.sort();
        out
    }
}
