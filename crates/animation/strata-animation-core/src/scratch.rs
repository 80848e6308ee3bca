//! Scratch buffers reused across evaluation passes.

use hashbrown::HashMap;

use crate::config::Config;
use crate::ids::EntityId;

#[derive(Debug, Default)]
pub struct Scratch {
    /// Active strip indices grouped by target entity.
    pub groups: HashMap<EntityId, Vec<usize>>,
    /// Entities in first-seen order, so passes run deterministically.
    pub order: Vec<EntityId>,
}

impl Scratch {
    pub fn new(cfg: &Config) -> Self {
        Self {
            groups: HashMap::with_capacity(cfg.scratch_entities),
            order: Vec::with_capacity(cfg.scratch_entities),
        }
    }

    /// Clear per-pass contents. Lists of entities active in the previous pass
    /// keep their allocation; entities idle for a whole pass are evicted.
    #[inline]
    pub fn begin_frame(&mut self) {
        self.groups.retain(|_, list| {
            let active = !list.is_empty();
            list.clear();
            active
        });
        self.order.clear();
    }

    #[inline]
    pub fn push(&mut self, entity: EntityId, strip_index: usize) {
        let list = self.groups.entry(entity).or_default();
        if list.is_empty() {
            self.order.push(entity);
        }
        list.push(strip_index);
    }
}
