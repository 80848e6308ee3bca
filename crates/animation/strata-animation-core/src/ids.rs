//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Handle of an entity owned by the host scene graph. Never owned here; always
/// validated through [`crate::world::World::is_alive`] before use.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// 1-based action identifier. `ActionId(0)` is the null id.
///
/// Ids are positions in the action list plus one and are never reused within a
/// session, so a stale id resolves to nothing instead of aliasing a newer action.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub u32);

impl ActionId {
    pub const NULL: ActionId = ActionId(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Index into the action list, or `None` for the null id.
    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        (self.0 as usize).checked_sub(1)
    }

    #[inline]
    pub(crate) fn from_index(index: usize) -> Self {
        ActionId(index as u32 + 1)
    }
}

impl Default for ActionId {
    fn default() -> Self {
        ActionId::NULL
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StripId(pub u32);

/// Grouping id letting one entity own several independent keyed ranges in a clip.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct BlockId(pub u32);

/// Monotonic allocator for StripId.
/// Ids are opaque externally and survive strip removal without reuse.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct IdAllocator {
    next_strip: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_strip(&mut self) -> StripId {
        let id = StripId(self.next_strip);
        self.next_strip = self.next_strip.wrapping_add(1);
        id
    }

    /// Make sure future allocations never collide with an id loaded from elsewhere.
    #[inline]
    pub fn observe_strip(&mut self, id: StripId) {
        if id.0 >= self.next_strip {
            self.next_strip = id.0.wrapping_add(1);
        }
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_monotonic() {
        let mut alloc = IdAllocator::new();
        assert_eq!(alloc.alloc_strip(), StripId(0));
        assert_eq!(alloc.alloc_strip(), StripId(1));
        alloc.observe_strip(StripId(7));
        assert_eq!(alloc.alloc_strip(), StripId(8));
        alloc.reset();
        assert_eq!(alloc.alloc_strip(), StripId(0));
    }

    #[test]
    fn action_id_is_one_based() {
        assert!(ActionId::NULL.is_null());
        assert_eq!(ActionId::NULL.index(), None);
        assert_eq!(ActionId::from_index(0), ActionId(1));
        assert_eq!(ActionId(3).index(), Some(2));
    }
}
