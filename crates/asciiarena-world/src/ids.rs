//! Per-arena entity id allocation.

use std::collections::BTreeSet;

use asciiarena_protocol::EntityId;

/// Hands out [`EntityId`]s for one arena.
///
/// Ids are assigned in increasing order. An id comes back into circulation
/// only after [`release`](Self::release), and the smallest released id is
/// reused first, so ids stay small in long rounds with many spells.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: u32,
    released: BTreeSet<u32>,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        if let Some(id) = self.released.pop_first() {
            return EntityId(id);
        }
        let id = self.next;
        self.next += 1;
        EntityId(id)
    }

    /// Returns `id` to the pool. Releasing an id that is not in use is
    /// ignored.
    pub fn release(&mut self, id: EntityId) {
        if id.0 < self.next {
            self.released.insert(id.0);
        }
    }

    /// Number of ids currently handed out.
    pub fn in_use(&self) -> usize {
        self.next as usize - self.released.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        let allocated: Vec<u32> = (0..4).map(|_| ids.allocate().0).collect();
        assert_eq!(allocated, vec![0, 1, 2, 3]);
        assert_eq!(ids.in_use(), 4);
    }

    #[test]
    fn test_released_ids_are_reused_smallest_first() {
        let mut ids = IdAllocator::new();
        for _ in 0..4 {
            ids.allocate();
        }
        ids.release(EntityId(2));
        ids.release(EntityId(1));
        assert_eq!(ids.in_use(), 2);

        assert_eq!(ids.allocate(), EntityId(1));
        assert_eq!(ids.allocate(), EntityId(2));
        assert_eq!(ids.allocate(), EntityId(4));
    }

    #[test]
    fn test_release_of_unissued_id_is_ignored() {
        let mut ids = IdAllocator::new();
        ids.release(EntityId(10));
        assert_eq!(ids.allocate(), EntityId(0));
    }
}
