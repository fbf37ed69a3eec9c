//! Generation-checked slot storage for shapes, groups and physics objects.

use shatter_core::types::{GroupId, ShapeId};

/// A handle made of a slot index and the slot generation it was issued for.
pub trait Handle: Copy + Eq {
    fn from_parts(index: u32, generation: u32) -> Self;
    fn index(&self) -> u32;
    fn generation(&self) -> u32;
}

impl Handle for ShapeId {
    fn from_parts(index: u32, generation: u32) -> Self {
        ShapeId { index, generation }
    }
    fn index(&self) -> u32 {
        self.index
    }
    fn generation(&self) -> u32 {
        self.generation
    }
}

impl Handle for GroupId {
    fn from_parts(index: u32, generation: u32) -> Self {
        GroupId { index, generation }
    }
    fn index(&self) -> u32 {
        self.index
    }
    fn generation(&self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Slot arena. Removing a value bumps its slot's generation, so handles to
/// it stop resolving even after the slot is reused.
#[derive(Debug, Clone)]
pub struct Arena<H, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
    _handle: std::marker::PhantomData<H>,
}

impl<H: Handle, T> Default for Arena<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Handle, T> Arena<H, T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            _handle: std::marker::PhantomData,
        }
    }

    /// Store a value built from its own handle.
    pub fn insert_with(&mut self, build: impl FnOnce(H) -> T) -> H {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        let handle = H::from_parts(index, slot.generation);
        slot.value = Some(build(handle));
        self.len += 1;
        handle
    }

    pub fn insert(&mut self, value: T) -> H {
        self.insert_with(|_| value)
    }

    pub fn get(&self, handle: H) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: H) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|s| s.generation == handle.generation())
            .and_then(|s| s.value.as_mut())
    }

    pub fn contains(&self, handle: H) -> bool {
        self.get(handle).is_some()
    }

    pub fn remove(&mut self, handle: H) -> Option<T> {
        let slot = self.slots.get_mut(handle.index() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Live entries in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (H, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.value
                .as_ref()
                .map(|v| (H::from_parts(i as u32, s.generation), v))
        })
    }

    pub fn handles(&self) -> Vec<H> {
        self.iter().map(|(h, _)| h).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_handle_does_not_resolve() {
        let mut arena: Arena<ShapeId, &str> = Arena::new();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"));
        let b = arena.insert("b");
        assert_eq!(a.index, b.index, "slot is reused");
        assert!(arena.get(a).is_none(), "old generation must not alias the new value");
        assert_eq!(arena.get(b), Some(&"b"));
        assert!(arena.remove(a).is_none());
    }

    #[test]
    fn test_insert_with_sees_own_handle() {
        let mut arena: Arena<GroupId, GroupId> = Arena::new();
        let id = arena.insert_with(|h| h);
        assert_eq!(arena.get(id), Some(&id));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn test_iter_skips_free_slots() {
        let mut arena: Arena<ShapeId, u32> = Arena::new();
        let ids: Vec<ShapeId> = (0..4).map(|i| arena.insert(i)).collect();
        arena.remove(ids[1]);
        let values: Vec<u32> = arena.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0, 2, 3]);
        assert_eq!(arena.handles().len(), 3);
    }
}
