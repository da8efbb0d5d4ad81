//! Append-only Arena
//!
//! Backing storage for the document tree. Slots are never reused, so an
//! `Idx` handed out once stays valid for the lifetime of the arena; nodes
//! that are unlinked from the tree simply become unreachable.

use std::fmt;
use std::marker::PhantomData;

/// Stable handle into an [`Arena`].
pub struct Idx<T> {
    raw: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Idx<T> {
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw, _marker: PhantomData }
    }

    pub const fn raw(self) -> u32 {
        self.raw
    }

    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

// Manual impls: derives would put bounds on `T`.
impl<T> Clone for Idx<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Idx<T> {}

impl<T> PartialEq for Idx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl<T> Eq for Idx<T> {}

impl<T> PartialOrd for Idx<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Idx<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.raw.cmp(&other.raw)
    }
}

impl<T> std::hash::Hash for Idx<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl<T> fmt::Debug for Idx<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idx({})", self.raw)
    }
}

pub struct Arena<T> {
    items: Vec<T>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            items: Vec::with_capacity(cap),
        }
    }

    pub fn alloc(&mut self, value: T) -> Idx<T> {
        let raw = u32::try_from(self.items.len()).unwrap_or(u32::MAX);
        self.items.push(value);
        Idx::from_raw(raw)
    }

    pub fn get(&self, id: Idx<T>) -> Option<&T> {
        self.items.get(id.index())
    }

    pub fn get_mut(&mut self, id: Idx<T>) -> Option<&mut T> {
        self.items.get_mut(id.index())
    }

    pub fn contains(&self, id: Idx<T>) -> bool {
        id.index() < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over every slot in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (Idx<T>, &T)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, v)| (Idx::from_raw(i as u32), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_get() {
        let mut arena = Arena::new();
        let a = arena.alloc("head");
        let b = arena.alloc("body");
        assert_eq!(arena.get(a), Some(&"head"));
        assert_eq!(arena.get(b), Some(&"body"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn indices_are_sequential_and_stable() {
        let mut arena = Arena::with_capacity(4);
        let ids: Vec<_> = (0..4).map(|i| arena.alloc(i * 10)).collect();
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
        arena.alloc(99);
        assert_eq!(arena.get(ids[2]), Some(&20));
    }

    #[test]
    fn get_mut_modifies_in_place() {
        let mut arena = Arena::new();
        let id = arena.alloc(vec![1, 2]);
        arena.get_mut(id).unwrap().push(3);
        assert_eq!(arena.get(id).unwrap(), &vec![1, 2, 3]);
    }

    #[test]
    fn out_of_range() {
        let arena: Arena<i32> = Arena::new();
        let bad = Idx::from_raw(7);
        assert!(!arena.contains(bad));
        assert_eq!(arena.get(bad), None);
        assert!(arena.is_empty());
    }

    #[test]
    fn iteration_follows_allocation_order() {
        let mut arena = Arena::new();
        arena.alloc('a');
        arena.alloc('b');
        arena.alloc('c');
        let seen: String = arena.iter().map(|(_, c)| *c).collect();
        assert_eq!(seen, "abc");
    }

    #[test]
    fn idx_is_copy_and_ordered() {
        let mut arena = Arena::new();
        let a = arena.alloc(());
        let b = arena.alloc(());
        let copied = a;
        assert_eq!(copied, a);
        assert!(a < b);
        assert_eq!(format!("{b:?}"), "Idx(1)");
    }
}
