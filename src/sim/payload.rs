//! Arena for caller-owned body payloads
//!
//! Bodies are copied into every snapshot, so they carry a small `Copy` handle
//! instead of the payload itself. The arena outlives any snapshot that refers
//! to it; handles are never reused.

use serde::{Deserialize, Serialize};

/// Stable reference to a payload stored in a [`PayloadArena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PayloadHandle(u32);

impl PayloadHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Append-only payload storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadArena<T> {
    items: Vec<T>,
}

impl<T> Default for PayloadArena<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> PayloadArena<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a payload and return its handle
    pub fn insert(&mut self, item: T) -> PayloadHandle {
        let handle = PayloadHandle(self.items.len() as u32);
        self.items.push(item);
        handle
    }

    pub fn get(&self, handle: PayloadHandle) -> Option<&T> {
        self.items.get(handle.index())
    }

    pub fn get_mut(&mut self, handle: PayloadHandle) -> Option<&mut T> {
        self.items.get_mut(handle.index())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_stable() {
        let mut arena = PayloadArena::new();
        let a = arena.insert("cue ball");
        let b = arena.insert("eight ball");
        assert_ne!(a, b);
        assert_eq!(arena.get(a), Some(&"cue ball"));
        assert_eq!(arena.get(b), Some(&"eight ball"));
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_shared_handle_sees_mutation() {
        let mut arena = PayloadArena::new();
        let h = arena.insert(0u32);
        let copies = [h, h, h];
        if let Some(hits) = arena.get_mut(copies[0]) {
            *hits += 1;
        }
        assert_eq!(arena.get(copies[2]), Some(&1));
    }

    #[test]
    fn test_foreign_handle_misses() {
        let mut big = PayloadArena::new();
        big.insert(1);
        let h = big.insert(2);
        let small: PayloadArena<i32> = PayloadArena::new();
        assert!(small.get(h).is_none());
    }
}
