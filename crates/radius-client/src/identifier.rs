//! Packet identifier allocation
//!
//! Identifiers are scoped to a client instance. The sequential allocator
//! wraps from 255 back to 0.

use rand::Rng;
use std::sync::atomic::{AtomicU8, Ordering};

/// Source of packet identifiers for a client
pub trait IdentifierAllocator: Send + Sync {
    fn next_identifier(&self) -> u8;
}

/// Counter starting at a given value, wrapping at 255
#[derive(Debug, Default)]
pub struct SequentialIdentifiers {
    next: AtomicU8,
}

impl SequentialIdentifiers {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    pub fn starting_at(first: u8) -> Self {
        SequentialIdentifiers {
            next: AtomicU8::new(first),
        }
    }
}

impl IdentifierAllocator for SequentialIdentifiers {
    fn next_identifier(&self) -> u8 {
        // fetch_add wraps on overflow
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}

/// Uniformly random identifiers
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIdentifiers;

impl IdentifierAllocator for RandomIdentifiers {
    fn next_identifier(&self) -> u8 {
        rand::rng().random()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_wraps() {
        let ids = SequentialIdentifiers::starting_at(254);
        assert_eq!(ids.next_identifier(), 254);
        assert_eq!(ids.next_identifier(), 255);
        assert_eq!(ids.next_identifier(), 0);
        assert_eq!(ids.next_identifier(), 1);
    }

    #[test]
    fn test_sequential_covers_full_range() {
        let ids = SequentialIdentifiers::new();
        let seen: HashSet<u8> = (0..256).map(|_| ids.next_identifier()).collect();
        assert_eq!(seen.len(), 256);
    }

    #[test]
    fn test_allocators_are_independent() {
        let first = SequentialIdentifiers::new();
        let second = SequentialIdentifiers::new();
        first.next_identifier();
        first.next_identifier();
        assert_eq!(second.next_identifier(), 0);
    }

    #[test]
    fn test_random_identifiers_vary() {
        let ids = RandomIdentifiers;
        let seen: HashSet<u8> = (0..64).map(|_| ids.next_identifier()).collect();
        assert!(seen.len() > 1);
    }
}
