//! Key minting.
//!
//! Every route entry and navigator gets a key when it is created. Keys come
//! from a [`KeyGenerator`]; the reducer always mints through a [`KeyRing`],
//! which knows every key already in the tree and refuses to hand out a
//! duplicate.
//!
//! ```
//! use navstate::{KeyGenerator, SequentialKeys};
//!
//! let mut keys = SequentialKeys::new();
//! assert_eq!(keys.mint("page"), "page-0");
//! assert_eq!(keys.mint("stack"), "stack-1");
//! ```

use crate::{error_log, NavigationState};
use std::collections::HashSet;
use uuid::Uuid;

/// Source of fresh keys.
pub trait KeyGenerator: Send {
    /// Produce a key for an entry or navigator whose name is `prefix`.
    fn mint(&mut self, prefix: &str) -> String;
}

/// Random keys: `<prefix>-<uuid v4>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeys;

impl KeyGenerator for UuidKeys {
    fn mint(&mut self, prefix: &str) -> String {
        format!("{}-{}", prefix, Uuid::new_v4())
    }
}

/// Deterministic keys: `<prefix>-<n>` with one counter shared across prefixes.
#[derive(Debug, Clone, Default)]
pub struct SequentialKeys {
    next: u64,
}

impl SequentialKeys {
    /// Start counting at zero.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyGenerator for SequentialKeys {
    fn mint(&mut self, prefix: &str) -> String {
        let key = format!("{}-{}", prefix, self.next);
        self.next += 1;
        key
    }
}

impl<G: KeyGenerator + ?Sized> KeyGenerator for Box<G> {
    fn mint(&mut self, prefix: &str) -> String {
        (**self).mint(prefix)
    }
}

/// Collision-checked minting against one tree.
pub struct KeyRing<'a> {
    generator: &'a mut dyn KeyGenerator,
    live: HashSet<String>,
}

impl<'a> KeyRing<'a> {
    /// Maximum attempts before giving up on a generator that keeps colliding.
    const MAX_ATTEMPTS: usize = 64;

    /// A ring seeded with every key in `state`.
    pub fn new(generator: &'a mut dyn KeyGenerator, state: &NavigationState) -> Self {
        Self {
            generator,
            live: state.collect_keys().into_iter().map(str::to_string).collect(),
        }
    }

    /// A ring with no existing keys, for building a fresh tree.
    pub fn empty(generator: &'a mut dyn KeyGenerator) -> Self {
        Self {
            generator,
            live: HashSet::new(),
        }
    }

    /// Mint a key that is not in use anywhere in the tree.
    pub fn mint(&mut self, prefix: &str) -> String {
        for _ in 0..Self::MAX_ATTEMPTS {
            let key = self.generator.mint(prefix);
            if self.live.insert(key.clone()) {
                return key;
            }
            error_log!("Minted key '{}' collides with an existing key, re-minting", key);
        }

        // the generator is broken; fall back to a random key that is checked too
        loop {
            let key = UuidKeys.mint(prefix);
            if self.live.insert(key.clone()) {
                return key;
            }
        }
    }

    /// Number of keys known to the ring.
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// `true` when the ring knows no keys.
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}
