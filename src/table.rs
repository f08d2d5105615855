//! Fixed-capacity name → value table used for request and response headers.
//!
//! Every key maps to exactly one slot (`djb2(key) % capacity`). Slots only
//! hold values: [`FieldTable::get`] returns whatever occupies the bucket of the
//! requested key, and a second key landing on an occupied bucket is rejected
//! and counted as a collision. [`FieldTable::get_exact`] is the verified
//! lookup for callers that must not be handed another key's value.

use std::fmt;

use crate::buffer::Token;
use crate::error::Error;

pub const DEFAULT_SLOTS: usize = 256;

/// djb2 string hash (`hash * 33 + byte`, seeded with 5381).
pub fn djb2(bytes: &[u8]) -> u64 {
    bytes.iter().fold(5381u64, |hash, &b| {
        hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(u64::from(b))
    })
}

pub struct FieldTable {
    slots: Vec<Option<Token>>,
    /// Stored keys in insertion order, with the slot each one owns.
    keys: Vec<(Token, usize)>,
    collisions: usize,
}

impl FieldTable {
    pub fn new() -> Result<Self, Error> {
        Self::with_capacity(DEFAULT_SLOTS)
    }

    /// Preallocates `capacity` empty slots. Zero selects [`DEFAULT_SLOTS`].
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        let capacity = if capacity == 0 { DEFAULT_SLOTS } else { capacity };

        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize(capacity, None);

        Ok(Self {
            slots,
            keys: Vec::new(),
            collisions: 0,
        })
    }

    fn slot_of(&self, key: &[u8]) -> usize {
        (djb2(key) % self.slots.len() as u64) as usize
    }

    /// Stores `value` under `key` unless the key's slot is already taken.
    ///
    /// Returns `false` when the pair was rejected; the existing value is kept
    /// and the collision counter goes up by one.
    pub fn add(&mut self, key: Token, value: Token) -> bool {
        let idx = self.slot_of(key.as_bytes());
        if self.slots[idx].is_some() {
            self.collisions += 1;
            tracing::debug!(key = %key, slot = idx, "field table collision, pair dropped");
            return false;
        }

        self.slots[idx] = Some(value);
        self.keys.push((key, idx));
        true
    }

    /// Value currently held in the bucket of `key`. The stored entry's key is
    /// not compared against `key`.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Option<&Token> {
        self.slots[self.slot_of(key.as_ref())].as_ref()
    }

    /// Value stored for exactly `key`, if that key was inserted.
    pub fn get_exact(&self, key: impl AsRef<[u8]>) -> Option<&Token> {
        let key = key.as_ref();
        self.keys
            .iter()
            .find(|(stored, _)| stored.as_bytes() == key)
            .and_then(|(_, idx)| self.slots[*idx].as_ref())
    }

    /// Stored pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &Token)> {
        self.keys
            .iter()
            .filter_map(|(key, idx)| self.slots[*idx].as_ref().map(|value| (key, value)))
    }

    /// Releases every stored key and value. Capacity and the collision count stay.
    pub fn clear(&mut self) {
        for (_, idx) in self.keys.drain(..) {
            self.slots[idx] = None;
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn collisions(&self) -> usize {
        self.collisions
    }
}

impl fmt::Debug for FieldTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
