//! Slot chain storage.
//!
//! Every value set is a singly-linked chain threaded through one flat,
//! append-only array of `(value, next)` slots. A `next` of `0` terminates the
//! chain. Slot `0` can still be a live slot: it is the head of the first chain
//! ever created, and no `next` pointer can target it, since links are only
//! ever set to the array length before a push, which is positive from the
//! second push onwards.

use crate::error::{HostDbError, Result, SnapshotErrorKind};
use crate::types::EncodedValue;

/// End-of-chain marker for `Slot::next`
pub const END_OF_CHAIN: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Slot {
    pub value: u32,
    pub next: u32,
}

#[derive(Debug, Clone, Default)]
pub struct SlotStore {
    slots: Vec<Slot>,
}

impl SlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Slot> {
        self.slots.get(index as usize)
    }

    /// Start a new chain holding `value`. Returns its head index.
    pub fn push_chain(&mut self, value: EncodedValue) -> u32 {
        let head = self.slots.len() as u32;
        self.slots.push(Slot {
            value: value.0,
            next: END_OF_CHAIN,
        });
        head
    }

    /// Append `value` at the tail of the chain starting at `head`.
    /// Returns the index of the new slot.
    pub fn append(&mut self, head: u32, value: EncodedValue) -> u32 {
        let mut tail = head as usize;
        while self.slots[tail].next != END_OF_CHAIN {
            tail = self.slots[tail].next as usize;
        }
        let index = self.push_chain(value);
        self.slots[tail].next = index;
        index
    }

    /// Iterate the values of the chain starting at `head`, in insertion order
    pub fn chain(&self, head: u32) -> Chain<'_> {
        Chain {
            slots: &self.slots,
            cursor: Some(head),
        }
    }

    /// Flatten to `[value, next, value, next, ...]`
    pub fn to_flat(&self) -> Vec<u32> {
        let mut flat = Vec::with_capacity(self.slots.len() * 2);
        for slot in &self.slots {
            flat.push(slot.value);
            flat.push(slot.next);
        }
        flat
    }

    /// Rebuild from the flat form produced by [`to_flat`](Self::to_flat)
    pub fn from_flat(flat: &[u32]) -> Result<Self> {
        if flat.len() % 2 != 0 {
            return Err(HostDbError::corrupt(
                SnapshotErrorKind::Malformed,
                format!("slot array has odd length {}", flat.len()),
            ));
        }
        let slots = flat
            .chunks_exact(2)
            .map(|pair| Slot {
                value: pair[0],
                next: pair[1],
            })
            .collect();
        Ok(Self { slots })
    }

    /// Check that every chain reachable from `heads` stays in range and
    /// terminates, and that no two chains share a slot.
    pub fn check_chains<'a>(&self, heads: impl IntoIterator<Item = (&'a str, u32)>) -> Result<()> {
        let mut visited = vec![false; self.slots.len()];

        for (key, head) in heads {
            if head as usize >= self.slots.len() {
                return Err(HostDbError::corrupt(
                    SnapshotErrorKind::IndexOutOfRange,
                    format!("head {} of key {:?} is out of range", head, key),
                ));
            }

            let mut index = head as usize;
            loop {
                if visited[index] {
                    return Err(HostDbError::corrupt(
                        SnapshotErrorKind::Cycle,
                        format!("chain of key {:?} revisits slot {}", key, index),
                    ));
                }
                visited[index] = true;

                let next = self.slots[index].next;
                if next == END_OF_CHAIN {
                    break;
                }
                if next as usize >= self.slots.len() {
                    return Err(HostDbError::corrupt(
                        SnapshotErrorKind::IndexOutOfRange,
                        format!("slot {} links to out-of-range slot {}", index, next),
                    ));
                }
                index = next as usize;
            }
        }

        Ok(())
    }

    /// Largest string index referenced by any slot
    pub fn max_string_index(&self, n_bits: u8) -> Option<u32> {
        self.slots
            .iter()
            .map(|slot| EncodedValue(slot.value).string_index(n_bits))
            .max()
    }

    pub fn clear(&mut self) {
        self.slots = Vec::new();
    }
}

/// Iterator over the encoded values of one chain
pub struct Chain<'a> {
    slots: &'a [Slot],
    cursor: Option<u32>,
}

impl Iterator for Chain<'_> {
    type Item = EncodedValue;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.cursor?;
        let slot = self.slots.get(index as usize)?;
        self.cursor = (slot.next != END_OF_CHAIN).then_some(slot.next);
        Some(EncodedValue(slot.value))
    }
}
