use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::error::HostDbError;

/// Which parts of the matching walk a retrieval runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RetrievalModifiers {
    /// Specific, generic and regex-keyed entries
    #[default]
    All = 0,
    /// Only entries stored under a suffix of the hostname
    SpecificOnly = 1,
    /// Only entries stored under the empty (generic) key
    GenericOnly = 2,
    /// Specific and generic entries, plus regex-keyed entries
    RegexOnly = 3,
}

impl RetrievalModifiers {
    /// Whether the walk visits the empty key once labels run out
    pub fn visits_generic(&self) -> bool {
        !matches!(self, RetrievalModifiers::SpecificOnly)
    }

    /// Whether regex keys are scanned after the suffix walk
    pub fn visits_regex(&self) -> bool {
        matches!(self, RetrievalModifiers::All | RetrievalModifiers::RegexOnly)
    }
}

impl TryFrom<u8> for RetrievalModifiers {
    type Error = HostDbError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::All),
            1 => Ok(Self::SpecificOnly),
            2 => Ok(Self::GenericOnly),
            3 => Ok(Self::RegexOnly),
            other => Err(HostDbError::InvalidModifiers(other)),
        }
    }
}

/// A string index packed together with its category bits.
///
/// Layout: `(string_index << n_bits) | category_bits`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EncodedValue(pub u32);

impl EncodedValue {
    #[inline]
    pub fn encode(string_index: u32, category_bits: u32, n_bits: u8) -> Self {
        debug_assert!(
            category_bits < (1u32 << n_bits),
            "category bits {category_bits} do not fit in {n_bits} bits"
        );
        debug_assert!(
            string_index <= (u32::MAX >> n_bits),
            "string index {string_index} overflows the encoding"
        );
        Self((string_index << n_bits) | category_bits)
    }

    #[inline]
    pub fn string_index(&self, n_bits: u8) -> u32 {
        self.0 >> n_bits
    }

    #[inline]
    pub fn category_bits(&self, n_bits: u8) -> u32 {
        self.0 & ((1u32 << n_bits) - 1)
    }

    /// Bucket position for an output collection of `mask + 1` buckets
    #[inline]
    pub fn bucket(&self, mask: usize) -> usize {
        self.0 as usize & mask
    }
}

/// Output collection receiving matched strings during retrieval.
pub trait Bucket {
    fn add(&mut self, value: &Arc<str>);
}

impl Bucket for Vec<Arc<str>> {
    fn add(&mut self, value: &Arc<str>) {
        self.push(Arc::clone(value));
    }
}

impl Bucket for Vec<String> {
    fn add(&mut self, value: &Arc<str>) {
        self.push(value.to_string());
    }
}

impl Bucket for HashSet<Arc<str>> {
    fn add(&mut self, value: &Arc<str>) {
        self.insert(Arc::clone(value));
    }
}

impl Bucket for HashSet<String> {
    fn add(&mut self, value: &Arc<str>) {
        if !self.contains(&**value) {
            self.insert(value.to_string());
        }
    }
}

impl Bucket for BTreeSet<Arc<str>> {
    fn add(&mut self, value: &Arc<str>) {
        self.insert(Arc::clone(value));
    }
}

impl Bucket for BTreeSet<String> {
    fn add(&mut self, value: &Arc<str>) {
        if !self.contains(&**value) {
            self.insert(value.to_string());
        }
    }
}
