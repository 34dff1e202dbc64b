//! Hostname matching over the key index.
//!
//! A query walks up the domain hierarchy of the hostname, one lookup per
//! level, and ends at the empty key which holds generic entries:
//!
//! ```text
//! a.b.example.com -> b.example.com -> example.com -> com -> ""
//! ```
//!
//! Regex keys cannot be indexed by suffix, so they are scanned linearly after
//! the walk, and only when the modifiers ask for them.

use crate::error::{HostDbError, Result};
use crate::index::KeyIndex;
use crate::intern::StringTable;
use crate::slots::SlotStore;
use crate::types::{Bucket, RetrievalModifiers};

/// Sequence of keys looked up for a hostname.
///
/// Each step strips the leftmost label. Once no dot is left, the walk moves
/// to the generic key `""` unless the modifiers exclude generic entries.
#[derive(Debug, Clone)]
pub struct SuffixWalk<'a> {
    next_key: Option<&'a str>,
    visit_generic: bool,
}

impl<'a> SuffixWalk<'a> {
    pub fn new(hostname: &'a str, modifiers: RetrievalModifiers) -> Self {
        let start = match modifiers {
            RetrievalModifiers::GenericOnly => "",
            _ => hostname,
        };
        Self {
            next_key: Some(start),
            visit_generic: modifiers.visits_generic(),
        }
    }
}

impl<'a> Iterator for SuffixWalk<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next_key?;
        self.next_key = if current.is_empty() {
            None
        } else {
            match current.find('.') {
                Some(pos) => Some(&current[pos + 1..]),
                None if self.visit_generic => Some(""),
                None => None,
            }
        };
        Some(current)
    }
}

/// Read-only view over the table parts a retrieval needs
pub(crate) struct Matcher<'a> {
    pub index: &'a KeyIndex,
    pub slots: &'a SlotStore,
    pub strings: &'a StringTable,
    pub n_bits: u8,
}

impl Matcher<'_> {
    /// Deposit every value matching `hostname` into `buckets`.
    ///
    /// A regex key that fails to compile is skipped. The failure is reported
    /// by the retrieval that first compiles the key, once all other matching
    /// is done; later retrievals skip the key silently.
    pub fn retrieve<B: Bucket>(
        &self,
        hostname: &str,
        buckets: &mut [B],
        modifiers: RetrievalModifiers,
    ) -> Result<()> {
        debug_assert!(
            buckets.len().is_power_of_two(),
            "bucket count {} is not a power of two",
            buckets.len()
        );
        debug_assert!(
            buckets.len() <= 1usize << self.n_bits,
            "bucket count {} exceeds the {} category bits",
            buckets.len(),
            self.n_bits
        );
        if buckets.is_empty() {
            return Ok(());
        }
        let mask = buckets.len() - 1;

        for key in SuffixWalk::new(hostname, modifiers) {
            if let Some(head) = self.index.hostname_head(key) {
                self.deposit(head, buckets, mask);
            }
        }

        if !modifiers.visits_regex() {
            return Ok(());
        }

        let mut first_error = None;
        for key in self.index.regex_keys() {
            let fresh = !key.is_compiled();
            match key.compiled() {
                Ok(re) => {
                    if re.is_match(hostname) {
                        self.deposit(key.head(), buckets, mask);
                    }
                }
                Err(e) if fresh => {
                    log::warn!("invalid regex key {}: {}", key.source(), e);
                    if first_error.is_none() {
                        first_error = Some(HostDbError::InvalidPattern {
                            pattern: key.pattern().to_string(),
                            source: e.clone(),
                        });
                    }
                }
                Err(_) => {}
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn deposit<B: Bucket>(&self, head: u32, buckets: &mut [B], mask: usize) {
        for value in self.slots.chain(head) {
            if let Some(s) = self.strings.get(value.string_index(self.n_bits)) {
                buckets[value.bucket(mask)].add(s);
            }
        }
    }
}
