//! Hostname database.
//!
//! Ties the string table, slot store and key index together behind the
//! store / retrieve / snapshot interface.

use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::index::KeyIndex;
use crate::intern::StringTable;
use crate::matcher::Matcher;
use crate::scheduler::{IdleScheduler, NilScheduler};
use crate::slots::SlotStore;
use crate::snapshot::Snapshot;
use crate::types::{Bucket, EncodedValue, RetrievalModifiers};

/// Default soft deadline for deferred reclamation of the intern lookup map
pub const DEFAULT_RECLAIM_DELAY: Duration = Duration::from_secs(5);

/// Largest supported category bit width
pub const MAX_CATEGORY_BITS: u8 = 31;

/// Hostname database options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameDbOptions {
    /// Width of the category tag packed next to each string index
    pub n_bits: u8,
    /// Soft deadline handed to the idle scheduler for reclamation
    pub reclaim_delay: Duration,
}

impl Default for HostnameDbOptions {
    fn default() -> Self {
        Self {
            n_bits: 0,
            reclaim_delay: DEFAULT_RECLAIM_DELAY,
        }
    }
}

impl HostnameDbOptions {
    /// Create options for the given category bit width.
    pub fn new(n_bits: u8) -> Self {
        Self {
            n_bits,
            ..Self::default()
        }
    }

    /// Set the reclamation deadline.
    pub fn with_reclaim_delay(mut self, delay: Duration) -> Self {
        self.reclaim_delay = delay;
        self
    }
}

/// Hostname-keyed store of category-tagged strings.
///
/// Single writer: mutation takes `&mut self`. Retrieval takes `&self`; the
/// only interior mutability is the per-key compiled regex cache.
pub struct HostnameDb {
    n_bits: u8,
    strings: StringTable,
    slots: SlotStore,
    index: KeyIndex,
    count: usize,
}

impl HostnameDb {
    /// Create an empty database without a scheduler. Deferred reclamation
    /// requests are refused, so only `reclaim(true)` empties the lookup map.
    pub fn new(n_bits: u8) -> Self {
        Self::with_options(HostnameDbOptions::new(n_bits))
    }

    pub fn with_options(options: HostnameDbOptions) -> Self {
        Self::with_scheduler(options, Arc::new(NilScheduler))
    }

    /// Create an empty database reclaiming through `scheduler`.
    pub fn with_scheduler(options: HostnameDbOptions, scheduler: Arc<dyn IdleScheduler>) -> Self {
        debug_assert!(
            options.n_bits <= MAX_CATEGORY_BITS,
            "n_bits {} exceeds {}",
            options.n_bits,
            MAX_CATEGORY_BITS
        );
        Self {
            n_bits: options.n_bits,
            strings: StringTable::new(scheduler, options.reclaim_delay),
            slots: SlotStore::new(),
            index: KeyIndex::new(),
            count: 0,
        }
    }

    /// Create a database hydrated from `snapshot`.
    pub fn from_snapshot(n_bits: u8, snapshot: Snapshot) -> Result<Self> {
        let mut db = Self::new(n_bits);
        db.restore(snapshot)?;
        Ok(db)
    }

    /// Store `value` under `key` with the given category bits.
    ///
    /// `key` is a hostname, `""` for generic entries, or `/pattern/` for a
    /// regex key. Values for an existing key keep their insertion order.
    pub fn store(&mut self, key: &str, category_bits: u32, value: &str) {
        self.count += 1;
        let string_index = self.strings.intern(value);
        let encoded = EncodedValue::encode(string_index, category_bits, self.n_bits);

        match self.index.head(key) {
            Some(head) => {
                self.slots.append(head, encoded);
            }
            None => {
                let head = self.slots.push_chain(encoded);
                self.index.insert(key, head);
                log::trace!("new chain for key {:?} at slot {}", key, head);
            }
        }
    }

    /// Deposit every string applying to `hostname` into `buckets`.
    ///
    /// `buckets.len()` must be a power of two no larger than `2^n_bits`; the
    /// low bits of each value's category select its bucket. Fails with
    /// `InvalidPattern` when a regex key fails its first compile, after all
    /// other matches have been deposited.
    pub fn retrieve<B: Bucket>(
        &self,
        hostname: &str,
        buckets: &mut [B],
        modifiers: RetrievalModifiers,
    ) -> Result<()> {
        Matcher {
            index: &self.index,
            slots: &self.slots,
            strings: &self.strings,
            n_bits: self.n_bits,
        }
        .retrieve(hostname, buckets, modifiers)
    }

    /// Reclaim the intern lookup map, now or at the scheduler's convenience.
    pub fn reclaim(&mut self, immediate: bool) {
        if immediate {
            self.strings.reclaim_now();
        } else {
            self.strings.reclaim_later();
        }
    }

    /// Drop everything. Any pending deferred reclamation is cancelled.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing hostname db ({} entries, {} strings)",
            self.count,
            self.strings.len()
        );
        self.strings.clear();
        self.slots.clear();
        self.index.clear();
        self.count = 0;
    }

    pub fn serialize(&self) -> Snapshot {
        Snapshot {
            n_bits: Some(self.n_bits),
            hostname_index: self.index.hostname_pairs(),
            regex_index: self.index.regex_pairs(),
            slots: self.slots.to_flat(),
            strings: self.strings.strings().to_vec(),
            count: self.count,
        }
    }

    /// Replace the whole state with `snapshot` after validating it.
    ///
    /// On error the database is left untouched.
    pub fn restore(&mut self, snapshot: Snapshot) -> Result<()> {
        let slots = snapshot.decode_slots(self.n_bits)?;
        log::debug!(
            "restoring hostname db: {} hostname keys, {} regex keys, {} entries",
            snapshot.hostname_index.len(),
            snapshot.regex_index.len(),
            snapshot.count
        );
        self.index = KeyIndex::from_pairs(snapshot.hostname_index, snapshot.regex_index);
        self.slots = slots;
        self.strings.replace(snapshot.strings);
        self.count = snapshot.count;
        Ok(())
    }

    /// Run the snapshot integrity checks against the live state
    pub fn verify(&self) -> Result<()> {
        self.serialize().validate(self.n_bits)
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn n_bits(&self) -> u8 {
        self.n_bits
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn hostname_key_count(&self) -> usize {
        self.index.hostname_count()
    }

    pub fn regex_key_count(&self) -> usize {
        self.index.regex_count()
    }

    /// Whether a deferred reclamation is waiting on the scheduler
    pub fn reclaim_pending(&self) -> bool {
        self.strings.reclaim_pending()
    }
}

impl Default for HostnameDb {
    fn default() -> Self {
        Self::with_options(HostnameDbOptions::default())
    }
}
