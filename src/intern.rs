//! String interning for stored values.
//!
//! Interned strings live in an append-only list and are referred to by their
//! position. A separate reverse map (`string -> position`) exists only to
//! deduplicate new inserts; it is transient and gets reclaimed once a burst of
//! inserts is over. Dropping it never invalidates a position, it only means a
//! value seen again later may be appended a second time.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;

use crate::scheduler::{IdleScheduler, TaskHandle};

/// Reverse-map state shared with the deferred reclamation task
#[derive(Default)]
struct LookupState {
    ids: HashMap<Arc<str>, u32>,
    pending: Option<PendingReclaim>,
    epoch: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingReclaim {
    epoch: u64,
    handle: Option<TaskHandle>,
}

/// Append-only string list with a reclaimable dedup map
pub struct StringTable {
    strings: Vec<Arc<str>>,
    lookup: Arc<Mutex<LookupState>>,
    scheduler: Arc<dyn IdleScheduler>,
    reclaim_delay: Duration,
}

impl StringTable {
    pub fn new(scheduler: Arc<dyn IdleScheduler>, reclaim_delay: Duration) -> Self {
        Self {
            strings: Vec::new(),
            lookup: Arc::new(Mutex::new(LookupState::default())),
            scheduler,
            reclaim_delay,
        }
    }

    /// Return the position of `value`, appending it if it is not known.
    ///
    /// Appending a new string requests a deferred reclamation unless one is
    /// already pending.
    pub fn intern(&mut self, value: &str) -> u32 {
        let id = {
            let mut state = self.lookup.lock();
            if let Some(&id) = state.ids.get(value) {
                return id;
            }
            let id = self.strings.len() as u32;
            let value: Arc<str> = Arc::from(value);
            self.strings.push(Arc::clone(&value));
            state.ids.insert(value, id);
            id
        };
        self.reclaim_later();
        id
    }

    pub fn get(&self, index: u32) -> Option<&Arc<str>> {
        self.strings.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    pub fn strings(&self) -> &[Arc<str>] {
        &self.strings
    }

    /// Number of entries currently held by the reverse map
    pub fn lookup_len(&self) -> usize {
        self.lookup.lock().ids.len()
    }

    pub fn reclaim_pending(&self) -> bool {
        self.lookup.lock().pending.is_some()
    }

    /// Cancel any deferred reclamation and empty the reverse map now.
    pub fn reclaim_now(&mut self) {
        let pending = {
            let mut state = self.lookup.lock();
            state.ids = HashMap::new();
            state.pending.take()
        };
        if let Some(handle) = pending.and_then(|p| p.handle) {
            self.scheduler.cancel(handle);
        }
    }

    /// Ask the scheduler to empty the reverse map once, unless already asked.
    pub fn reclaim_later(&mut self) {
        let epoch = {
            let mut state = self.lookup.lock();
            if state.pending.is_some() {
                return;
            }
            state.epoch += 1;
            let epoch = state.epoch;
            state.pending = Some(PendingReclaim {
                epoch,
                handle: None,
            });
            epoch
        };

        let weak: Weak<Mutex<LookupState>> = Arc::downgrade(&self.lookup);
        // The lock must not be held here: a scheduler may run the task inline.
        let handle = self.scheduler.schedule(
            Box::new(move || {
                if let Some(lookup) = weak.upgrade() {
                    let mut state = lookup.lock();
                    if matches!(state.pending, Some(p) if p.epoch == epoch) {
                        log::debug!("reclaiming {} interned lookup entries", state.ids.len());
                        state.ids = HashMap::new();
                        state.pending = None;
                    }
                }
            }),
            self.reclaim_delay,
        );

        let mut state = self.lookup.lock();
        match handle {
            Some(handle) => {
                if let Some(pending) = state.pending.as_mut() {
                    if pending.epoch == epoch {
                        pending.handle = Some(handle);
                    }
                }
            }
            // Refused: nothing will ever run, so nothing is pending.
            None => {
                if matches!(state.pending, Some(p) if p.epoch == epoch) {
                    state.pending = None;
                }
            }
        }
    }

    /// Replace the string list wholesale, dropping the reverse map.
    pub fn replace(&mut self, strings: Vec<Arc<str>>) {
        self.reclaim_now();
        self.strings = strings;
    }

    /// Drop every string and the reverse map, cancelling pending reclamation.
    pub fn clear(&mut self) {
        self.reclaim_now();
        self.strings = Vec::new();
    }
}
