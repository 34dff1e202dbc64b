//! Plain, serialization-ready copy of a hostname database.
//!
//! Field names follow the JSON layout used on disk:
//!
//! ```json
//! {
//!   "nBits": 2,
//!   "hostnameIndex": [["example.com", 0], ["", 2]],
//!   "regexIndex": [["/^ads\\./", 3]],
//!   "slots": [4, 1, 9, 0, 1, 0, 12, 0],
//!   "strings": ["##.ad", "##.banner", "##.sponsor", "##.promo"],
//!   "count": 4
//! }
//! ```
//!
//! `slots` is the flattened `(value, next)` array and heads are slot indices.
//! Snapshots written before regex keys existed have no `regexIndex`; that
//! field, and a malformed one, both read as an empty regex index.

use std::io::{Read, Write};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{HostDbError, Result, SnapshotErrorKind};
use crate::slots::SlotStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Category bit width of the table that produced the snapshot
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_bits: Option<u8>,
    pub hostname_index: Vec<(String, u32)>,
    #[serde(default, deserialize_with = "lenient_pairs")]
    pub regex_index: Vec<(String, u32)>,
    pub slots: Vec<u32>,
    pub strings: Vec<Arc<str>>,
    pub count: usize,
}

fn lenient_pairs<'de, D>(deserializer: D) -> std::result::Result<Vec<(String, u32)>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybePairs {
        Pairs(Vec<(String, u32)>),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<MaybePairs>::deserialize(deserializer)? {
        Some(MaybePairs::Pairs(pairs)) => pairs,
        Some(MaybePairs::Other(_)) => {
            log::debug!("ignoring malformed regexIndex in snapshot");
            Vec::new()
        }
        None => Vec::new(),
    })
}

impl Snapshot {
    /// Check that the snapshot can be trusted by a table using `n_bits`.
    pub fn validate(&self, n_bits: u8) -> Result<()> {
        self.decode_slots(n_bits).map(|_| ())
    }

    /// Validate and rebuild the slot store.
    pub(crate) fn decode_slots(&self, n_bits: u8) -> Result<SlotStore> {
        if let Some(bits) = self.n_bits {
            if bits != n_bits {
                return Err(HostDbError::corrupt(
                    SnapshotErrorKind::BitWidthMismatch,
                    format!("snapshot uses {} category bits, table uses {}", bits, n_bits),
                ));
            }
        }

        let slots = SlotStore::from_flat(&self.slots)?;

        if self.count != slots.len() {
            return Err(HostDbError::corrupt(
                SnapshotErrorKind::CountMismatch,
                format!("count {} but {} slots", self.count, slots.len()),
            ));
        }

        if let Some(max) = slots.max_string_index(n_bits) {
            if max as usize >= self.strings.len() {
                return Err(HostDbError::corrupt(
                    SnapshotErrorKind::IndexOutOfRange,
                    format!(
                        "string index {} out of range ({} strings)",
                        max,
                        self.strings.len()
                    ),
                ));
            }
        }

        let heads = self
            .hostname_index
            .iter()
            .chain(self.regex_index.iter())
            .map(|(key, head)| (key.as_str(), *head));
        slots.check_chains(heads)?;

        Ok(slots)
    }

    /// Encode as JSON bytes
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode from JSON bytes. Does not validate; see [`validate`](Self::validate).
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer(writer, self)?;
        Ok(())
    }

    pub fn read_json<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}
