//! ext-hostname-db - compact hostname-to-selector store for content blockers
//!
//! This library stores category-tagged strings (typically cosmetic filter
//! selectors) under hostname keys and answers "which strings apply to this
//! hostname" with one map lookup per domain label:
//! - Domain-suffix lookup (`example.com` entries apply to `www.example.com`)
//! - Generic entries under the empty key, applying to every hostname
//! - Regex keys (`/pattern/`) scanned as a slower fallback
//! - String interning with idle-time reclamation of the dedup map
//! - Snapshot / restore for persistence
//!
//! # Example
//!
//! ```rust
//! use ext_hostname_db::{HostnameDb, RetrievalModifiers};
//!
//! // 1 category bit: 0 = hide, 1 = exception
//! let mut db = HostnameDb::new(1);
//! db.store("example.com", 0, "##.ad-banner");
//! db.store("", 0, "##.sponsored");
//! db.store("www.example.com", 1, "##.ad-banner");
//! db.store("/^ads\\./", 0, "##.popup");
//!
//! let mut buckets: Vec<Vec<String>> = vec![Vec::new(); 2];
//! db.retrieve("www.example.com", &mut buckets, RetrievalModifiers::All)
//!     .unwrap();
//!
//! assert_eq!(buckets[0], vec!["##.ad-banner", "##.sponsored"]);
//! assert_eq!(buckets[1], vec!["##.ad-banner"]);
//!
//! // Persist and reload
//! let bytes = db.serialize().to_json().unwrap();
//! let snapshot = ext_hostname_db::Snapshot::from_json(&bytes).unwrap();
//! let restored = HostnameDb::from_snapshot(1, snapshot).unwrap();
//! assert_eq!(restored.len(), db.len());
//! ```
//!
//! # Keys
//!
//! | Key | Example | Applies to |
//! |-----|---------|------------|
//! | Hostname | `example.com` | `example.com` and all its subdomains |
//! | Generic | `""` | every hostname |
//! | Regex | `/^ads\./` | hostnames matching the pattern |
//!
//! # Retrieval Modifiers
//!
//! - `All` - hostname, generic and regex entries
//! - `SpecificOnly` - hostname entries only
//! - `GenericOnly` - generic entries only
//! - `RegexOnly` - the full walk plus regex entries

pub mod db;
pub mod error;
pub mod index;
pub mod intern;
pub mod matcher;
pub mod scheduler;
pub mod slots;
pub mod snapshot;
pub mod types;

// Re-export commonly used items
pub use db::{HostnameDb, HostnameDbOptions, DEFAULT_RECLAIM_DELAY, MAX_CATEGORY_BITS};
pub use error::{HostDbError, Result, SnapshotErrorKind};
pub use matcher::SuffixWalk;
pub use snapshot::Snapshot;
pub use types::{Bucket, EncodedValue, RetrievalModifiers};

// Re-export scheduler types
#[cfg(feature = "async")]
pub use scheduler::TokioScheduler;
pub use scheduler::{IdleScheduler, IdleTask, ManualScheduler, NilScheduler, TaskHandle};
