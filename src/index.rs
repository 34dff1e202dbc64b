//! Key index: maps keys to the head slot of their chain.
//!
//! Hostname keys and regex keys live in separate namespaces. A key whose first
//! character is `/` is a regex key, written `/pattern/`.

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use regex::Regex;

/// Whether `key` names a regex rather than a hostname
#[inline]
pub fn is_regex_key(key: &str) -> bool {
    key.starts_with('/')
}

/// A regex key with its lazily compiled pattern
#[derive(Debug)]
pub struct RegexKey {
    source: String,
    head: u32,
    compiled: OnceCell<Result<Regex, regex::Error>>,
}

impl RegexKey {
    pub fn new(source: impl Into<String>, head: u32) -> Self {
        Self {
            source: source.into(),
            head,
            compiled: OnceCell::new(),
        }
    }

    /// The key as stored, delimiters included
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn head(&self) -> u32 {
        self.head
    }

    /// The pattern between the delimiters
    pub fn pattern(&self) -> &str {
        let inner = self.source.strip_prefix('/').unwrap_or(&self.source);
        inner.strip_suffix('/').unwrap_or(inner)
    }

    /// Compile on first use; the outcome (including failure) is kept.
    pub fn compiled(&self) -> Result<&Regex, &regex::Error> {
        self.compiled
            .get_or_init(|| Regex::new(self.pattern()))
            .as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get().is_some()
    }
}

#[derive(Debug, Default)]
pub struct KeyIndex {
    hostnames: HashMap<String, u32>,
    regexes: Vec<RegexKey>,
    regex_positions: HashMap<String, usize>,
}

impl KeyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Head slot of the chain for `key`, in the key's own namespace
    pub fn head(&self, key: &str) -> Option<u32> {
        if is_regex_key(key) {
            self.regex_positions
                .get(key)
                .map(|&pos| self.regexes[pos].head)
        } else {
            self.hostnames.get(key).copied()
        }
    }

    /// Head slot for a literal hostname (the empty string is the generic key)
    #[inline]
    pub fn hostname_head(&self, hostname: &str) -> Option<u32> {
        self.hostnames.get(hostname).copied()
    }

    /// Register a new chain head for `key`. The key must not exist yet.
    pub fn insert(&mut self, key: &str, head: u32) {
        if is_regex_key(key) {
            debug_assert!(!self.regex_positions.contains_key(key));
            self.regex_positions.insert(key.to_string(), self.regexes.len());
            self.regexes.push(RegexKey::new(key, head));
        } else {
            debug_assert!(!self.hostnames.contains_key(key));
            self.hostnames.insert(key.to_string(), head);
        }
    }

    /// Regex keys in insertion order
    pub fn regex_keys(&self) -> &[RegexKey] {
        &self.regexes
    }

    pub fn hostname_count(&self) -> usize {
        self.hostnames.len()
    }

    pub fn regex_count(&self) -> usize {
        self.regexes.len()
    }

    /// Hostname keys ordered by head slot, which is key creation order
    pub fn hostname_pairs(&self) -> Vec<(String, u32)> {
        let mut pairs: Vec<(String, u32)> = self
            .hostnames
            .iter()
            .map(|(key, &head)| (key.clone(), head))
            .collect();
        pairs.sort_unstable_by_key(|&(_, head)| head);
        pairs
    }

    /// Regex keys in insertion order
    pub fn regex_pairs(&self) -> Vec<(String, u32)> {
        self.regexes
            .iter()
            .map(|r| (r.source.clone(), r.head))
            .collect()
    }

    /// Every `(key, head)` pair across both namespaces
    pub fn heads(&self) -> impl Iterator<Item = (&str, u32)> {
        self.hostnames
            .iter()
            .map(|(key, &head)| (key.as_str(), head))
            .chain(self.regexes.iter().map(|r| (r.source.as_str(), r.head)))
    }

    /// Rebuild from pair lists. Later duplicates of a key win.
    pub fn from_pairs(hostnames: Vec<(String, u32)>, regexes: Vec<(String, u32)>) -> Self {
        let mut index = Self {
            hostnames: hostnames.into_iter().collect(),
            regexes: Vec::with_capacity(regexes.len()),
            regex_positions: HashMap::with_capacity(regexes.len()),
        };
        for (source, head) in regexes {
            let existing = index.regex_positions.get(&source).copied();
            match existing {
                Some(pos) => index.regexes[pos] = RegexKey::new(source, head),
                None => {
                    index
                        .regex_positions
                        .insert(source.clone(), index.regexes.len());
                    index.regexes.push(RegexKey::new(source, head));
                }
            }
        }
        index
    }

    pub fn clear(&mut self) {
        self.hostnames = HashMap::new();
        self.regexes = Vec::new();
        self.regex_positions = HashMap::new();
    }
}
