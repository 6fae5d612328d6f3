//! Prepared-statement registry with LRU eviction.
//!
//! Sessions key the registry by the exact command text. A single logical
//! command may prepare into several server-side statements (one per `;`
//! separated statement), so an entry holds the ordered handle list.
//!
//! When the registry is full, the least recently used entry is evicted;
//! the session should release evicted handles with COM_STMT_CLOSE.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::num::NonZeroUsize;

use lru::LruCache;

/// Default maximum number of cached command texts per session.
pub const DEFAULT_MAX_STATEMENTS: usize = 256;

/// A single server-side prepared statement handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreparedStatement {
    /// Server-assigned statement id.
    pub statement_id: u32,
    /// Number of parameter placeholders in this statement.
    pub parameter_count: u16,
    /// Number of result columns this statement produces.
    pub column_count: u16,
}

/// The prepared form of one logical command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedStatements {
    /// Handles in statement order.
    pub statements: Vec<PreparedStatement>,
}

impl PreparedStatements {
    /// Total parameter placeholders across all statements.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.statements
            .iter()
            .map(|s| usize::from(s.parameter_count))
            .sum()
    }
}

/// LRU registry of prepared statements keyed by command text.
pub struct StatementCache {
    cache: LruCache<u64, Entry>,
    hits: u64,
    misses: u64,
}

struct Entry {
    text: String,
    statements: PreparedStatements,
}

impl StatementCache {
    /// Create a registry with the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `max_size` is 0.
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "max_size must be greater than 0");
        Self {
            cache: LruCache::new(NonZeroUsize::new(max_size).expect("max_size > 0")),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a registry with the default capacity.
    #[must_use]
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_MAX_STATEMENTS)
    }

    /// Look up the prepared form of a command text, updating LRU order.
    pub fn get(&mut self, text: &str) -> Option<PreparedStatements> {
        let key = hash_text(text);
        match self.cache.get(&key) {
            Some(entry) if entry.text == text => {
                self.hits += 1;
                tracing::trace!(text, "statement registry hit");
                Some(entry.statements.clone())
            }
            _ => {
                self.misses += 1;
                tracing::trace!(text, "statement registry miss");
                None
            }
        }
    }

    /// Insert the prepared form of a command text.
    ///
    /// Returns the evicted entry's statements if capacity was reached, so
    /// the session can close the server-side handles.
    pub fn insert(&mut self, text: &str, statements: PreparedStatements) -> Option<PreparedStatements> {
        tracing::debug!(
            text,
            statements = statements.statements.len(),
            "caching prepared command"
        );
        let evicted = if self.cache.len() >= self.cache.cap().get() {
            self.cache.pop_lru().map(|(_, entry)| entry.statements)
        } else {
            None
        };
        self.cache.put(
            hash_text(text),
            Entry {
                text: text.to_string(),
                statements,
            },
        );
        evicted
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Number of lookup hits.
    #[must_use]
    pub fn hits(&self) -> u64 {
        self.hits
    }

    /// Number of lookup misses.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.misses
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::with_default_size()
    }
}

impl std::fmt::Debug for StatementCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementCache")
            .field("len", &self.cache.len())
            .field("hits", &self.hits)
            .field("misses", &self.misses)
            .finish()
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}
