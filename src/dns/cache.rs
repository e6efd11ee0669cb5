//! Cache of completed host resolutions.
//!
//! Keyed by hostname, storing port-zero addresses with an expiry instant.
//! Roughly equivalent to net::HostCache, minus negative entries: only
//! successful resolutions are stored.

use crate::dns::request::AddressList;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Default maximum number of cached hosts.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone)]
struct CacheEntry {
    addresses: AddressList,
    expires: Instant,
}

#[derive(Debug)]
struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    max_entries: usize,
}

/// Shared, thread-safe host cache.
///
/// Clones are handles to the same cache, so the resolver can expose it to
/// the embedder while continuing to use it internally. Expired entries are
/// pruned lazily on lookup and insertion.
///
/// All time-sensitive methods take an explicit `now` so tests can fabricate
/// clocks; use [`Instant::now`] in production code.
#[derive(Debug, Clone)]
pub struct HostCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl HostCache {
    pub fn new() -> Self {
        Self::with_max_entries(DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: HashMap::new(),
                max_entries,
            })),
        }
    }

    /// Returns the cached addresses for `host` if present and not expired.
    ///
    /// Addresses are stored with port zero; apply the request port with
    /// [`AddressList::copy_with_port`].
    pub fn lookup(&self, host: &str, now: Instant) -> Option<AddressList> {
        let mut inner = self.inner.lock().unwrap();
        match inner.entries.get(host) {
            Some(entry) if entry.expires > now => Some(entry.addresses.clone()),
            Some(_) => {
                inner.entries.remove(host);
                None
            }
            None => None,
        }
    }

    /// Stores the addresses for `host`, valid for `ttl` from `now`.
    pub fn set(&self, host: impl Into<String>, addresses: AddressList, ttl: Duration, now: Instant) {
        let mut inner = self.inner.lock().unwrap();
        if inner.entries.len() >= inner.max_entries {
            inner.entries.retain(|_, entry| entry.expires > now);
        }
        if inner.entries.len() >= inner.max_entries {
            // Still full: make room by dropping the entry closest to expiry.
            let evict = inner
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.expires)
                .map(|(host, _)| host.clone());
            if let Some(host) = evict {
                inner.entries.remove(&host);
            }
        }
        inner.entries.insert(
            host.into(),
            CacheEntry {
                addresses,
                expires: now + ttl,
            },
        );
    }

    pub fn clear(&self) {
        self.inner.lock().unwrap().entries.clear();
    }

    /// Number of entries currently stored, including not-yet-pruned expired
    /// ones.
    pub fn size(&self) -> usize {
        self.inner.lock().unwrap().entries.len()
    }
}

impl Default for HostCache {
    fn default() -> Self {
        Self::new()
    }
}
