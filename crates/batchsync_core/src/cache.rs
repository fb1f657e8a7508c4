use std::collections::BTreeMap;
use std::fmt;

use crate::{ApiError, Job, JobId};

/// What a cache entry holds: one job, or every job owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheKey {
    Job(JobId),
    JobList,
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Job(id) => write!(f, "job:{id}"),
            CacheKey::JobList => f.write_str("jobs"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedValue {
    Job(Job),
    List(Vec<Job>),
}

impl CachedValue {
    /// Jobs carried by this value, for transition detection.
    pub fn jobs(&self) -> &[Job] {
        match self {
            CachedValue::Job(job) => std::slice::from_ref(job),
            CachedValue::List(jobs) => jobs,
        }
    }
}

/// Proof that a fetch was issued. The generation is unique across the whole
/// cache, so a ticket never matches an entry created after it was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub key: CacheKey,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CacheEntry {
    value: Option<CachedValue>,
    last_error: Option<ApiError>,
    updated_at: Option<String>,
    fetching: bool,
    issued: u64,
    subscribers: usize,
}

impl CacheEntry {
    pub fn value(&self) -> Option<&CachedValue> {
        self.value.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.updated_at.as_deref()
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching
    }
}

/// How a resolved fetch was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// Result stored as the entry's current value.
    Applied,
    /// Fetch failed; the previous value was kept.
    Failed(ApiError),
    /// A newer fetch for the key was issued after this one.
    Stale,
    /// Nobody is subscribed to the key any more.
    Unsubscribed,
}

/// Keyed store of the latest fetched responses.
///
/// Tracks at most one outstanding poll per key and refuses writes from
/// fetches that were superseded or whose key was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusCache {
    entries: BTreeMap<CacheKey, CacheEntry>,
    next_generation: u64,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, key: &CacheKey) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn value(&self, key: &CacheKey) -> Option<&CachedValue> {
        self.entries.get(key).and_then(CacheEntry::value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CacheKey> {
        self.entries.keys()
    }

    pub fn is_subscribed(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Registers interest in `key`. Returns true when the entry is new and
    /// has to be fetched right away.
    pub fn subscribe(&mut self, key: CacheKey) -> bool {
        let entry = self.entries.entry(key).or_default();
        entry.subscribers += 1;
        entry.subscribers == 1 && entry.value.is_none() && !entry.fetching
    }

    /// Drops one subscriber. Returns true when that was the last one and the
    /// entry has been evicted.
    pub fn unsubscribe(&mut self, key: &CacheKey) -> bool {
        let Some(entry) = self.entries.get_mut(key) else {
            return false;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            self.entries.remove(key);
            true
        } else {
            false
        }
    }

    /// Issues a fetch for `key`.
    ///
    /// Poll ticks pass `force = false` and are skipped while a fetch is
    /// outstanding. Explicit refreshes force a new fetch, which supersedes
    /// the outstanding one.
    pub fn begin_fetch(&mut self, key: &CacheKey, force: bool) -> Option<FetchTicket> {
        let entry = self.entries.get_mut(key)?;
        if entry.fetching && !force {
            return None;
        }
        self.next_generation += 1;
        entry.fetching = true;
        entry.issued = self.next_generation;
        Some(FetchTicket {
            key: key.clone(),
            generation: self.next_generation,
        })
    }

    pub fn complete(
        &mut self,
        ticket: &FetchTicket,
        result: Result<CachedValue, ApiError>,
        received_at: &str,
    ) -> Completion {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return Completion::Unsubscribed;
        };
        if ticket.generation != entry.issued {
            return Completion::Stale;
        }
        entry.fetching = false;
        entry.updated_at = Some(received_at.to_string());
        match result {
            Ok(value) => {
                entry.value = Some(value);
                entry.last_error = None;
                Completion::Applied
            }
            Err(err) => {
                entry.last_error = Some(err.clone());
                Completion::Failed(err)
            }
        }
    }
}
