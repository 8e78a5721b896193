//! Per-key query cache and the crash-data queries built on it.
//!
//! A [`QueryCache`] holds the latest known state for each key. Every fetch
//! takes a [`FetchTicket`]; starting a newer fetch for the same key, or
//! invalidating the key, retires older tickets. A result delivered with a
//! retired ticket is discarded, so a slow response can never overwrite a
//! newer one. Nothing is retried automatically.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::client::{ForensicClient, DEFAULT_CUSTODY_SAMPLE};
use crate::error::{FetchError, FetchResult};
use crate::models::{CrashEvent, CrashFilters, EvidenceCustodyLog, ReportData, ReportType};

/// Loading / error / data tri-state handed to presentation.
#[derive(Debug)]
pub enum QueryState<V> {
    /// Never requested, or invalidated.
    Idle,
    Loading,
    Error(Arc<FetchError>),
    Data(Arc<V>),
}

impl<V> Clone for QueryState<V> {
    fn clone(&self) -> Self {
        match self {
            QueryState::Idle => QueryState::Idle,
            QueryState::Loading => QueryState::Loading,
            QueryState::Error(e) => QueryState::Error(Arc::clone(e)),
            QueryState::Data(v) => QueryState::Data(Arc::clone(v)),
        }
    }
}

impl<V> QueryState<V> {
    pub fn is_loading(&self) -> bool {
        matches!(self, QueryState::Loading)
    }

    pub fn data(&self) -> Option<&Arc<V>> {
        match self {
            QueryState::Data(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            QueryState::Error(e) => Some(e),
            _ => None,
        }
    }

    /// True when presentation should offer a retry affordance.
    pub fn can_retry(&self) -> bool {
        self.error().is_some_and(FetchError::is_retryable)
    }

    fn from_result(result: FetchResult<V>) -> Self {
        match result {
            Ok(v) => QueryState::Data(Arc::new(v)),
            Err(e) => QueryState::Error(Arc::new(e)),
        }
    }
}

/// Proof of an in-flight fetch for one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<K> {
    key: K,
    generation: u64,
}

impl<K> FetchTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of delivering a result to the cache.
#[derive(Debug)]
pub enum Applied<V> {
    /// The ticket was current; the cache now holds this state.
    Current(QueryState<V>),
    /// A newer fetch or an invalidation retired the ticket; the result was dropped.
    Stale,
}

#[derive(Debug)]
struct Entry<V> {
    generation: u64,
    state: QueryState<V>,
}

#[derive(Debug)]
struct Inner<K, V> {
    next_generation: u64,
    entries: HashMap<K, Entry<V>>,
}

#[derive(Debug)]
pub struct QueryCache<K, V> {
    inner: Mutex<Inner<K, V>>,
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                next_generation: 0,
                entries: HashMap::new(),
            }),
        }
    }

    // A panic while holding the lock leaves the map consistent (every write is a
    // single insert/remove), so a poisoned lock is safe to keep using.
    fn lock(&self) -> MutexGuard<'_, Inner<K, V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, key: &K) -> QueryState<V> {
        self.lock()
            .entries
            .get(key)
            .map(|entry| entry.state.clone())
            .unwrap_or(QueryState::Idle)
    }

    pub fn data(&self, key: &K) -> Option<Arc<V>> {
        self.state(key).data().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Marks `key` as loading and returns a ticket that supersedes any earlier one.
    pub fn begin(&self, key: K) -> FetchTicket<K> {
        let mut inner = self.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;
        inner.entries.insert(
            key.clone(),
            Entry {
                generation,
                state: QueryState::Loading,
            },
        );
        FetchTicket { key, generation }
    }

    pub fn is_current(&self, ticket: &FetchTicket<K>) -> bool {
        self.lock()
            .entries
            .get(&ticket.key)
            .is_some_and(|entry| entry.generation == ticket.generation)
    }

    /// Stores `result` if `ticket` is still the newest fetch for its key.
    pub fn complete(&self, ticket: FetchTicket<K>, result: FetchResult<V>) -> Applied<V> {
        let mut inner = self.lock();
        match inner.entries.get_mut(&ticket.key) {
            Some(entry) if entry.generation == ticket.generation => {
                entry.state = QueryState::from_result(result);
                Applied::Current(entry.state.clone())
            }
            _ => {
                warn!(
                    "Discarding stale result for {:?} (generation {})",
                    ticket.key, ticket.generation
                );
                Applied::Stale
            }
        }
    }

    /// Drops the cached state for `key` and retires its in-flight ticket.
    pub fn invalidate(&self, key: &K) {
        self.lock().entries.remove(key);
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Returns cached data for `key`, fetching it first if nothing is cached.
    ///
    /// Errors are not cached as final: a key whose last fetch failed is fetched again.
    pub async fn fetch<F>(&self, key: K, fetcher: F) -> QueryState<V>
    where
        F: Future<Output = FetchResult<V>>,
    {
        if let QueryState::Data(data) = self.state(&key) {
            debug!("Query cache hit for {:?}", key);
            return QueryState::Data(data);
        }
        self.refetch(key, fetcher).await
    }

    /// Always fetches, superseding any in-flight fetch for `key`.
    ///
    /// If this fetch is itself superseded before it resolves, the state owned
    /// by the newer fetch is returned instead of this fetch's result.
    pub async fn refetch<F>(&self, key: K, fetcher: F) -> QueryState<V>
    where
        F: Future<Output = FetchResult<V>>,
    {
        let ticket = self.begin(key.clone());
        let result = fetcher.await;
        match self.complete(ticket, result) {
            Applied::Current(state) => state,
            Applied::Stale => self.state(&key),
        }
    }
}

// ===== CRASH DATA QUERIES =====

/// Cached queries over a [`ForensicClient`], one cache per resource kind.
///
/// Owned by a view; dropping it drops every cached value.
#[derive(Debug)]
pub struct CrashQueries {
    client: ForensicClient,
    crashes: QueryCache<CrashFilters, Vec<CrashEvent>>,
    crash: QueryCache<String, CrashEvent>,
    custody: QueryCache<String, Vec<EvidenceCustodyLog>>,
    all_custody: QueryCache<u32, Vec<EvidenceCustodyLog>>,
    reports: QueryCache<ReportType, ReportData>,
}

impl CrashQueries {
    pub fn new(client: ForensicClient) -> Self {
        Self {
            client,
            crashes: QueryCache::new(),
            crash: QueryCache::new(),
            custody: QueryCache::new(),
            all_custody: QueryCache::new(),
            reports: QueryCache::new(),
        }
    }

    pub fn client(&self) -> &ForensicClient {
        &self.client
    }

    pub async fn crashes(&self, filters: &CrashFilters) -> QueryState<Vec<CrashEvent>> {
        self.crashes
            .fetch(filters.clone(), self.client.get_crashes(filters))
            .await
    }

    pub async fn refetch_crashes(&self, filters: &CrashFilters) -> QueryState<Vec<CrashEvent>> {
        self.crashes
            .refetch(filters.clone(), self.client.get_crashes(filters))
            .await
    }

    /// Full detail for one crash. An empty id is a disabled query and stays `Idle`.
    pub async fn crash(&self, event_id: &str) -> QueryState<CrashEvent> {
        if event_id.is_empty() {
            return QueryState::Idle;
        }
        self.crash
            .fetch(event_id.to_string(), self.client.get_crash(event_id))
            .await
    }

    pub async fn refetch_crash(&self, event_id: &str) -> QueryState<CrashEvent> {
        if event_id.is_empty() {
            return QueryState::Idle;
        }
        self.crash
            .refetch(event_id.to_string(), self.client.get_crash(event_id))
            .await
    }

    pub async fn custody_chain(&self, event_id: &str) -> QueryState<Vec<EvidenceCustodyLog>> {
        if event_id.is_empty() {
            return QueryState::Idle;
        }
        self.custody
            .fetch(event_id.to_string(), self.client.get_custody_chain(event_id))
            .await
    }

    pub async fn all_custody_logs(&self) -> QueryState<Vec<EvidenceCustodyLog>> {
        self.all_custody
            .fetch(
                DEFAULT_CUSTODY_SAMPLE,
                self.client.get_all_custody_logs(DEFAULT_CUSTODY_SAMPLE),
            )
            .await
    }

    /// Recent cached report of `report_type`, generated on demand.
    pub async fn report(&self, report_type: ReportType) -> QueryState<ReportData> {
        self.reports
            .fetch(report_type, self.client.get_report(report_type))
            .await
    }

    pub async fn refetch_report(&self, report_type: ReportType) -> QueryState<ReportData> {
        self.reports
            .refetch(report_type, self.client.get_report(report_type))
            .await
    }

    /// Forgets a crash list so the next read fetches again (filters changed on the server side).
    pub fn invalidate_crashes(&self, filters: &CrashFilters) {
        self.crashes.invalidate(filters);
    }

    pub fn invalidate_all(&self) {
        self.crashes.clear();
        self.crash.clear();
        self.custody.clear();
        self.all_custody.clear();
        self.reports.clear();
    }
}
