use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use courtcast_api::{ConferenceApi, ConferenceDetails};
use courtcast_core::domain::Conference;
use courtcast_core::ids::ConferenceId;

use crate::error::DispatchError;

/// In-memory store of conference aggregates. The only shared mutable
/// state in the hub. Writes are whole-aggregate replacements; entries
/// live until explicitly evicted (no TTL).
pub struct ConferenceCache {
    entries: DashMap<ConferenceId, Arc<Conference>>,
}

impl ConferenceCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Pure lookup, no I/O.
    pub fn get(&self, id: &ConferenceId) -> Option<Arc<Conference>> {
        self.entries.get(id).map(|e| Arc::clone(e.value()))
    }

    /// Build a Conference from fetched details and store it, replacing
    /// any prior entry for that id.
    pub fn add(&self, details: ConferenceDetails) -> Arc<Conference> {
        let conference = Arc::new(Conference::from(details));
        self.entries
            .insert(conference.id.clone(), Arc::clone(&conference));
        conference
    }

    /// Evict an entry. Used when a hearing closes.
    pub fn remove(&self, id: &ConferenceId) {
        self.entries.remove(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ConferenceCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch-through resolution over the cache: lookup, on miss fetch the
/// full details from the conference API and populate.
///
/// Misses for the same id are collapsed into a single in-flight fetch:
/// concurrent callers queue on a per-key gate and re-check the cache
/// once the winner has populated it.
pub struct ConferenceResolver {
    cache: Arc<ConferenceCache>,
    api: Arc<dyn ConferenceApi>,
    in_flight: DashMap<ConferenceId, Arc<Mutex<()>>>,
}

impl ConferenceResolver {
    pub fn new(cache: Arc<ConferenceCache>, api: Arc<dyn ConferenceApi>) -> Self {
        Self {
            cache,
            api,
            in_flight: DashMap::new(),
        }
    }

    pub fn cache(&self) -> &ConferenceCache {
        &self.cache
    }

    /// Resolve a conference by id, fetching on miss. An id unknown to
    /// both the cache and the upstream API is `ConferenceNotFound`.
    pub async fn resolve(&self, id: &ConferenceId) -> Result<Arc<Conference>, DispatchError> {
        if let Some(conference) = self.cache.get(id) {
            return Ok(conference);
        }

        let gate = self
            .in_flight
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = gate.lock().await;

        // A concurrent resolve may have populated while we waited.
        if let Some(conference) = self.cache.get(id) {
            drop(guard);
            self.in_flight.remove(id);
            return Ok(conference);
        }

        tracing::debug!(conference_id = %id, "Cache miss, fetching conference details");
        let result = match self.api.conference_details(id).await {
            Ok(details) => Ok(self.cache.add(details)),
            Err(err) => Err(DispatchError::from(err)),
        };

        drop(guard);
        self.in_flight.remove(id);
        result
    }

    /// Evict and re-fetch: used when an authoritative change (status
    /// transition, booking edit) invalidates the cached aggregate.
    pub async fn refresh(&self, id: &ConferenceId) -> Result<Arc<Conference>, DispatchError> {
        self.cache.remove(id);
        self.resolve(id).await
    }

    /// Evict without re-fetching. Used when a hearing closes.
    pub fn evict(&self, id: &ConferenceId) {
        self.cache.remove(id);
    }
}
