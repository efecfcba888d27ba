//! # Triage Cache
//!
//! In-memory result cache for merged evidence bundles, with TTL-based
//! lazy expiry, user-driven exclusion tracking and the accuracy report
//! derived from both.
//!
//! All reads and writes go through a single mutual-exclusion lock: the
//! bundle store, the exclusion membership set and the exclusion metadata
//! are one shared state, and serializing them together prevents lost
//! updates under concurrent requests for the same incident id.

#![warn(missing_debug_implementations, rust_2018_idioms, unreachable_pub)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use triage_core::evidence::{EvidenceBundle, EvidenceSource};

/// Merged per-source evidence for one incident.
pub type EvidenceMap = HashMap<EvidenceSource, EvidenceBundle>;

/// Metadata recorded when a user excludes an evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExclusionRecord {
    /// Composite item id (`source:item_id`).
    pub composite_id: String,
    /// Source the item came from.
    pub source: EvidenceSource,
    /// Item type label (e.g. "incident", "document", "log").
    pub item_type: String,
    /// Optional user-supplied reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// When the exclusion was recorded.
    pub excluded_at: DateTime<Utc>,
}

/// Per-source row of the accuracy report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAccuracy {
    /// Source this row covers.
    pub source: EvidenceSource,
    /// Human-readable category name.
    pub category: String,
    /// Items returned by this source across non-expired cache entries.
    pub total_items_returned: usize,
    /// Items of this source excluded by users.
    pub total_items_excluded: usize,
    /// `(returned - excluded) / returned * 100`; 100 when nothing returned.
    pub accuracy_score: f64,
}

/// Retrieval accuracy report across all evidence sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// One row per evidence source.
    pub categories: Vec<SourceAccuracy>,
    /// Accuracy over all sources combined.
    pub overall_accuracy: f64,
    /// Total excluded items.
    pub total_exclusions: usize,
    /// Total returned items across non-expired entries.
    pub total_items_returned: usize,
}

struct CachedEvidence {
    bundles: EvidenceMap,
    expires_at: Instant,
}

impl CachedEvidence {
    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CachedEvidence>,
    /// incident id -> excluded composite ids
    excluded: HashMap<String, HashSet<String>>,
    /// (incident id, composite id) -> exclusion metadata
    exclusion_meta: HashMap<(String, String), ExclusionRecord>,
}

/// Result cache with TTL expiry and exclusion tracking.
pub struct ResultCache {
    state: Mutex<CacheState>,
    default_ttl: Duration,
}

impl std::fmt::Debug for ResultCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultCache")
            .field("default_ttl", &self.default_ttl)
            .finish()
    }
}

fn accuracy(returned: usize, excluded: usize) -> f64 {
    if returned == 0 {
        return 100.0;
    }
    (returned.saturating_sub(excluded)) as f64 / returned as f64 * 100.0
}

impl ResultCache {
    /// Create a cache with the given default TTL.
    pub fn new(default_ttl: Duration) -> Self {
        info!(ttl_secs = default_ttl.as_secs(), "Result cache initialized");
        Self {
            state: Mutex::new(CacheState::default()),
            default_ttl,
        }
    }

    /// Create a cache with the 300 s default TTL.
    pub fn with_defaults() -> Self {
        Self::new(Duration::from_secs(triage_core::config::DEFAULT_CACHE_TTL_SECS))
    }

    /// Get the cached evidence for an incident.
    ///
    /// Expired entries are deleted on access and treated as a miss.
    pub fn get(&self, incident_id: &str) -> Option<EvidenceMap> {
        let mut state = self.state.lock().unwrap();
        match state.entries.get(incident_id) {
            Some(entry) if !entry.is_expired() => {
                debug!(incident_id, "Cache hit");
                Some(entry.bundles.clone())
            }
            Some(_) => {
                debug!(incident_id, "Cache entry expired");
                state.entries.remove(incident_id);
                None
            }
            None => {
                debug!(incident_id, "Cache miss");
                None
            }
        }
    }

    /// Store evidence for an incident with the default TTL.
    pub fn set(&self, incident_id: &str, bundles: EvidenceMap) {
        self.set_with_ttl(incident_id, bundles, self.default_ttl);
    }

    /// Store evidence for an incident with a custom TTL.
    pub fn set_with_ttl(&self, incident_id: &str, bundles: EvidenceMap, ttl: Duration) {
        let mut state = self.state.lock().unwrap();
        state.entries.insert(
            incident_id.to_string(),
            CachedEvidence {
                bundles,
                expires_at: Instant::now() + ttl,
            },
        );
        debug!(incident_id, ttl_secs = ttl.as_secs(), "Evidence cached");
    }

    /// Drop the cached evidence for one incident.
    pub fn invalidate(&self, incident_id: &str) {
        let mut state = self.state.lock().unwrap();
        if state.entries.remove(incident_id).is_some() {
            info!(incident_id, "Cache invalidated");
        }
    }

    /// Clear all cached evidence *and* all exclusion state.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        let count = state.entries.len();
        state.entries.clear();
        state.excluded.clear();
        state.exclusion_meta.clear();
        info!(removed = count, "Cache cleared");
    }

    /// Batch-evict expired entries. Expiry is otherwise lazy.
    pub fn cleanup_expired(&self) {
        let mut state = self.state.lock().unwrap();
        let before = state.entries.len();
        state.entries.retain(|_, entry| !entry.is_expired());
        let evicted = before - state.entries.len();
        if evicted > 0 {
            info!(evicted, "Expired cache entries cleaned up");
        }
    }

    /// Number of stored (possibly expired) entries.
    pub fn len(&self) -> usize {
        self.state.lock().unwrap().entries.len()
    }

    /// Whether the bundle store is empty.
    pub fn is_empty(&self) -> bool {
        self.state.lock().unwrap().entries.is_empty()
    }

    // -------------------------------------------------------------------
    // Exclusion tracking
    // -------------------------------------------------------------------

    /// Record a user exclusion of one evidence item.
    ///
    /// Idempotent: re-adding an excluded item replaces its metadata.
    pub fn add_excluded(
        &self,
        incident_id: &str,
        composite_id: &str,
        source: EvidenceSource,
        item_type: &str,
        reason: Option<&str>,
    ) {
        let mut state = self.state.lock().unwrap();
        state
            .excluded
            .entry(incident_id.to_string())
            .or_default()
            .insert(composite_id.to_string());
        state.exclusion_meta.insert(
            (incident_id.to_string(), composite_id.to_string()),
            ExclusionRecord {
                composite_id: composite_id.to_string(),
                source,
                item_type: item_type.to_string(),
                reason: reason.map(str::to_string),
                excluded_at: Utc::now(),
            },
        );
        debug!(incident_id, composite_id, %source, "Evidence item excluded");
    }

    /// Remove an exclusion: membership and metadata go together.
    pub fn remove_excluded(&self, incident_id: &str, composite_id: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(set) = state.excluded.get_mut(incident_id) {
            set.remove(composite_id);
            if set.is_empty() {
                state.excluded.remove(incident_id);
            }
        }
        state
            .exclusion_meta
            .remove(&(incident_id.to_string(), composite_id.to_string()));
        debug!(incident_id, composite_id, "Evidence item exclusion removed");
    }

    /// Whether an item is excluded for an incident.
    pub fn is_excluded(&self, incident_id: &str, composite_id: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .excluded
            .get(incident_id)
            .map(|set| set.contains(composite_id))
            .unwrap_or(false)
    }

    /// Excluded composite ids for an incident, sorted for stable output.
    pub fn list_excluded(&self, incident_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        let mut ids: Vec<String> = state
            .excluded
            .get(incident_id)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// The metadata recorded for one exclusion, if present.
    pub fn exclusion_record(&self, incident_id: &str, composite_id: &str) -> Option<ExclusionRecord> {
        self.state
            .lock()
            .unwrap()
            .exclusion_meta
            .get(&(incident_id.to_string(), composite_id.to_string()))
            .cloned()
    }

    // -------------------------------------------------------------------
    // Aggregates and accuracy
    // -------------------------------------------------------------------

    /// Exclusion counts per source, across all incidents.
    pub fn exclusion_counts_by_source(&self) -> HashMap<EvidenceSource, usize> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<EvidenceSource, usize> = HashMap::new();
        for record in state.exclusion_meta.values() {
            *counts.entry(record.source).or_insert(0) += 1;
        }
        counts
    }

    /// Items returned per source, scanning only non-expired cache entries.
    pub fn items_returned_by_source(&self) -> HashMap<EvidenceSource, usize> {
        let state = self.state.lock().unwrap();
        let mut counts: HashMap<EvidenceSource, usize> = HashMap::new();
        for entry in state.entries.values() {
            if entry.is_expired() {
                continue;
            }
            for (source, bundle) in &entry.bundles {
                *counts.entry(*source).or_insert(0) += bundle.len();
            }
        }
        counts
    }

    /// Build the retrieval accuracy report.
    ///
    /// Per source: `accuracy = (returned - excluded) / returned * 100`,
    /// defined as 100 when nothing was returned.
    pub fn accuracy_report(&self) -> AccuracyReport {
        let returned = self.items_returned_by_source();
        let excluded = self.exclusion_counts_by_source();

        let mut categories = Vec::with_capacity(EvidenceSource::ALL.len());
        let mut total_returned = 0;
        let mut total_excluded = 0;

        for source in EvidenceSource::ALL {
            let r = returned.get(&source).copied().unwrap_or(0);
            let e = excluded.get(&source).copied().unwrap_or(0);
            total_returned += r;
            total_excluded += e;
            categories.push(SourceAccuracy {
                source,
                category: source.category().to_string(),
                total_items_returned: r,
                total_items_excluded: e,
                accuracy_score: accuracy(r, e),
            });
        }

        AccuracyReport {
            categories,
            overall_accuracy: accuracy(total_returned, total_excluded),
            total_exclusions: total_excluded,
            total_items_returned: total_returned,
        }
    }
}
