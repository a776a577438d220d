//! Lookup lifecycle.
//!
//! A lookup stores its report with the placeholder narrative before any
//! enrichment starts, then a single background task attaches the narrative.
//! The narrative is written at most once per lookup, tracked by a flag on
//! the entry rather than by inspecting the narrative text.

use crate::models::CredibilityReport;
use crate::narrative::NarrativeEnricher;
use crate::scoring::generate_report;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

struct LookupEntry {
    report: CredibilityReport,
    enriched: bool,
}

#[derive(Clone)]
pub struct LookupStore {
    entries: Cache<Uuid, Arc<RwLock<LookupEntry>>>,
}

impl LookupStore {
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            entries: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    /// Stores a report under a fresh lookup id.
    pub async fn insert(&self, report: CredibilityReport) -> Uuid {
        let id = Uuid::new_v4();
        let entry = LookupEntry {
            report,
            enriched: false,
        };
        self.entries.insert(id, Arc::new(RwLock::new(entry))).await;
        id
    }

    /// Snapshot of the current report for `id`.
    pub async fn get(&self, id: &Uuid) -> Option<CredibilityReport> {
        let entry = self.entries.get(id).await?;
        let entry = entry.read().await;
        Some(entry.report.clone())
    }

    /// Attaches `narrative` unless the lookup has already been enriched.
    ///
    /// Returns false when the lookup is unknown, expired, or already enriched.
    pub async fn apply_narrative(&self, id: &Uuid, narrative: String) -> bool {
        let Some(entry) = self.entries.get(id).await else {
            tracing::debug!("Lookup {} expired before narrative arrived", id);
            return false;
        };

        let mut entry = entry.write().await;
        if entry.enriched {
            tracing::debug!("Lookup {} already has a narrative, ignoring update", id);
            return false;
        }

        entry.report = entry.report.clone().with_explanation(narrative);
        entry.enriched = true;
        true
    }
}

impl Default for LookupStore {
    /// 30 minute TTL, 10k lookups.
    fn default() -> Self {
        Self::new(Duration::from_secs(1800), 10_000)
    }
}

/// Scores `gstin`, stores the report, and spawns its enrichment.
///
/// The returned report carries the placeholder narrative and is already
/// readable through `store.get(id)`. The handle resolves to whether the
/// narrative was applied.
pub async fn start_lookup(
    store: &LookupStore,
    enricher: &NarrativeEnricher,
    gstin: &str,
) -> (Uuid, CredibilityReport, JoinHandle<bool>) {
    let report = generate_report(gstin);
    let id = store.insert(report.clone()).await;
    tracing::info!(
        "Lookup {} created for {} (score {}, {})",
        id,
        gstin,
        report.overall_score,
        report.risk_level
    );

    let task_store = store.clone();
    let task_enricher = enricher.clone();
    let task_report = report.clone();
    let handle = tokio::spawn(async move {
        let narrative = task_enricher.enrich(&task_report).await;
        let applied = task_store.apply_narrative(&id, narrative).await;
        tracing::debug!("Lookup {} narrative applied: {}", id, applied);
        applied
    });

    (id, report, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{FALLBACK_EXPLANATION, PENDING_EXPLANATION};
    use crate::narrative::UnconfiguredGenerator;

    #[tokio::test]
    async fn test_narrative_applied_once() {
        let store = LookupStore::default();
        let id = store.insert(generate_report("22AAAAA0000A1Z5")).await;

        assert!(store.apply_narrative(&id, "first".to_string()).await);
        assert!(!store.apply_narrative(&id, "second".to_string()).await);

        let report = store.get(&id).await.unwrap();
        assert_eq!(report.explanation, "first");
    }

    #[tokio::test]
    async fn test_placeholder_text_still_counts_as_written() {
        let store = LookupStore::default();
        let id = store.insert(generate_report("22AAAAA0000A1Z5")).await;

        assert!(
            store
                .apply_narrative(&id, PENDING_EXPLANATION.to_string())
                .await
        );
        assert!(!store.apply_narrative(&id, "second".to_string()).await);

        let report = store.get(&id).await.unwrap();
        assert_eq!(report.explanation, PENDING_EXPLANATION);
    }

    #[tokio::test]
    async fn test_unknown_lookup() {
        let store = LookupStore::default();
        let id = Uuid::new_v4();

        assert!(store.get(&id).await.is_none());
        assert!(!store.apply_narrative(&id, "text".to_string()).await);
    }

    #[tokio::test]
    async fn test_start_lookup_placeholder_then_fallback() {
        let store = LookupStore::default();
        let enricher = NarrativeEnricher::new(Arc::new(UnconfiguredGenerator));

        let (id, report, handle) = start_lookup(&store, &enricher, "22AAAAA0000A1Z5").await;
        assert_eq!(report.explanation, PENDING_EXPLANATION);

        assert!(handle.await.unwrap());
        let enriched = store.get(&id).await.unwrap();
        assert_eq!(enriched.explanation, FALLBACK_EXPLANATION);
        assert!(enriched.same_assessment(&report));
        assert_eq!(enriched.timestamp, report.timestamp);
    }
}
