//! Per-GSTIN cache of generated narratives with integrity validation.
//!
//! Reports are deterministic per GSTIN, so the prompt (and a good narrative)
//! can be reused across lookups. Each entry carries a SHA-256 checksum over
//! the GSTIN and narrative:
//! 1. The checksum is computed when the narrative is cached
//! 2. It is re-checked when the entry is read back
//! 3. Corrupted entries, or entries stored under another GSTIN, are evicted
//!    and the narrative is regenerated

use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Wrapper for a cached narrative with integrity validation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct NarrativeCacheEntry {
    /// GSTIN the narrative was generated for
    pub gstin: String,
    /// The narrative text
    pub narrative: String,
    /// SHA-256 checksum of gstin + narrative (hex encoded)
    pub checksum: String,
}

impl NarrativeCacheEntry {
    pub fn new(gstin: &str, narrative: &str) -> Self {
        Self {
            gstin: gstin.to_string(),
            narrative: narrative.to_string(),
            checksum: Self::compute_checksum(gstin, narrative),
        }
    }

    fn compute_checksum(gstin: &str, narrative: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(gstin.as_bytes());
        hasher.update([0u8]);
        hasher.update(narrative.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if the checksum matches the stored fields.
    pub fn is_valid(&self) -> bool {
        Self::compute_checksum(&self.gstin, &self.narrative) == self.checksum
    }

    /// Serializes the entry for storage in cache.
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserializes and validates an entry read back for `gstin`.
    ///
    /// Returns the narrative if it is intact and belongs to `gstin`.
    pub fn deserialize_and_validate(serialized: &str, gstin: &str) -> Option<String> {
        let entry: NarrativeCacheEntry = serde_json::from_str(serialized).ok()?;

        if entry.gstin != gstin {
            tracing::warn!(
                "Narrative cache entry for {} found under key {}",
                entry.gstin,
                gstin
            );
            return None;
        }

        if entry.is_valid() {
            Some(entry.narrative)
        } else {
            tracing::warn!(
                "Narrative cache validation failed: checksum mismatch. Expected: {}, Narrative length: {}",
                entry.checksum,
                entry.narrative.len()
            );
            None
        }
    }
}

#[derive(Clone)]
pub struct NarrativeCache {
    inner: Cache<String, String>,
}

impl NarrativeCache {
    /// Creates a cache with the given TTL and entry capacity.
    pub fn new(ttl: Duration, max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .time_to_live(ttl)
                .max_capacity(max_capacity)
                .build(),
        }
    }

    pub async fn get(&self, gstin: &str) -> Option<String> {
        let cached = self.inner.get(gstin).await?;

        match NarrativeCacheEntry::deserialize_and_validate(&cached, gstin) {
            Some(narrative) => {
                tracing::debug!("Narrative cache HIT (validated) for {}", gstin);
                Some(narrative)
            }
            None => {
                self.inner.invalidate(gstin).await;
                None
            }
        }
    }

    pub async fn insert(&self, gstin: &str, narrative: &str) {
        let entry = NarrativeCacheEntry::new(gstin, narrative);
        self.inner
            .insert(gstin.to_string(), entry.serialize())
            .await;
    }

    /// Stores a raw serialized value, bypassing checksum generation.
    #[cfg(test)]
    async fn insert_raw(&self, gstin: &str, raw: String) {
        self.inner.insert(gstin.to_string(), raw).await;
    }
}

impl Default for NarrativeCache {
    /// 1 hour TTL, 10k entries.
    fn default() -> Self {
        Self::new(Duration::from_secs(3600), 10_000)
    }
}
