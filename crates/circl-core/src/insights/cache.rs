use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::recommend::RecommendationSet;
use crate::error::{CirclError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedInsights {
    pub generated_at: DateTime<Utc>,
    pub recommendations: RecommendationSet,
}

impl CachedInsights {
    pub fn is_stale(&self, now: DateTime<Utc>, cache_hours: i64) -> bool {
        // A window too large to represent never expires.
        Duration::try_hours(cache_hours).is_some_and(|window| now - self.generated_at >= window)
    }
}

/// Last recommendations per user, persisted as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightCache {
    #[serde(default)]
    entries: BTreeMap<Uuid, CachedInsights>,
}

impl InsightCache {
    /// `~/.config/circl/insights.json`
    pub fn default_path() -> Result<PathBuf> {
        crate::config::data_dir().map(|d| d.join("insights.json"))
    }

    /// Load the cache. A missing or unreadable file yields an empty cache.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        match serde_json::from_str(&text) {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring corrupt insight cache");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CirclError::Storage(format!("cannot create {}: {e}", parent.display()))
            })?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .map_err(|e| CirclError::Storage(format!("cannot write {}: {e}", path.display())))
    }

    pub fn entry(&self, user_id: Uuid) -> Option<&CachedInsights> {
        self.entries.get(&user_id)
    }

    /// Cached recommendations for `user_id` if younger than `cache_hours`.
    pub fn fresh(&self, user_id: Uuid, now: DateTime<Utc>, cache_hours: i64) -> Option<&RecommendationSet> {
        self.entries
            .get(&user_id)
            .filter(|e| !e.is_stale(now, cache_hours))
            .map(|e| &e.recommendations)
    }

    pub fn put(&mut self, user_id: Uuid, recommendations: RecommendationSet, now: DateTime<Utc>) {
        self.entries.insert(
            user_id,
            CachedInsights {
                generated_at: now,
                recommendations,
            },
        );
    }

    pub fn invalidate(&mut self, user_id: Uuid) {
        self.entries.remove(&user_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("circl-test-{}", Uuid::now_v7()))
            .join("insights.json")
    }

    #[test]
    fn fresh_until_window_passes() {
        let user = Uuid::now_v7();
        let now = Utc::now();
        let mut cache = InsightCache::default();
        cache.put(user, RecommendationSet::RuleBased(Vec::new()), now);

        assert!(cache.fresh(user, now + Duration::hours(23), 24).is_some());
        assert!(cache.fresh(user, now + Duration::hours(24), 24).is_none());
        assert!(cache.fresh(Uuid::now_v7(), now, 24).is_none());
    }

    #[test]
    fn huge_window_never_expires() {
        let user = Uuid::now_v7();
        let now = Utc::now();
        let mut cache = InsightCache::default();
        cache.put(user, RecommendationSet::RuleBased(Vec::new()), now);
        assert!(cache.fresh(user, now + Duration::days(400), i64::MAX).is_some());
    }

    #[test]
    fn roundtrips_through_disk() {
        let path = temp_path();
        let user = Uuid::now_v7();
        let mut cache = InsightCache::default();
        cache.put(user, RecommendationSet::AiGenerated(Vec::new()), Utc::now());
        cache.save(&path).unwrap();

        let loaded = InsightCache::load(&path);
        assert!(loaded.entry(user).unwrap().recommendations.is_ai_generated());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn missing_or_corrupt_file_is_empty() {
        let path = temp_path();
        assert!(InsightCache::load(&path).entries.is_empty());

        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();
        assert!(InsightCache::load(&path).entries.is_empty());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn invalidate_removes_entry() {
        let user = Uuid::now_v7();
        let mut cache = InsightCache::default();
        cache.put(user, RecommendationSet::RuleBased(Vec::new()), Utc::now());
        cache.invalidate(user);
        assert!(cache.entry(user).is_none());
    }
}
