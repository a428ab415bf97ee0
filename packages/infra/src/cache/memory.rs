//! # メモリキャッシュ
//!
//! プロセス内の `HashMap` に TTL 付きで値を保持する。
//!
//! 容量（`max_entries`）を超えて挿入すると、まず期限切れのエントリを掃除し、
//! それでも超える場合は保存時刻の古い順に追い出す。
//! ロックは同期 `Mutex` で、`.await` をまたいで保持しない。
//!
//! 時刻は `tokio::time::Instant` を使う。テストでは `start_paused` で時間を進められる。

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
    time::Duration,
};

use async_trait::async_trait;
use edusuite_domain::cache::{CacheKey, CacheTtl, KeyPattern};
use serde_json::Value;
use tokio::time::Instant;

use super::{CacheBackend, CacheStats, ResponseCache};
use crate::error::InfraError;

/// メモリキャッシュの既定容量
pub const DEFAULT_MAX_ENTRIES: usize = 200;

struct Entry {
    value:     Value,
    stored_at: Instant,
    ttl:       Duration,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) >= self.ttl
    }
}

/// プロセス内メモリキャッシュ
pub struct MemoryCache {
    entries:     Mutex<HashMap<String, Entry>>,
    max_entries: usize,
}

impl MemoryCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries: max_entries.max(1),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Entry>>, InfraError> {
        self.entries
            .lock()
            .map_err(|_| InfraError::unexpected("メモリキャッシュのロックが汚染されています"))
    }

    /// 容量を超えていれば期限切れ、古い順の順に追い出す
    fn evict(entries: &mut HashMap<String, Entry>, max_entries: usize, now: Instant) {
        if entries.len() <= max_entries {
            return;
        }

        entries.retain(|_, entry| !entry.is_expired(now));

        let overflow = entries.len().saturating_sub(max_entries);
        if overflow == 0 {
            return;
        }

        let mut by_age: Vec<(Instant, String)> = entries
            .iter()
            .map(|(key, entry)| (entry.stored_at, key.clone()))
            .collect();
        by_age.sort();

        for (_, key) in by_age.into_iter().take(overflow) {
            entries.remove(&key);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, InfraError> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        let Some(entry) = entries.get(key.as_str()) else {
            return Ok(None);
        };
        if !entry.is_expired(now) {
            return Ok(Some(entry.value.clone()));
        }

        // 期限切れは参照時に削除する
        entries.remove(key.as_str());
        Ok(None)
    }

    async fn set(&self, key: &CacheKey, value: &Value, ttl: CacheTtl) -> Result<(), InfraError> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        entries.insert(
            key.as_str().to_string(),
            Entry {
                value:     value.clone(),
                stored_at: now,
                ttl:       ttl.as_duration(),
            },
        );
        Self::evict(&mut entries, self.max_entries, now);

        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), InfraError> {
        self.lock()?.remove(key.as_str());
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<u64, InfraError> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|key, _| !pattern.matches(key));
        Ok((before - entries.len()) as u64)
    }

    async fn clear(&self) -> Result<(), InfraError> {
        self.lock()?.clear();
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Memory
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        Ok(CacheStats {
            backend: CacheBackend::Memory,
            keys:    self.lock()?.len() as u64,
        })
    }

    async fn ping(&self) -> Result<(), InfraError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use edusuite_domain::{
        cache::{CacheNamespace, CredentialFingerprint, QueryParams},
        tenant::TenantId,
    };
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn key(tenant: &str, query: &str) -> CacheKey {
        CacheKey::tenant(
            CacheNamespace::STUDENTS_LIST,
            Some(&TenantId::parse(tenant).unwrap()),
            &CredentialFingerprint::from_credentials(None, None),
            &QueryParams::parse(Some(query)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl内なら保存した値を返す() {
        let cache = MemoryCache::default();
        let k = key("t1", "page=1");

        cache.set(&k, &json!({"data": [1, 2]}), CacheTtl::Medium).await.unwrap();
        tokio::time::advance(Duration::from_secs(299)).await;

        assert_eq!(cache.get(&k).await.unwrap(), Some(json!({"data": [1, 2]})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttlを過ぎると値を返さず削除する() {
        let cache = MemoryCache::default();
        let k = key("t1", "page=1");

        cache.set(&k, &json!({"a": 1}), CacheTtl::VeryShort).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        assert_eq!(cache.get(&k).await.unwrap(), None);
        assert_eq!(cache.stats().await.unwrap().keys, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_上書きすると保存時刻が更新される() {
        let cache = MemoryCache::default();
        let k = key("t1", "");

        cache.set(&k, &json!(1), CacheTtl::VeryShort).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;
        cache.set(&k, &json!(2), CacheTtl::VeryShort).await.unwrap();
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(cache.get(&k).await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn test_存在しないキーの削除はエラーにならない() {
        let cache = MemoryCache::default();
        assert!(cache.delete(&key("t1", "")).await.is_ok());
    }

    #[tokio::test]
    async fn test_パターン削除は対象テナントのキーだけを消す() {
        let cache = MemoryCache::default();
        cache.set(&key("t1", "page=1"), &json!(1), CacheTtl::Medium).await.unwrap();
        cache.set(&key("t1", "page=2"), &json!(2), CacheTtl::Medium).await.unwrap();
        cache.set(&key("t2", "page=1"), &json!(3), CacheTtl::Medium).await.unwrap();

        let pattern = KeyPattern::tenant(
            CacheNamespace::STUDENTS_LIST,
            &TenantId::parse("t1").unwrap(),
        );
        let deleted = cache.delete_pattern(&pattern).await.unwrap();

        assert_eq!(deleted, 2);
        assert_eq!(cache.get(&key("t1", "page=1")).await.unwrap(), None);
        assert_eq!(cache.get(&key("t2", "page=1")).await.unwrap(), Some(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_容量超過時は最も古いエントリを追い出す() {
        let cache = MemoryCache::new(2);

        cache.set(&key("t1", "a=1"), &json!(1), CacheTtl::Hour).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.set(&key("t1", "a=2"), &json!(2), CacheTtl::Hour).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        cache.set(&key("t1", "a=3"), &json!(3), CacheTtl::Hour).await.unwrap();

        assert_eq!(cache.get(&key("t1", "a=1")).await.unwrap(), None);
        assert_eq!(cache.get(&key("t1", "a=2")).await.unwrap(), Some(json!(2)));
        assert_eq!(cache.get(&key("t1", "a=3")).await.unwrap(), Some(json!(3)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_容量超過時は期限切れを先に掃除する() {
        let cache = MemoryCache::new(2);

        cache.set(&key("t1", "a=1"), &json!(1), CacheTtl::Hour).await.unwrap();
        cache.set(&key("t1", "a=2"), &json!(2), CacheTtl::VeryShort).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        cache.set(&key("t1", "a=3"), &json!(3), CacheTtl::Hour).await.unwrap();

        // 期限切れの a=2 が消え、より古い a=1 は残る
        assert_eq!(cache.get(&key("t1", "a=1")).await.unwrap(), Some(json!(1)));
        assert_eq!(cache.stats().await.unwrap().keys, 2);
    }

    #[tokio::test]
    async fn test_clearで全て削除される() {
        let cache = MemoryCache::default();
        cache.set(&key("t1", ""), &json!(1), CacheTtl::Medium).await.unwrap();
        cache.set(&key("t2", ""), &json!(2), CacheTtl::Medium).await.unwrap();

        cache.clear().await.unwrap();

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.backend, CacheBackend::Memory);
        assert_eq!(stats.keys, 0);
    }
}
