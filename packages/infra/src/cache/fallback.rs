//! # フォールバックキャッシュ
//!
//! Redis を優先し、Redis が応答しないときはメモリキャッシュで応答する。
//!
//! - 書き込み系（set / delete / delete_pattern / clear）は常にメモリへ適用し、
//!   続けて Redis へ適用する。Redis のエラーは警告ログを出して握りつぶす
//! - 読み込みは Redis を参照し、エラー時のみメモリの値を返す
//! - `backend()` は直近の Redis 操作が成功していれば `Redis`、失敗していれば `Memory`

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use edusuite_domain::cache::{CacheKey, CacheTtl, KeyPattern};
use serde_json::Value;

use super::{CacheBackend, CacheStats, MemoryCache, ResponseCache};
use crate::error::InfraError;

/// Redis + メモリフォールバック
pub struct FallbackCache {
    primary:         Arc<dyn ResponseCache>,
    fallback:        MemoryCache,
    primary_healthy: AtomicBool,
}

impl FallbackCache {
    pub fn new(primary: Arc<dyn ResponseCache>, fallback: MemoryCache) -> Self {
        Self {
            primary,
            fallback,
            primary_healthy: AtomicBool::new(true),
        }
    }

    /// Redis 操作の結果を記録し、成功時の値を返す
    fn observe<T>(&self, operation: &'static str, result: Result<T, InfraError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.primary_healthy.store(true, Ordering::Relaxed);
                Some(value)
            }
            Err(e) => {
                self.primary_healthy.store(false, Ordering::Relaxed);
                tracing::warn!(
                    error.category = "infrastructure",
                    error.kind = "cache",
                    cache.operation = operation,
                    "Redis キャッシュ操作に失敗したため、メモリキャッシュで継続します: {}",
                    e
                );
                None
            }
        }
    }
}

#[async_trait]
impl ResponseCache for FallbackCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, InfraError> {
        let primary = self.primary.get(key).await;
        match self.observe("get", primary) {
            Some(value) => Ok(value),
            None => self.fallback.get(key).await,
        }
    }

    async fn set(&self, key: &CacheKey, value: &Value, ttl: CacheTtl) -> Result<(), InfraError> {
        self.fallback.set(key, value, ttl).await?;
        let primary = self.primary.set(key, value, ttl).await;
        self.observe("set", primary);
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), InfraError> {
        self.fallback.delete(key).await?;
        let primary = self.primary.delete(key).await;
        self.observe("delete", primary);
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<u64, InfraError> {
        let local = self.fallback.delete_pattern(pattern).await?;
        let primary = self.primary.delete_pattern(pattern).await;
        Ok(self.observe("delete_pattern", primary).unwrap_or(local))
    }

    async fn clear(&self) -> Result<(), InfraError> {
        self.fallback.clear().await?;
        let primary = self.primary.clear().await;
        self.observe("clear", primary);
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        if self.primary_healthy.load(Ordering::Relaxed) {
            self.primary.backend()
        } else {
            CacheBackend::Memory
        }
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        let primary = self.primary.stats().await;
        match self.observe("stats", primary) {
            Some(stats) => Ok(stats),
            None => self.fallback.stats().await,
        }
    }

    /// メモリが常に使えるため、Redis の失敗は Readiness を落とさない
    async fn ping(&self) -> Result<(), InfraError> {
        let primary = self.primary.ping().await;
        if self.observe("ping", primary).is_none() {
            return self.fallback.ping().await;
        }
        Ok(())
    }
}
