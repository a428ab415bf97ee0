//! # テスト用モックキャッシュ
//!
//! キャッシュ障害時の振る舞いを検証するためのスタブ。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! edusuite-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use edusuite_domain::cache::{CacheKey, CacheTtl, KeyPattern};
use serde_json::Value;

use crate::{
    cache::{CacheBackend, CacheStats, MemoryCache, ResponseCache},
    error::InfraError,
};

// --- FailingCache ---

/// 全ての操作が失敗するキャッシュ（到達不能な Redis を模す）
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCache;

fn unavailable() -> InfraError {
    InfraError::unexpected("キャッシュサーバーに接続できません")
}

#[async_trait]
impl ResponseCache for FailingCache {
    async fn get(&self, _key: &CacheKey) -> Result<Option<Value>, InfraError> {
        Err(unavailable())
    }

    async fn set(&self, _key: &CacheKey, _value: &Value, _ttl: CacheTtl) -> Result<(), InfraError> {
        Err(unavailable())
    }

    async fn delete(&self, _key: &CacheKey) -> Result<(), InfraError> {
        Err(unavailable())
    }

    async fn delete_pattern(&self, _pattern: &KeyPattern) -> Result<u64, InfraError> {
        Err(unavailable())
    }

    async fn clear(&self) -> Result<(), InfraError> {
        Err(unavailable())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        Err(unavailable())
    }

    async fn ping(&self) -> Result<(), InfraError> {
        Err(unavailable())
    }
}

// --- SwitchableCache ---

/// 障害の有無を切り替えられるキャッシュ
///
/// 正常時は内部のメモリキャッシュで応答し、`backend()` は指定した値を返す。
pub struct SwitchableCache {
    inner:   MemoryCache,
    backend: CacheBackend,
    failing: AtomicBool,
}

impl SwitchableCache {
    pub fn new(backend: CacheBackend) -> Self {
        Self {
            inner: MemoryCache::default(),
            backend,
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), InfraError> {
        if self.failing.load(Ordering::Relaxed) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ResponseCache for SwitchableCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, InfraError> {
        self.check()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &CacheKey, value: &Value, ttl: CacheTtl) -> Result<(), InfraError> {
        self.check()?;
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), InfraError> {
        self.check()?;
        self.inner.delete(key).await
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<u64, InfraError> {
        self.check()?;
        self.inner.delete_pattern(pattern).await
    }

    async fn clear(&self) -> Result<(), InfraError> {
        self.check()?;
        self.inner.clear().await
    }

    fn backend(&self) -> CacheBackend {
        self.backend
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        self.check()?;
        let stats = self.inner.stats().await?;
        Ok(CacheStats {
            backend: self.backend,
            ..stats
        })
    }

    async fn ping(&self) -> Result<(), InfraError> {
        self.check()
    }
}
