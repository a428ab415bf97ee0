//! # レスポンスキャッシュ
//!
//! 上流 API のレスポンス（整形済み JSON）を TTL 付きで保持する。
//!
//! ## 実装
//!
//! | 型 | 用途 |
//! |----|------|
//! | [`MemoryCache`] | プロセス内 HashMap。Redis 未設定時、またはフォールバック先 |
//! | [`RedisCache`] | Redis（`SETEX` / `SCAN` + `DEL`） |
//! | [`FallbackCache`] | Redis を優先し、失敗時はメモリで応答する |
//!
//! どの実装も [`ResponseCache`] トレイトを通して使う。
//! BFF のハンドラはバックエンドの違いを意識しない。

mod fallback;
mod memory;
mod redis;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use edusuite_domain::cache::{CacheKey, CacheTtl, KeyPattern};
use serde_json::Value;
use strum::{Display, IntoStaticStr};

pub use self::{
    fallback::FallbackCache,
    memory::{DEFAULT_MAX_ENTRIES, MemoryCache},
    redis::RedisCache,
};
use crate::error::InfraError;

/// 実際にデータを保持しているバックエンド
///
/// レスポンスヘッダー `X-Cache-Type` にそのまま出力する。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CacheBackend {
    Redis,
    Memory,
}

/// キャッシュの統計情報
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub backend: CacheBackend,
    /// 現在のキー数（メモリの場合は期限切れを含む概数）
    pub keys:    u64,
}

/// TTL 付きレスポンスキャッシュ
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// 有効期限内の値を取得する
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, InfraError>;

    /// 値を保存する（既存の値は上書きし、保存時刻を更新する）
    async fn set(&self, key: &CacheKey, value: &Value, ttl: CacheTtl) -> Result<(), InfraError>;

    /// キーを削除する（存在しなくてもエラーにしない）
    async fn delete(&self, key: &CacheKey) -> Result<(), InfraError>;

    /// パターンに一致するキーを全て削除し、削除件数を返す
    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<u64, InfraError>;

    /// 全てのキーを削除する
    async fn clear(&self) -> Result<(), InfraError>;

    /// 現在応答しているバックエンド
    fn backend(&self) -> CacheBackend;

    async fn stats(&self) -> Result<CacheStats, InfraError>;

    /// 疎通確認（Readiness Check 用）
    async fn ping(&self) -> Result<(), InfraError>;
}

/// キャッシュの構築設定
#[derive(Debug, Clone)]
pub struct CacheSettings {
    /// 未設定ならメモリのみ
    pub redis_url:       Option<String>,
    pub max_entries:     usize,
    /// 起動時の Redis 接続のタイムアウト
    pub connect_timeout: Duration,
}

/// 設定に応じたキャッシュを構築する
///
/// - `redis_url` 未設定: メモリのみ
/// - Redis に接続できない: 警告を出してメモリのみ
/// - 接続できた: Redis + メモリフォールバック
pub async fn build_response_cache(settings: &CacheSettings) -> Arc<dyn ResponseCache> {
    let memory = MemoryCache::new(settings.max_entries);

    let Some(redis_url) = settings.redis_url.as_deref() else {
        tracing::info!(
            cache.backend = "memory",
            "REDIS_URL が未設定のため、メモリキャッシュを使用します"
        );
        return Arc::new(memory);
    };

    let connect = crate::redis::create_connection_manager(redis_url);
    match tokio::time::timeout(settings.connect_timeout, connect).await {
        Ok(Ok(conn)) => {
            tracing::info!(cache.backend = "redis", "Redis キャッシュに接続しました");
            Arc::new(FallbackCache::new(Arc::new(RedisCache::new(conn)), memory))
        }
        Ok(Err(e)) => {
            tracing::warn!(
                cache.backend = "memory",
                error = %e,
                "Redis に接続できないため、メモリキャッシュを使用します"
            );
            Arc::new(memory)
        }
        Err(_) => {
            tracing::warn!(
                cache.backend = "memory",
                "Redis への接続がタイムアウトしたため、メモリキャッシュを使用します"
            );
            Arc::new(memory)
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_backendはヘッダー用の大文字で表示される() {
        assert_eq!(CacheBackend::Redis.to_string(), "REDIS");
        let memory: &'static str = CacheBackend::Memory.into();
        assert_eq!(memory, "MEMORY");
    }

    #[tokio::test]
    async fn test_redis_url未設定ならメモリキャッシュを構築する() {
        let settings = CacheSettings {
            redis_url:       None,
            max_entries:     10,
            connect_timeout: Duration::from_secs(1),
        };

        let cache = build_response_cache(&settings).await;

        assert_eq!(cache.backend(), CacheBackend::Memory);
    }

    #[tokio::test]
    async fn test_不正なredis_urlならメモリキャッシュにフォールバックする() {
        let settings = CacheSettings {
            redis_url:       Some("not-a-redis-url".to_string()),
            max_entries:     10,
            connect_timeout: Duration::from_secs(1),
        };

        let cache = build_response_cache(&settings).await;

        assert_eq!(cache.backend(), CacheBackend::Memory);
    }
}
