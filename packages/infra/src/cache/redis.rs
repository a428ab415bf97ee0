//! # Redis キャッシュ
//!
//! 値は JSON 文字列として `SETEX` で保存し、有効期限は Redis に任せる。
//! パターン削除は `SCAN MATCH` + `DEL`（`KEYS` は本番で使わない）。

use async_trait::async_trait;
use edusuite_domain::cache::{CacheKey, CacheTtl, KeyPattern};
use redis::{AsyncCommands, aio::ConnectionManager};
use serde_json::Value;

use super::{CacheBackend, CacheStats, ResponseCache};
use crate::error::InfraError;

/// SCAN 1 回あたりの走査件数
const SCAN_COUNT: usize = 100;

/// Redis を使用したレスポンスキャッシュ
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl ResponseCache for RedisCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, InfraError> {
        let mut conn = self.conn.clone();
        let result: Option<String> = conn.get(key.as_str()).await?;

        match result {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &CacheKey, value: &Value, ttl: CacheTtl) -> Result<(), InfraError> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key.as_str(), json, ttl.as_secs()).await?;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key.as_str()).await?;
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &KeyPattern) -> Result<u64, InfraError> {
        let mut conn = self.conn.clone();
        let mut deleted: u64 = 0;
        let mut cursor = 0u64;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern.as_str())
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: u64 = conn.del(&keys).await?;
                deleted += removed;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        Ok(deleted)
    }

    async fn clear(&self) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> CacheBackend {
        CacheBackend::Redis
    }

    async fn stats(&self) -> Result<CacheStats, InfraError> {
        let mut conn = self.conn.clone();
        let keys: u64 = redis::cmd("DBSIZE").query_async(&mut conn).await?;
        Ok(CacheStats {
            backend: CacheBackend::Redis,
            keys,
        })
    }

    async fn ping(&self) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
