//! # Redis 接続管理
//!
//! レスポンスキャッシュ用の Redis 接続を作成する。
//!
//! `ConnectionManager` は切断時に自動で再接続を試み、Clone して
//! 複数のリクエストタスクで共有できる。起動後に Redis が落ちても
//! [`FallbackCache`](crate::cache::FallbackCache) がメモリで応答を続け、
//! 復旧すれば同じマネージャで Redis に戻る。

use redis::{Client, aio::ConnectionManager};

/// Redis 接続マネージャを作成する
///
/// アプリケーション起動時に一度だけ呼び出す。
///
/// # 引数
///
/// * `redis_url` - `redis://[[username:]password@]host[:port][/database]`
///   （TLS は `rediss://`）
///
/// # エラー
///
/// - URL パースエラー: 不正な URL 形式
/// - 接続エラー: Redis サーバーに接続できない
pub async fn create_connection_manager(
    redis_url: &str,
) -> Result<ConnectionManager, redis::RedisError> {
    let client = Client::open(redis_url)?;
    ConnectionManager::new(client).await
}
