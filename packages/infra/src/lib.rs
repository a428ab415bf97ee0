//! # EduSuite インフラ層
//!
//! レスポンスキャッシュの保存先（Redis / プロセス内メモリ）を扱う。
//!
//! ## 依存関係
//!
//! ```text
//! bff → infra → domain
//! ```
//!
//! キャッシュキーや TTL の設計はドメイン層が持ち、
//! このクレートは「どこに保存するか」だけを担う。
//!
//! ## モジュール構成
//!
//! - [`cache`] - `ResponseCache` トレイトと各実装
//! - [`redis`] - Redis 接続管理
//! - [`error`] - インフラ層エラー定義
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use edusuite_infra::cache::{CacheSettings, build_response_cache};
//!
//! let cache = build_response_cache(&CacheSettings {
//!     redis_url:       Some("redis://localhost".to_string()),
//!     max_entries:     200,
//!     connect_timeout: std::time::Duration::from_secs(5),
//! })
//! .await;
//! ```

pub mod cache;
pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod redis;

pub use cache::{CacheBackend, ResponseCache};
pub use error::InfraError;
