//! # EduSuite 共有ユーティリティ
//!
//! BFF とインフラ層から使われる、ビジネスロジックを含まない共通部品。
//!
//! - [`error_response`] - RFC 9457 エラーレスポンス
//! - [`health`] - ヘルスチェックのレスポンス型
//! - [`observability`] - トレーシング初期化と Request ID
//! - [`canonical_log`] - リクエスト完了サマリログ（`observability` feature）

#[cfg(feature = "observability")]
pub mod canonical_log;
pub mod error_response;
pub mod health;
pub mod observability;

pub use error_response::ErrorResponse;
pub use health::{CheckStatus, HealthResponse, ReadinessResponse, ReadinessStatus};
