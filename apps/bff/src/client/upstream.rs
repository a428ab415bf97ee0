//! # 上流 API クライアント
//!
//! BFF から上流の Express API への通信を担当する。
//!
//! ボディは解釈せずに `serde_json::Value` のまま運ぶ。
//! 上流の 4xx / 5xx はエラーにせず [`UpstreamResponse`] として返し、
//! 中継するかどうかはハンドラ側（[`crate::proxy`]）が決める。
//!
//! リトライは行わない。

mod client_impl;
mod error;
mod request;
mod response;

use async_trait::async_trait;
use http::StatusCode;

pub use self::{
    client_impl::{TENANT_ID_HEADER, UpstreamClientImpl},
    error::UpstreamError,
    request::UpstreamRequest,
    response::{UpstreamBody, UpstreamResponse},
};

/// 上流 API クライアントトレイト
///
/// テスト時はスタブ実装に差し替える。
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// リクエストを転送し、レスポンスを返す
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError>;

    /// ヘルスチェック用パスを叩き、ステータスコードを返す
    async fn ping(&self) -> Result<StatusCode, UpstreamError>;
}
