//! # Request ID の保存
//!
//! `SetRequestIdLayer` が付与した Request ID を task-local に保存し、
//! ハンドラの中から [`current_request_id`] で参照できるようにする。
//!
//! [`UpstreamRequest::new`](crate::client::UpstreamRequest::new) が生成時にこの値を読み取り、
//! 上流への `X-Request-Id` ヘッダーとして運ぶ。ハンドラは Request ID を意識しない。

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tower_http::request_id::RequestId;

tokio::task_local! {
    static REQUEST_ID: String;
}

/// 現在のリクエストの Request ID
///
/// ミドルウェアの外（起動処理や単体テスト）では `None`。
pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(Clone::clone).ok()
}

/// Request ID を task-local に保存するミドルウェア
///
/// `SetRequestIdLayer` より内側に置くこと。Request ID が見つからなければ `-` を保存する。
pub async fn store_request_id(request: Request<Body>, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("-")
        .to_string();

    REQUEST_ID.scope(request_id, next.run(request)).await
}
