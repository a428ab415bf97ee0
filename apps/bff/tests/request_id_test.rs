//! # Request ID レイヤーのテスト
//!
//! BFF の Request ID レイヤー（SetRequestIdLayer + PropagateRequestIdLayer +
//! カスタム make_span_with）が正しく動作することを検証する。
//!
//! - レスポンスに `X-Request-Id` ヘッダーが含まれる
//! - クライアント提供の `X-Request-Id` がそのまま返される
//! - 自動生成の `X-Request-Id` が UUID v7 形式である
//! - 400 など BFF 自身が返すエラーにも付く
//! - 上流へのリクエストにも同じ値を渡す

mod common;

use axum::http::StatusCode;
use common::{StubUpstream, app, get, send};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_レスポンスにx_request_idヘッダーが含まれる() {
    let app = app(StubUpstream::counting());

    let response = send(&app, get("/health", &[])).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(
        response.header("x-request-id").is_some(),
        "レスポンスに x-request-id ヘッダーが含まれること"
    );
}

#[tokio::test]
async fn test_クライアント提供のx_request_idがそのまま返される() {
    let app = app(StubUpstream::counting());
    let custom_id = "client-provided-request-id-123";

    let response = send(&app, get("/health", &[("x-request-id", custom_id)])).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.header("x-request-id"),
        Some(custom_id),
        "クライアント提供の Request ID がそのまま返されること"
    );
}

#[tokio::test]
async fn test_自動生成のx_request_idがuuid_v7形式である() {
    let app = app(StubUpstream::counting());

    let response = send(&app, get("/health", &[])).await;

    let request_id = response.header("x-request-id").unwrap();
    let uuid = uuid::Uuid::parse_str(request_id)
        .unwrap_or_else(|_| panic!("有効な UUID であること: {request_id}"));
    assert_eq!(
        uuid.get_version(),
        Some(uuid::Version::SortRand),
        "UUID v7（SortRand）であること"
    );
}

#[tokio::test]
async fn test_バリデーションエラーにもx_request_idが付く() {
    let upstream = StubUpstream::counting();
    let app = app(upstream.clone());

    let response = send(&app, get("/api/social/insights", &[("x-request-id", "req-400")])).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.header("x-request-id"), Some("req-400"));
    assert_eq!(upstream.call_count(), 0);
}

#[tokio::test]
async fn test_プロキシ応答にもx_request_idが付く() {
    let app = app(StubUpstream::counting());

    let response = send(&app, get("/api/students", &[("x-tenant-id", "tenant-a")])).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.header("x-request-id").is_some());
}

#[tokio::test]
async fn test_上流へのリクエストにも同じrequest_idを渡す() {
    let upstream = StubUpstream::counting();
    let app = app(upstream.clone());

    send(
        &app,
        get("/api/students", &[("x-tenant-id", "tenant-a"), ("x-request-id", "req-upstream")]),
    )
    .await;

    assert_eq!(upstream.last_call().request_id.as_deref(), Some("req-upstream"));
}

#[tokio::test]
async fn test_自動生成したrequest_idを上流へ渡しレスポンスにも返す() {
    let upstream = StubUpstream::counting();
    let app = app(upstream.clone());

    let response = send(&app, get("/api/subscription-plans/public", &[])).await;

    let sent = upstream.last_call().request_id;
    assert_eq!(sent.as_deref(), response.header("x-request-id"));
}
