//! # デモ申込 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/demo-requests` - 申込一覧（運営者向け、キャッシュ 5 分）
//! - `POST /api/demo-requests` - 申込（ランディングページから、テナントなし）
//! - `GET /api/demo-requests/{id}` - 申込詳細
//!
//! 申込はテナントを持たないため、作成時の無効化は名前空間全体に及ぶ。

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_get, forward_mutation};
use crate::{
    forward::segment,
    proxy::{CachePolicy, ProxyState},
};

const LIST_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::DEMO_REQUESTS, CacheTtl::Medium);

pub const INVALIDATES: &[CacheNamespace] = &[CacheNamespace::DEMO_REQUESTS];

/// GET /api/demo-requests
pub async fn list_demo_requests(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/demo-requests", LIST_POLICY).await
}

/// POST /api/demo-requests
pub async fn create_demo_request(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(
        &state,
        &headers,
        query,
        Method::POST,
        "/api/demo-requests",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/demo-requests/{id}
pub async fn get_demo_request(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    let path = format!("/api/demo-requests/{}", segment(&id));
    forward_get(&state, &headers, query, &path).await
}
