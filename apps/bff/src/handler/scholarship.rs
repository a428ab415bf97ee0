//! # 奨学金試験 API ハンドラ（管理側）
//!
//! ## エンドポイント
//!
//! - `GET /api/scholarship-exams` - 試験一覧
//! - `POST /api/scholarship-exams` - 試験作成
//! - `GET /api/scholarship-exams/{id}` - 試験詳細
//! - `PUT /api/scholarship-exams/{id}` - 試験更新
//! - `DELETE /api/scholarship-exams/{id}` - 試験削除
//! - `GET /api/scholarship-exams/{id}/stats` - 申込統計
//! - `GET /api/scholarship-exams/{id}/registrations` - 申込一覧
//!
//! 試験単位のキャッシュは試験 ID をキーに含める。

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
    forward::{ForwardContext, segment},
    proxy::{CachePolicy, ProxyState},
};

const LIST_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::EXAMS_LIST, CacheTtl::Medium);
const STATS_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::EXAMS_STATS, CacheTtl::Short);
const REGISTRATIONS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::EXAMS_REGISTRATIONS, CacheTtl::Short);

pub const INVALIDATES: &[CacheNamespace] = &[
    CacheNamespace::EXAMS_LIST,
    CacheNamespace::EXAMS_STATS,
    CacheNamespace::EXAMS_REGISTRATIONS,
];

fn exam_path(id: &str) -> String {
    format!("/api/scholarship-exams/{}", segment(id))
}

/// GET /api/scholarship-exams
pub async fn list_exams(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/scholarship-exams", LIST_POLICY).await
}

/// POST /api/scholarship-exams
pub async fn create_exam(
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
        "/api/scholarship-exams",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/scholarship-exams/{id}
pub async fn get_exam(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    forward_get(&state, &headers, query, &exam_path(&id)).await
}

/// PUT /api/scholarship-exams/{id}
pub async fn update_exam(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    forward_mutation(&state, &headers, query, Method::PUT, &exam_path(&id), &body, INVALIDATES)
        .await
}

/// DELETE /api/scholarship-exams/{id}
pub async fn delete_exam(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    forward_mutation(
        &state,
        &headers,
        query,
        Method::DELETE,
        &exam_path(&id),
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/scholarship-exams/{id}/stats
pub async fn exam_stats(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    cached_exam_resource(&state, &headers, query, &id, "stats", STATS_POLICY).await
}

/// GET /api/scholarship-exams/{id}/registrations
pub async fn exam_registrations(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    cached_exam_resource(&state, &headers, query, &id, "registrations", REGISTRATIONS_POLICY).await
}

async fn cached_exam_resource(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    id: &str,
    resource: &str,
    policy: CachePolicy,
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx.with_key_param("examId", id),
        Err(response) => return response,
    };
    let request = ctx.upstream(Method::GET, format!("{}/{}", exam_path(id), resource));
    state.cached_get(&ctx, request, policy).await
}
