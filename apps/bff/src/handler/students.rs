//! # 生徒 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/students` - 生徒一覧（キャッシュ 5 分）
//! - `POST /api/students` - 生徒登録
//! - `GET /api/students/{id}` - 生徒詳細
//! - `PUT /api/students/{id}` - 生徒更新
//! - `DELETE /api/students/{id}` - 生徒削除

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

const LIST_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::STUDENTS_LIST, CacheTtl::Medium);

/// 生徒の登録・更新・削除で無効化する名前空間
///
/// ダッシュボードは生徒数を表示するため一緒に消す。
pub const INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::STUDENTS_LIST, CacheNamespace::DASHBOARD_HOME];

/// GET /api/students
pub async fn list_students(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/students", LIST_POLICY).await
}

/// POST /api/students
pub async fn create_student(
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
        "/api/students",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/students/{id}
pub async fn get_student(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    let path = format!("/api/students/{}", segment(&id));
    forward_get(&state, &headers, query, &path).await
}

/// PUT /api/students/{id}
pub async fn update_student(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/students/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::PUT, &path, &body, INVALIDATES).await
}

/// DELETE /api/students/{id}
pub async fn delete_student(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/students/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::DELETE, &path, &body, INVALIDATES).await
}
