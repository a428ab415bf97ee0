//! # 職員 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/staff` - 職員一覧
//! - `POST /api/staff` - 職員登録
//! - `GET /api/staff/{id}` - 職員詳細
//! - `PUT /api/staff/{id}` - 職員更新
//! - `DELETE /api/staff/{id}` - 職員削除

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

const LIST_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::STAFF_LIST, CacheTtl::Medium);

/// 職員の登録・更新・削除で無効化する名前空間
pub const INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::STAFF_LIST, CacheNamespace::DASHBOARD_HOME];

/// GET /api/staff
pub async fn list_staff(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/staff", LIST_POLICY).await
}

/// POST /api/staff
pub async fn create_staff(
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
        "/api/staff",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/staff/{id}
pub async fn get_staff(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    let path = format!("/api/staff/{}", segment(&id));
    forward_get(&state, &headers, query, &path).await
}

/// PUT /api/staff/{id}
pub async fn update_staff(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/staff/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::PUT, &path, &body, INVALIDATES).await
}

/// DELETE /api/staff/{id}
pub async fn delete_staff(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/staff/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::DELETE, &path, &body, INVALIDATES).await
}
