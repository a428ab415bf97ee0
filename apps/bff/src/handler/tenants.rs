//! # テナント API ハンドラ
//!
//! - `GET /api/tenants` - テナント一覧（キャッシュ 5 分）
//! - `GET /api/tenant/me` - ログイン中ユーザーのテナント

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
};
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_get};
use crate::proxy::{CachePolicy, ProxyState};

const LIST_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::TENANTS_LIST, CacheTtl::Medium);

/// GET /api/tenants
pub async fn list_tenants(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/tenants", LIST_POLICY).await
}

/// GET /api/tenant/me
pub async fn current_tenant(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/tenant/me").await
}
