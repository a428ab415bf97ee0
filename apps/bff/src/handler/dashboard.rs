//! # ダッシュボード API ハンドラ
//!
//! - `GET /api/dashboard/overview` - 期間指定の集計（キャッシュしない）
//! - `GET /api/dashboard/home` - ホーム画面の集計（キャッシュ 2 分）

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::HeaderMap,
    response::Response,
};
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_get};
use crate::proxy::{CachePolicy, ProxyState};

const HOME_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::DASHBOARD_HOME, CacheTtl::Short);

/// GET /api/dashboard/overview
pub async fn dashboard_overview(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/dashboard/overview").await
}

/// GET /api/dashboard/home
pub async fn dashboard_home(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/dashboard/home", HOME_POLICY).await
}
