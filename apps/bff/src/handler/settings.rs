//! # 設定 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/settings/tenant-profile` - 学校プロフィール（上流は `/api/tenants/profile`）
//! - `PUT /api/settings/tenant-profile` - 学校プロフィール更新
//! - `GET /api/ui/sidebar` - サイドバー構成
//! - `GET /api/settings/staff-list?tenantId=` - ログイン可能な職員（上流は `/api/auth/users`）
//! - `POST /api/settings/staff-list?tenantId=` - 職員ログインの作成
//!
//! サイドバーはプロフィール（ロゴ、表示名）から作られるため、更新時は両方消す。
//! 職員ログインの一覧はテナント指定が必須。

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_mutation};
use crate::{
    forward::{ForwardContext, parse_body},
    proxy::{CachePolicy, ProxyState},
};

const PROFILE_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SETTINGS_PROFILE, CacheTtl::VeryLong);
const SIDEBAR_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SETTINGS_SIDEBAR, CacheTtl::Hour);

const STAFF_LIST_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SETTINGS_STAFF_LIST, CacheTtl::Medium);

pub const STAFF_LIST_INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::SETTINGS_STAFF_LIST, CacheNamespace::USERS_LIST];

pub const INVALIDATES: &[CacheNamespace] = &[
    CacheNamespace::SETTINGS_PROFILE,
    CacheNamespace::SETTINGS_SIDEBAR,
];

/// GET /api/settings/tenant-profile
pub async fn get_tenant_profile(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/tenants/profile", PROFILE_POLICY).await
}

/// PUT /api/settings/tenant-profile
pub async fn update_tenant_profile(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(
        &state,
        &headers,
        query,
        Method::PUT,
        "/api/tenants/profile",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/ui/sidebar
pub async fn sidebar(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/ui/sidebar", SIDEBAR_POLICY).await
}

/// GET /api/settings/staff-list?tenantId=
pub async fn staff_logins(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if let Err(response) = ctx.require_query("tenantId") {
        return response;
    }

    let request = ctx.upstream(Method::GET, "/api/auth/users");
    state.cached_get(&ctx, request, STAFF_LIST_POLICY).await
}

/// POST /api/settings/staff-list?tenantId=
pub async fn create_staff_login(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if let Err(response) = ctx.require_query("tenantId") {
        return response;
    }
    let body = match parse_body(&body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let mut request = ctx.upstream(Method::POST, "/api/auth/users");
    if let Some(body) = body {
        request = request.json(body);
    }
    state.mutate(&ctx, request, STAFF_LIST_INVALIDATES).await
}
