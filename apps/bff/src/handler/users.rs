//! # ユーザー管理 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/user?tenantId=` - テナント内のユーザー一覧
//! - `POST /api/user` - ユーザー作成
//! - `PUT /api/user/employees/{id}` - 従業員更新
//! - `DELETE /api/user/employees/{id}` - 従業員削除

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::forward_mutation;
use crate::{
    forward::{ForwardContext, segment},
    proxy::{CachePolicy, ProxyState},
};

const LIST_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::USERS_LIST, CacheTtl::Medium);

/// 従業員の更新は従業員一覧にも現れる
pub const INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::USERS_LIST, CacheNamespace::EMPLOYEES_LIST];

/// GET /api/user?tenantId=
///
/// 一覧はテナント指定が必須。
pub async fn list_users(
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

    let request = ctx.upstream(Method::GET, "/api/user");
    state.cached_get(&ctx, request, LIST_POLICY).await
}

/// POST /api/user
pub async fn create_user(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(&state, &headers, query, Method::POST, "/api/user", &body, INVALIDATES).await
}

/// PUT /api/user/employees/{id}
pub async fn update_employee(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/user/employees/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::PUT, &path, &body, INVALIDATES).await
}

/// DELETE /api/user/employees/{id}
pub async fn delete_employee(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/user/employees/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::DELETE, &path, &body, INVALIDATES).await
}
