//! # 運営分析 API ハンドラ
//!
//! 全テナント横断の集計（運営者向け）。上流は Bearer トークンだけで認可するため、
//! `Authorization` ヘッダーまたは `jwt` Cookie のトークンを `Bearer` で渡す。
//! トークンがなければ上流を呼ばずに 401。集計は常に最新を返すためキャッシュしない。
//!
//! ## エンドポイント
//!
//! - `GET /api/analytics/dashboard`
//! - `GET /api/analytics/revenue-breakdown`
//! - `GET /api/analytics/top-tenants?limit=` - `limit` の既定は 10

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};

use crate::{
    client::UpstreamRequest,
    error::unauthorized_response,
    forward::ForwardContext,
    proxy::ProxyState,
};

const DEFAULT_TOP_TENANTS_LIMIT: &str = "10";

/// GET /api/analytics/dashboard
pub async fn analytics_dashboard(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    bearer_get(&state, &headers, query, |_| "/api/analytics/dashboard".to_string()).await
}

/// GET /api/analytics/revenue-breakdown
pub async fn revenue_breakdown(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    bearer_get(&state, &headers, query, |_| {
        "/api/analytics/revenue-breakdown".to_string()
    })
    .await
}

/// GET /api/analytics/top-tenants?limit=
pub async fn top_tenants(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    bearer_get(&state, &headers, query, |ctx| {
        let limit = ctx.query().get("limit").unwrap_or(DEFAULT_TOP_TENANTS_LIMIT);
        format!(
            "/api/analytics/top-tenants?limit={}",
            urlencoding::encode(limit)
        )
    })
    .await
}

/// トークンを Bearer で付けて GET を転送する
///
/// 上流パスはコンテキストから組み立てる（クエリは引き継がない）。
async fn bearer_get<F>(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    path: F,
) -> Response
where
    F: FnOnce(&ForwardContext) -> String,
{
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(token) = ctx.bearer_token() else {
        tracing::debug!("Bearer トークンがありません");
        return unauthorized_response();
    };

    let request = UpstreamRequest::new(Method::GET, path(&ctx))
        .authorization(Some(format!("Bearer {token}")))
        .tenant(ctx.tenant_id().cloned());
    state.passthrough(request).await
}
