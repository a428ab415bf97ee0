//! # ソーシャル広告 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/social/insights?adAccountId=` - 広告アカウントの集計
//! - `GET /api/social/campaigns?adAccountId=` - キャンペーン一覧
//!   （上流は `/api/facebook/ad-accounts/{adAccountId}/campaigns`）
//! - `POST /api/social/campaigns` - キャンペーン作成（上流は `/api/facebook/campaigns/create`）
//! - `GET /api/social/dashboard` / `pages` / `status` - 連携先の概要（上流は `/api/facebook/*`）
//!
//! `adAccountId` がなければ上流を呼ばずに 400。

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
    forward::{ForwardContext, segment},
    proxy::{CachePolicy, ProxyState},
};

const INSIGHTS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SOCIAL_INSIGHTS, CacheTtl::Long);
const CAMPAIGNS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SOCIAL_CAMPAIGNS, CacheTtl::Medium);
const DASHBOARD_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::SOCIAL_DASHBOARD, CacheTtl::Medium);
const PAGES_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::SOCIAL_PAGES, CacheTtl::Medium);
const STATUS_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::SOCIAL_STATUS, CacheTtl::Short);

/// キャンペーン作成で変わる名前空間
pub const CAMPAIGN_INVALIDATES: &[CacheNamespace] = &[
    CacheNamespace::SOCIAL_CAMPAIGNS,
    CacheNamespace::SOCIAL_DASHBOARD,
];

/// GET /api/social/insights?adAccountId=
///
/// 広告アカウント単位の集計。
pub async fn social_insights(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    if let Err(response) = ctx.require_query("adAccountId") {
        return response;
    }

    let request = ctx.upstream(Method::GET, "/api/social/insights");
    state.cached_get(&ctx, request, INSIGHTS_POLICY).await
}

/// GET /api/social/campaigns?adAccountId=
pub async fn list_campaigns(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let ad_account_id = match ctx.require_query("adAccountId") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let path = format!(
        "/api/facebook/ad-accounts/{}/campaigns",
        segment(&ad_account_id)
    );
    let request = ctx.upstream(Method::GET, path);
    state.cached_get(&ctx, request, CAMPAIGNS_POLICY).await
}

/// POST /api/social/campaigns
pub async fn create_campaign(
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
        "/api/facebook/campaigns/create",
        &body,
        CAMPAIGN_INVALIDATES,
    )
    .await
}

/// GET /api/social/dashboard
pub async fn social_dashboard(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/facebook/dashboard", DASHBOARD_POLICY).await
}

/// GET /api/social/pages
pub async fn social_pages(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/facebook/pages", PAGES_POLICY).await
}

/// GET /api/social/status
pub async fn social_status(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/facebook/status", STATUS_POLICY).await
}
