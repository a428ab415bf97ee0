//! # 会計 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/accounts/overview` - 会計サマリ
//! - `GET /api/accounts/fees-pending` - 未納一覧
//! - `GET /api/accounts/expenses` / `POST` - 経費
//! - `GET /api/accounts/receipts` - 領収書一覧
//! - `GET /api/accounts/receipts/search` - 領収書検索
//! - `POST /api/accounts/receipts/create` - 領収書発行（上流は `POST /api/accounts/receipts`）
//! - `GET /api/accounts/receipts/generate/{paymentId}` - 領収書 PDF
//! - `GET /api/accounts/refunds` / `POST` - 返金
//! - `GET /api/accounts/{enrollment,expenses,revenue}-trend` - 月次推移（キャッシュしない）
//!
//! 金額が動く更新はどれもサマリと未納一覧に影響するため、同じ無効化グループを使う。

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

const OVERVIEW_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::ACCOUNTS_OVERVIEW, CacheTtl::Short);
const FEES_PENDING_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::ACCOUNTS_FEES_PENDING, CacheTtl::Short);
const EXPENSES_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::EXPENSES_LIST, CacheTtl::Medium);
const RECEIPTS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::RECEIPTS_LIST, CacheTtl::Medium);
const RECEIPTS_SEARCH_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::RECEIPTS_SEARCH, CacheTtl::Short);

pub const INVALIDATES: &[CacheNamespace] = &[
    CacheNamespace::ACCOUNTS_OVERVIEW,
    CacheNamespace::ACCOUNTS_FEES_PENDING,
    CacheNamespace::EXPENSES_LIST,
    CacheNamespace::RECEIPTS_LIST,
    CacheNamespace::RECEIPTS_SEARCH,
    CacheNamespace::DASHBOARD_HOME,
];

/// GET /api/accounts/overview
pub async fn accounts_overview(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/accounts/overview", OVERVIEW_POLICY).await
}

/// GET /api/accounts/fees-pending
pub async fn fees_pending(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(
        &state,
        &headers,
        query,
        "/api/accounts/fees-pending",
        FEES_PENDING_POLICY,
    )
    .await
}

// --- 経費 ---

/// GET /api/accounts/expenses
pub async fn list_expenses(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/accounts/expenses", EXPENSES_POLICY).await
}

/// POST /api/accounts/expenses
pub async fn create_expense(
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
        "/api/accounts/expenses",
        &body,
        INVALIDATES,
    )
    .await
}

// --- 領収書 ---

/// GET /api/accounts/receipts
pub async fn list_receipts(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/accounts/receipts", RECEIPTS_POLICY).await
}

/// GET /api/accounts/receipts/search
pub async fn search_receipts(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(
        &state,
        &headers,
        query,
        "/api/accounts/receipts/search",
        RECEIPTS_SEARCH_POLICY,
    )
    .await
}

/// POST /api/accounts/receipts/create
pub async fn create_receipt(
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
        "/api/accounts/receipts",
        &body,
        INVALIDATES,
    )
    .await
}

/// GET /api/accounts/receipts/generate/{paymentId}
///
/// 上流の PDF をそのまま返す。
pub async fn generate_receipt_pdf(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(payment_id): Path<String>,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let path = format!("/api/accounts/receipts/{}/pdf", segment(&payment_id));
    state.passthrough_binary(ctx.upstream(Method::GET, path)).await
}

// --- 返金 ---

/// GET /api/accounts/refunds
pub async fn list_refunds(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/accounts/refunds").await
}

/// POST /api/accounts/refunds
pub async fn create_refund(
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
        "/api/accounts/refunds",
        &body,
        INVALIDATES,
    )
    .await
}

// --- 推移 ---

/// GET /api/accounts/enrollment-trend
pub async fn enrollment_trend(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/accounts/enrollment-trend").await
}

/// GET /api/accounts/expenses-trend
pub async fn expenses_trend(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/accounts/expenses-trend").await
}

/// GET /api/accounts/revenue-trend
pub async fn revenue_trend(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/accounts/revenue-trend").await
}
