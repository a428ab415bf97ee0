//! # 従業員 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/employees` - 従業員一覧（キャッシュ 3 分）
//! - `POST /api/employees` - 従業員登録
//! - `PUT /api/employees/{id}` / `DELETE` - 従業員更新・削除
//! - `POST /api/employees/{id}?action=` - ログイン発行（`create-login`）、
//!   パスワード再設定（`reset-password`）。`action` がなければ `/api/employees/{id}` へ POST
//!
//! 従業員はユーザー一覧にも現れるため、更新時は両方消す。

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl, QueryParams};

use super::{forward_cached, forward_mutation};
use crate::{
    forward::segment,
    proxy::{CachePolicy, ProxyState},
};

const LIST_POLICY: CachePolicy = CachePolicy::tenant(
    CacheNamespace::EMPLOYEES_LIST,
    CacheTtl::Custom(Duration::from_secs(3 * 60)),
);

pub const INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::EMPLOYEES_LIST, CacheNamespace::USERS_LIST];

/// 上流に個別エンドポイントがある従業員アクション
const ACTIONS: &[&str] = &["create-login", "reset-password"];

fn employee_path(id: &str) -> String {
    format!("/api/employees/{}", segment(id))
}

/// `action` クエリに対応する上流パス
///
/// 未知の `action` は従業員本体への POST として扱う。
fn action_path(id: &str, raw_query: Option<&str>) -> String {
    let query = QueryParams::parse(raw_query);
    match query.get("action") {
        Some(action) if ACTIONS.contains(&action) => format!("{}/{}", employee_path(id), action),
        _ => employee_path(id),
    }
}

/// GET /api/employees
pub async fn list_employees(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/employees", LIST_POLICY).await
}

/// POST /api/employees
pub async fn create_employee(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(&state, &headers, query, Method::POST, "/api/employees", &body, INVALIDATES)
        .await
}

/// PUT /api/employees/{id}
pub async fn update_employee_record(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    forward_mutation(&state, &headers, query, Method::PUT, &employee_path(&id), &body, INVALIDATES)
        .await
}

/// DELETE /api/employees/{id}
pub async fn delete_employee_record(
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
        &employee_path(&id),
        &body,
        INVALIDATES,
    )
    .await
}

/// POST /api/employees/{id}?action=
pub async fn employee_action(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = action_path(&id, query.as_deref());
    forward_mutation(&state, &headers, query, Method::POST, &path, &body, INVALIDATES).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Some("action=create-login"), "/api/employees/e1/create-login")]
    #[case(Some("action=reset-password"), "/api/employees/e1/reset-password")]
    #[case(Some("action=promote"), "/api/employees/e1")]
    #[case(None, "/api/employees/e1")]
    fn test_actionに応じて上流パスを選ぶ(#[case] query: Option<&str>, #[case] expected: &str) {
        assert_eq!(action_path("e1", query), expected);
    }
}
