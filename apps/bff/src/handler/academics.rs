//! # 学務 API ハンドラ
//!
//! バッチ（クラス）管理と、テスト単位の出欠・成績の登録を提供する。
//!
//! ## エンドポイント
//!
//! - `GET /api/academics/batches` - バッチ一覧
//! - `POST /api/academics/batches` - バッチ作成
//! - `PUT /api/academics/batches/{id}` - バッチ更新
//! - `DELETE /api/academics/batches/{id}` - バッチ削除
//! - `GET /api/academics/attendance?testId=` - テストの出欠
//! - `POST /api/academics/attendance` - テストの出欠登録（ボディに `testId`）
//! - `GET /api/academics/marks?testId=` - テストの成績
//! - `POST /api/academics/marks` - テストの成績登録（ボディに `testId`）
//! - `GET /api/academics/tests` / `POST` - テスト一覧と作成
//! - `GET /api/academics/tests/{id}` / `PUT` / `DELETE` - テスト詳細・更新・削除
//! - `GET /api/academics/students/{studentId}/tests` - 生徒別のテスト結果
//!
//! 出欠・成績は上流ではテスト ID をパスに含む
//! （`/api/academics/tests/{testId}/attendance` など）ため、ここで書き換える。

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_get, forward_mutation};
use crate::{
    forward::{ForwardContext, parse_body, require_body_id, segment},
    proxy::{CachePolicy, ProxyState},
};

const BATCHES_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::BATCHES_LIST, CacheTtl::Long);

/// 出欠は授業中に更新されるため短めにする
const ATTENDANCE_POLICY: CachePolicy = CachePolicy::tenant(
    CacheNamespace::ATTENDANCE,
    CacheTtl::Custom(Duration::from_secs(3 * 60)),
);

const TESTS_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::TESTS_LIST, CacheTtl::Medium);
const STUDENT_TESTS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::STUDENT_TESTS, CacheTtl::Medium);

pub const BATCHES_INVALIDATES: &[CacheNamespace] = &[CacheNamespace::BATCHES_LIST];

pub const ATTENDANCE_INVALIDATES: &[CacheNamespace] = &[CacheNamespace::ATTENDANCE];

/// 成績はダッシュボードの集計と生徒別のテスト結果に反映される
pub const MARKS_INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::DASHBOARD_HOME, CacheNamespace::STUDENT_TESTS];

pub const TESTS_INVALIDATES: &[CacheNamespace] =
    &[CacheNamespace::TESTS_LIST, CacheNamespace::STUDENT_TESTS];

fn test_path(test_id: &str, resource: &str) -> String {
    format!("/api/academics/tests/{}/{}", segment(test_id), resource)
}

// --- バッチ ---

/// GET /api/academics/batches
pub async fn list_batches(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/academics/batches", BATCHES_POLICY).await
}

/// POST /api/academics/batches
pub async fn create_batch(
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
        "/api/academics/batches",
        &body,
        BATCHES_INVALIDATES,
    )
    .await
}

/// PUT /api/academics/batches/{id}
pub async fn update_batch(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/academics/batches/{}", segment(&id));
    forward_mutation(&state, &headers, query, Method::PUT, &path, &body, BATCHES_INVALIDATES).await
}

/// DELETE /api/academics/batches/{id}
pub async fn delete_batch(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("/api/academics/batches/{}", segment(&id));
    forward_mutation(
        &state,
        &headers,
        query,
        Method::DELETE,
        &path,
        &body,
        BATCHES_INVALIDATES,
    )
    .await
}

// --- テスト ---

fn test_item_path(id: &str) -> String {
    format!("/api/academics/tests/{}", segment(id))
}

/// GET /api/academics/tests
pub async fn list_tests(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/academics/tests", TESTS_POLICY).await
}

/// POST /api/academics/tests
pub async fn create_test(
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
        "/api/academics/tests",
        &body,
        TESTS_INVALIDATES,
    )
    .await
}

/// GET /api/academics/tests/{id}
pub async fn get_test(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    forward_get(&state, &headers, query, &test_item_path(&id)).await
}

/// PUT /api/academics/tests/{id}
pub async fn update_test(
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
        Method::PUT,
        &test_item_path(&id),
        &body,
        TESTS_INVALIDATES,
    )
    .await
}

/// DELETE /api/academics/tests/{id}
pub async fn delete_test(
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
        &test_item_path(&id),
        &body,
        TESTS_INVALIDATES,
    )
    .await
}

/// GET /api/academics/students/{student_id}/tests
///
/// 生徒 ID をキャッシュキーに含める。
pub async fn student_tests(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(student_id): Path<String>,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx.with_key_param("studentId", &student_id),
        Err(response) => return response,
    };
    let path = format!("/api/academics/students/{}/tests", segment(&student_id));
    let request = ctx.upstream(Method::GET, path);
    state.cached_get(&ctx, request, STUDENT_TESTS_POLICY).await
}

// --- 出欠・成績 ---

/// GET /api/academics/attendance?testId=
#[tracing::instrument(skip_all)]
pub async fn get_attendance(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let test_id = match ctx.require_query("testId") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let request = ctx.upstream(Method::GET, test_path(&test_id, "attendance"));
    state.cached_get(&ctx, request, ATTENDANCE_POLICY).await
}

/// POST /api/academics/attendance
pub async fn save_attendance(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    post_for_test(&state, &headers, query, &body, "attendance", ATTENDANCE_INVALIDATES).await
}

/// GET /api/academics/marks?testId=
pub async fn get_marks(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let test_id = match ctx.require_query("testId") {
        Ok(id) => id,
        Err(response) => return response,
    };

    state
        .passthrough(ctx.upstream(Method::GET, test_path(&test_id, "marks")))
        .await
}

/// POST /api/academics/marks
pub async fn save_marks(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    post_for_test(&state, &headers, query, &body, "marks", MARKS_INVALIDATES).await
}

/// ボディの `testId` から上流パスを組み立てて POST する
async fn post_for_test(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    body: &Bytes,
    resource: &str,
    invalidations: &[CacheNamespace],
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let test_id = match require_body_id(body.as_ref(), "testId") {
        Ok(id) => id,
        Err(response) => return response,
    };

    let mut request = ctx.upstream(Method::POST, test_path(&test_id, resource));
    if let Some(body) = body {
        request = request.json(body);
    }
    state.mutate(&ctx, request, invalidations).await
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_テストidはパスセグメントとしてエンコードされる() {
        assert_eq!(
            test_path("t/1", "attendance"),
            "/api/academics/tests/t%2F1/attendance"
        );
    }
}
