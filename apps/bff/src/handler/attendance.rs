//! # 生徒別出欠 API ハンドラ
//!
//! - `GET /api/attendance/student/{studentId}` - 生徒の出欠履歴（期間などのクエリはそのまま転送）

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::HeaderMap,
    response::Response,
};

use super::forward_get;
use crate::{forward::segment, proxy::ProxyState};

/// GET /api/attendance/student/{studentId}
pub async fn student_attendance(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(student_id): Path<String>,
) -> Response {
    let path = format!("/api/attendance/student/{}", segment(&student_id));
    forward_get(&state, &headers, query, &path).await
}
