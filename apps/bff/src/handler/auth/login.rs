//! ログイン・サインアップ・ログアウト

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;

use crate::{
    forward::{ForwardContext, parse_body, require_body_field},
    proxy::ProxyState,
};

const LOGIN_REQUIRED: &[&str] = &["email", "password"];
const SIGNUP_REQUIRED: &[&str] = &["email", "password", "name", "instituteName"];

/// POST /api/auth/login
///
/// 上流が発行した JWT Cookie を `Set-Cookie` でそのまま返す。
#[tracing::instrument(skip_all)]
pub async fn login(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_with_required(&state, &headers, query, &body, "/api/auth/login", LOGIN_REQUIRED).await
}

/// POST /api/auth/signup
#[tracing::instrument(skip_all)]
pub async fn signup(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_with_required(&state, &headers, query, &body, "/api/auth/signup", SIGNUP_REQUIRED).await
}

/// POST /api/auth/logout
///
/// Cookie を消す `Set-Cookie` を上流から中継する。
pub async fn logout(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_with_required(&state, &headers, query, &body, "/api/auth/logout", &[]).await
}

/// 必須フィールドを検証してから POST を転送する
async fn forward_with_required(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    body: &Bytes,
    path: &str,
    required: &[&str],
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };
    for field in required {
        if let Err(response) = require_body_field(body.as_ref(), field) {
            return response;
        }
    }

    let mut request = ctx.upstream(Method::POST, path);
    if let Some(body) = body {
        request = request.json(body);
    }
    state.passthrough(request).await
}
