//! ログイン中ユーザーの取得
//!
//! 上流のユーザーオブジェクトにはパスワードハッシュなどが含まれうるため、
//! フロントエンドが使うフィールドだけを詰め直して返す。

use std::sync::Arc;

use axum::{
    Json,
    extract::{RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    client::{UpstreamBody, UpstreamRequest, UpstreamResponse},
    error::{log_and_convert_upstream_error, unauthorized_response},
    forward::ForwardContext,
    proxy::{CacheStatus, ProxyState, append_set_cookies, relay, with_cache_status},
};

const ME_NOT_AUTHENTICATED: &str = "認証されていません";
const TOKEN_INVALID: &str = "トークンが無効または期限切れです";

// --- レスポンス型 ---

/// `/api/auth/me` のユーザー
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeUserData {
    pub id:              Value,
    pub email:           Value,
    pub name:            Value,
    pub role:            Value,
    pub tenant_id:       Value,
    pub profile_picture: Value,
}

impl MeUserData {
    fn from_upstream(source: &UserSource<'_>) -> Self {
        Self {
            id:              source.field("id"),
            email:           source.field("email"),
            name:            source.field("name"),
            role:            source.field("role"),
            tenant_id:       source.field("tenantId"),
            profile_picture: source.field("profilePicture"),
        }
    }
}

/// `/api/unified/me` のユーザー（テナントと契約情報を含む）
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedUserData {
    pub id:                  Value,
    pub email:               Value,
    pub name:                Value,
    pub role:                Value,
    pub tenant_id:           Value,
    pub subdomain:           Value,
    pub tenant:              Value,
    pub trial_end_date:      Value,
    pub plan:                Value,
    pub subscription_status: Value,
}

impl UnifiedUserData {
    fn from_upstream(source: &UserSource<'_>) -> Self {
        Self {
            id:                  source.field("id"),
            email:               source.field("email"),
            name:                source.field("name"),
            role:                source.field("role"),
            tenant_id:           source.field("tenantId"),
            subdomain:           source.field("subdomain"),
            tenant:              source.field("tenant"),
            trial_end_date:      source.field("trialEndDate"),
            plan:                source.field("plan"),
            subscription_status: source.field("subscriptionStatus"),
        }
    }
}

/// ユーザー取得レスポンス
///
/// 失敗時は `user: null` と `message` を返す。
#[derive(Debug, Serialize)]
pub struct UserEnvelope<T> {
    pub success: bool,
    pub user:    Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> UserEnvelope<T> {
    fn ok(user: T) -> Self {
        Self {
            success: true,
            user:    Some(user),
            message: None,
        }
    }

    fn rejected(message: String) -> Self {
        Self {
            success: false,
            user:    None,
            message: Some(message),
        }
    }
}

/// 上流ボディからユーザーのフィールドを引く
///
/// `user` オブジェクトを優先し、なければトップレベルを見る。
struct UserSource<'a>(&'a Value);

impl UserSource<'_> {
    fn field(&self, name: &str) -> Value {
        self.0
            .get("user")
            .and_then(|user| user.get(name))
            .filter(|v| !v.is_null())
            .or_else(|| self.0.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

fn upstream_message(body: &Value, default: &str) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

// --- ハンドラ ---

/// GET /api/auth/me
///
/// Cookie を上流に転送し、安全なフィールドだけを返す。
/// 上流が 401 の場合は `{ success: false, user: null }` を 401 で返す。
#[tracing::instrument(skip_all)]
pub async fn me(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    let upstream = match state.upstream.send(ctx.upstream(Method::GET, "/api/auth/me")).await {
        Ok(upstream) => upstream,
        Err(e) => return log_and_convert_upstream_error("ユーザー情報取得", e),
    };

    let response = user_response(upstream, ME_NOT_AUTHENTICATED, |body| {
        MeUserData::from_upstream(&UserSource(body))
    });
    with_cache_status(response, CacheStatus::Bypass)
}

/// GET /api/unified/me
///
/// `Authorization: Bearer` または `jwt` Cookie のトークンを上流の
/// `POST /api/auth/validate-token` で検証する。トークンがなければ上流を呼ばずに 401。
#[tracing::instrument(skip_all)]
pub async fn unified_me(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let Some(token) = ctx.bearer_token() else {
        tracing::debug!("Bearer トークンがありません");
        return unauthorized_response();
    };

    let request = UpstreamRequest::new(Method::POST, "/api/auth/validate-token")
        .authorization(Some(format!("Bearer {token}")))
        .tenant(ctx.tenant_id().cloned());
    let upstream = match state.upstream.send(request).await {
        Ok(upstream) => upstream,
        Err(e) => return log_and_convert_upstream_error("トークン検証", e),
    };

    let response = user_response(upstream, TOKEN_INVALID, |body| {
        UnifiedUserData::from_upstream(&UserSource(body))
    });
    with_cache_status(response, CacheStatus::Bypass)
}

/// 上流のユーザー応答を変換する
///
/// - 2xx の JSON: `to_user` で詰め直す
/// - 401: `user: null` の 401
/// - それ以外: 通常の中継
fn user_response<T, F>(upstream: UpstreamResponse, unauthorized_message: &str, to_user: F) -> Response
where
    T: Serialize,
    F: FnOnce(&Value) -> T,
{
    let UpstreamResponse {
        status,
        body,
        set_cookies,
    } = upstream;

    let mut response = match body {
        UpstreamBody::Json(body) if status.is_success() => {
            Json(UserEnvelope::ok(to_user(&body))).into_response()
        }
        UpstreamBody::Json(body) if status == StatusCode::UNAUTHORIZED => {
            let envelope =
                UserEnvelope::<T>::rejected(upstream_message(&body, unauthorized_message));
            (StatusCode::UNAUTHORIZED, Json(envelope)).into_response()
        }
        body => {
            return relay(UpstreamResponse {
                status,
                body,
                set_cookies,
            });
        }
    };
    append_set_cookies(&mut response, &set_cookies);
    response
}
