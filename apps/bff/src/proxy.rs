//! # プロキシとキャッシュの共通処理
//!
//! 全ハンドラが共有する転送ロジック。ハンドラは [`ForwardContext`] を作って
//! 必須パラメータを検証し、ここの操作を 1 つ呼ぶだけにする。
//!
//! | 操作 | 用途 | `X-Cache` |
//! |------|------|-----------|
//! | [`ProxyState::passthrough`] | キャッシュしない GET | `BYPASS` |
//! | [`ProxyState::cached_get`] | リードスルーキャッシュ付き GET | `HIT` / `MISS` |
//! | [`ProxyState::mutate`] | 更新系。成功時に名前空間を無効化する | `BYPASS` |
//! | [`ProxyState::passthrough_binary`] | PDF などのバイナリ中継 | `BYPASS` |
//!
//! キャッシュの障害はリクエストを失敗させない。読み取り失敗はミス扱い、
//! 書き込みと無効化の失敗はログに残して握りつぶす。
//!
//! 2xx のボディは [`shape::success`] で整形する。パスワードなどの秘匿フィールドは
//! ここで取り除くため、キャッシュにもブラウザにも届かない。

mod shape;

use std::sync::Arc;

use axum::{
    Json,
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use edusuite_domain::{
    cache::{CacheKey, CacheNamespace, CacheScope, CacheTtl, KeyPattern},
    tenant::TenantId,
};
use edusuite_infra::ResponseCache;
use edusuite_shared::canonical_log::CACHE_STATUS_HEADER;
use serde_json::Value;
use strum::{Display, IntoStaticStr};

pub use self::shape::DEFAULT_ERROR_MESSAGE;
use crate::{
    client::{UpstreamBody, UpstreamClient, UpstreamRequest, UpstreamResponse},
    error::log_and_convert_upstream_error,
    forward::ForwardContext,
};

/// キャッシュバックエンドを示すレスポンスヘッダー
pub const CACHE_TYPE_HEADER: &str = "x-cache-type";

/// レスポンスのキャッシュ状態（`X-Cache` ヘッダーの値）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
    Bypass,
}

/// ルートごとのキャッシュ方針
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub namespace: CacheNamespace,
    pub scope:     CacheScope,
    pub ttl:       CacheTtl,
}

impl CachePolicy {
    /// テナントと資格情報ごとに分離してキャッシュする
    pub const fn tenant(namespace: CacheNamespace, ttl: CacheTtl) -> Self {
        Self {
            namespace,
            scope: CacheScope::Tenant,
            ttl,
        }
    }

    /// 全呼び出し元で共有してキャッシュする
    pub const fn public(namespace: CacheNamespace, ttl: CacheTtl) -> Self {
        Self {
            namespace,
            scope: CacheScope::Public,
            ttl,
        }
    }

    pub fn key_for(&self, ctx: &ForwardContext) -> CacheKey {
        match self.scope {
            CacheScope::Public => CacheKey::public(self.namespace, ctx.query()),
            CacheScope::Tenant => CacheKey::tenant(
                self.namespace,
                ctx.tenant_id(),
                &ctx.fingerprint(),
                ctx.query(),
            ),
        }
    }
}

/// ハンドラ間で共有する状態
pub struct ProxyState {
    pub upstream: Arc<dyn UpstreamClient>,
    pub cache:    Arc<dyn ResponseCache>,
}

impl ProxyState {
    pub fn new(upstream: Arc<dyn UpstreamClient>, cache: Arc<dyn ResponseCache>) -> Self {
        Self { upstream, cache }
    }

    /// キャッシュせずに転送する
    pub async fn passthrough(&self, request: UpstreamRequest) -> Response {
        let context = request.path().to_string();
        match self.upstream.send(request).await {
            Ok(upstream) => with_cache_status(relay(upstream), CacheStatus::Bypass),
            Err(e) => log_and_convert_upstream_error(&context, e),
        }
    }

    /// バイナリ（PDF など）をそのまま中継する
    ///
    /// 上流が JSON のエラーを返した場合は通常の整形を行う。
    pub async fn passthrough_binary(&self, request: UpstreamRequest) -> Response {
        tracing::debug!(upstream.path = request.path(), "バイナリを中継します");
        self.passthrough(request).await
    }

    /// リードスルーキャッシュ付きで GET を転送する
    ///
    /// クエリに `_ts` があればキャッシュを読まずに上流から取り直し、結果で上書きする。
    pub async fn cached_get(
        &self,
        ctx: &ForwardContext,
        request: UpstreamRequest,
        policy: CachePolicy,
    ) -> Response {
        let key = policy.key_for(ctx);

        if ctx.query().has_cache_buster() {
            tracing::debug!(cache.key = key.as_str(), "キャッシュバスター指定のため再取得します");
        } else {
            match self.cache.get(&key).await {
                Ok(Some(body)) => {
                    tracing::debug!(cache.key = key.as_str(), "キャッシュ HIT");
                    return self.hit_response(body, policy.ttl);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        error.category = "infrastructure",
                        error.kind = "cache",
                        "キャッシュの読み取りに失敗しました（ミスとして扱います）: {}",
                        e
                    );
                }
            }
        }

        tracing::debug!(cache.key = key.as_str(), "キャッシュ MISS");

        let context = request.path().to_string();
        let upstream = match self.upstream.send(request).await {
            Ok(upstream) => upstream,
            Err(e) => return log_and_convert_upstream_error(&context, e),
        };

        let response = match upstream {
            UpstreamResponse {
                status,
                body: UpstreamBody::Json(body),
                set_cookies,
            } if status.is_success() => {
                let shaped = shape::success(body);
                let stored = match self.cache.set(&key, &shaped, policy.ttl).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::warn!(
                            error.category = "infrastructure",
                            error.kind = "cache",
                            "キャッシュへの保存に失敗しました: {}",
                            e
                        );
                        false
                    }
                };
                let mut response = (StatusCode::OK, Json(shaped)).into_response();
                if stored {
                    set_private_max_age(&mut response, policy.ttl);
                }
                append_set_cookies(&mut response, &set_cookies);
                response
            }
            other => relay(other),
        };

        self.with_cache_type(with_cache_status(response, CacheStatus::Miss))
    }

    /// 更新系リクエストを転送し、成功したら関連する名前空間を無効化する
    pub async fn mutate(
        &self,
        ctx: &ForwardContext,
        request: UpstreamRequest,
        invalidations: &[CacheNamespace],
    ) -> Response {
        let context = request.path().to_string();
        let upstream = match self.upstream.send(request).await {
            Ok(upstream) => upstream,
            Err(e) => return log_and_convert_upstream_error(&context, e),
        };

        if upstream.status.is_success() {
            self.invalidate(ctx.tenant_id(), invalidations).await;
        }

        with_cache_status(relay(upstream), CacheStatus::Bypass)
    }

    /// 名前空間のキャッシュを無効化し、削除したキー数を返す
    ///
    /// テナントが分かればそのテナントのキーとテナント不明で保存されたキー、
    /// 分からなければ名前空間全体を消す。
    pub async fn invalidate(&self, tenant_id: Option<&TenantId>, namespaces: &[CacheNamespace]) -> u64 {
        let mut deleted = 0;
        for pattern in namespaces
            .iter()
            .flat_map(|&namespace| invalidation_patterns(namespace, tenant_id))
        {
            match self.cache.delete_pattern(&pattern).await {
                Ok(count) => deleted += count,
                Err(e) => {
                    tracing::warn!(
                        error.category = "infrastructure",
                        error.kind = "cache",
                        cache.pattern = pattern.as_str(),
                        "キャッシュの無効化に失敗しました: {}",
                        e
                    );
                }
            }
        }
        tracing::debug!(cache.deleted = deleted, "キャッシュを無効化しました");
        deleted
    }

    fn hit_response(&self, body: Value, ttl: CacheTtl) -> Response {
        let mut response = (StatusCode::OK, Json(body)).into_response();
        set_private_max_age(&mut response, ttl);
        self.with_cache_type(with_cache_status(response, CacheStatus::Hit))
    }

    fn with_cache_type(&self, mut response: Response) -> Response {
        let backend: &'static str = self.cache.backend().into();
        response.headers_mut().insert(
            HeaderName::from_static(CACHE_TYPE_HEADER),
            HeaderValue::from_static(backend),
        );
        response
    }
}

fn invalidation_patterns(namespace: CacheNamespace, tenant_id: Option<&TenantId>) -> Vec<KeyPattern> {
    match tenant_id {
        Some(tenant_id) => vec![
            KeyPattern::tenant(namespace, tenant_id),
            KeyPattern::unscoped(namespace),
        ],
        None => vec![KeyPattern::namespace(namespace)],
    }
}

/// キャッシュに保存した（またはキャッシュから返す）レスポンスのブラウザ側 TTL
fn set_private_max_age(response: &mut Response, ttl: CacheTtl) {
    if let Ok(value) = HeaderValue::from_str(&format!("private, max-age={}", ttl.as_secs())) {
        response.headers_mut().insert(header::CACHE_CONTROL, value);
    }
}

// --- レスポンス変換 ---

/// 上流レスポンスをブラウザ向けに変換する
///
/// - 2xx の JSON: 200 で `success: true` を補う
/// - 2xx 以外の JSON: 同じステータスで `success: false` と `message` を補う
/// - バイナリ: ステータスと Content-Type をそのまま返す
pub(crate) fn relay(upstream: UpstreamResponse) -> Response {
    let UpstreamResponse {
        status,
        body,
        set_cookies,
    } = upstream;

    let mut response = match body {
        UpstreamBody::Json(body) if status.is_success() => {
            (StatusCode::OK, Json(shape::success(body))).into_response()
        }
        UpstreamBody::Json(body) => (status, Json(shape::failure(body))).into_response(),
        UpstreamBody::Binary {
            content_type,
            bytes,
        } => (status, [(header::CONTENT_TYPE, content_type)], bytes).into_response(),
    };
    append_set_cookies(&mut response, &set_cookies);
    response
}

pub(crate) fn append_set_cookies(response: &mut Response, set_cookies: &[String]) {
    for cookie in set_cookies {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(_) => tracing::warn!("不正な Set-Cookie ヘッダーを破棄しました"),
        }
    }
}

pub(crate) fn with_cache_status(mut response: Response, status: CacheStatus) -> Response {
    let value: &'static str = status.into();
    response.headers_mut().insert(
        HeaderName::from_static(CACHE_STATUS_HEADER),
        HeaderValue::from_static(value),
    );
    response
}
