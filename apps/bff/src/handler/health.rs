//! # ヘルスチェックハンドラ
//!
//! BFF の稼働状態を確認するためのエンドポイント。
//!
//! - `/health`: Liveness Check（常に `"healthy"` を返す）
//! - `/health/ready`: Readiness Check（キャッシュと上流 API の疎通を確認）
//!
//! レスポンス型は [`edusuite_shared::HealthResponse`] / [`edusuite_shared::ReadinessResponse`] を参照。

use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use edusuite_shared::{CheckStatus, HealthResponse, ReadinessResponse};

use crate::proxy::ProxyState;

/// 依存先 1 つあたりのチェックのタイムアウト
const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// BFF のヘルスチェックエンドポイント
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status:  "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// BFF の Readiness Check エンドポイント
///
/// キャッシュと上流 API の接続状態を並行チェックする。
/// 全チェック OK → 200、1 つでも失敗 → 503。
#[tracing::instrument(skip_all)]
pub async fn readiness_check(State(state): State<Arc<ProxyState>>) -> impl IntoResponse {
    let (cache_result, upstream_result) =
        tokio::join!(check_cache(&state), check_upstream(&state));

    let mut checks = HashMap::new();
    checks.insert("cache".to_string(), cache_result);
    checks.insert("upstream".to_string(), upstream_result);

    let response = ReadinessResponse::from_checks(checks);
    let http_status = if response.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (http_status, Json(response))
}

/// キャッシュを PING で確認する
async fn check_cache(state: &ProxyState) -> CheckStatus {
    match tokio::time::timeout(CHECK_TIMEOUT, state.cache.ping()).await {
        Ok(Ok(())) => CheckStatus::Ok,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: cache ping failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: cache check timed out");
            CheckStatus::Error
        }
    }
}

/// 上流 API に到達できるか確認する
///
/// 5xx 以外はすべて到達可能とみなす（ヘルスパスが 404 でもプロセスは生きている）。
async fn check_upstream(state: &ProxyState) -> CheckStatus {
    match tokio::time::timeout(CHECK_TIMEOUT, state.upstream.ping()).await {
        Ok(Ok(status)) if !status.is_server_error() => CheckStatus::Ok,
        Ok(Ok(status)) => {
            tracing::warn!(status = %status, "readiness check: upstream returned server error");
            CheckStatus::Error
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "readiness check: upstream request failed");
            CheckStatus::Error
        }
        Err(_) => {
            tracing::warn!("readiness check: upstream check timed out");
            CheckStatus::Error
        }
    }
}
