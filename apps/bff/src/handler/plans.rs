//! # 料金プラン API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/subscription-plans/public` - 公開プラン
//! - `GET /api/subscription/plans` - 全プラン（上流は `/api/subscription-plans/public/all`）
//! - `GET /api/subscription/plans/{planId}` - プラン 1 件（チェックアウト画面用）
//!
//! 上流にはプラン 1 件の取得がないため、全プランを取得して `id` で探す。

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use edusuite_domain::cache::{CacheNamespace, CacheTtl};
use serde_json::{Value, json};

use super::forward_cached;
use crate::{
    client::{UpstreamBody, UpstreamResponse},
    error::log_and_convert_upstream_error,
    forward::ForwardContext,
    proxy::{CachePolicy, CacheStatus, ProxyState, relay, with_cache_status},
};

/// プランは全テナント共通で滅多に変わらない
const PUBLIC_POLICY: CachePolicy = CachePolicy::public(CacheNamespace::PLANS_PUBLIC, CacheTtl::Hour);
const ALL_POLICY: CachePolicy = CachePolicy::public(CacheNamespace::PLANS_ALL, CacheTtl::Hour);

const ALL_PLANS_PATH: &str = "/api/subscription-plans/public/all";

/// 無料扱いのプラン ID
const FREE_PLAN_IDS: &[&str] = &["trial", "free"];

/// GET /api/subscription-plans/public
pub async fn public_plans(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(
        &state,
        &headers,
        query,
        "/api/subscription-plans/public",
        PUBLIC_POLICY,
    )
    .await
}

/// GET /api/subscription/plans
pub async fn subscription_plans(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, ALL_PLANS_PATH, ALL_POLICY).await
}

/// GET /api/subscription/plans/{plan_id}
///
/// 見つからなければ 404。チェックアウト直前の確認のためキャッシュしない。
#[tracing::instrument(skip_all)]
pub async fn subscription_plan(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(plan_id): Path<String>,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };

    let upstream = match state.upstream.send(ctx.upstream(Method::GET, ALL_PLANS_PATH)).await {
        Ok(upstream) => upstream,
        Err(e) => return log_and_convert_upstream_error("プラン取得", e),
    };

    let response = match upstream {
        UpstreamResponse {
            status,
            body: UpstreamBody::Json(body),
            ..
        } if status.is_success() => match find_plan(&body, &plan_id) {
            Some(plan) => Json(json!({"success": true, "plan": plan})).into_response(),
            None => {
                tracing::debug!(plan.id = %plan_id, "プランが見つかりません");
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({"success": false, "message": "プランが見つかりません"})),
                )
                    .into_response()
            }
        },
        other => relay(other),
    };
    with_cache_status(response, CacheStatus::Bypass)
}

/// `plans` 配列から `id` が一致するプランを探し、`isFree` を付けて返す
fn find_plan(body: &Value, plan_id: &str) -> Option<Value> {
    let plan = body
        .get("plans")?
        .as_array()?
        .iter()
        .find(|plan| plan.get("id").and_then(Value::as_str) == Some(plan_id))?;

    let is_free = FREE_PLAN_IDS.contains(&plan_id)
        || matches!(plan.get("monthlyPrice"), Some(Value::String(price)) if price == "Free")
        || plan.get("monthlyPrice").and_then(Value::as_f64) == Some(0.0);

    let mut plan = plan.clone();
    if let Value::Object(map) = &mut plan {
        map.insert("isFree".to_string(), Value::Bool(is_free));
    }
    Some(plan)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn plans() -> Value {
        json!({"plans": [
            {"id": "trial", "monthlyPrice": 0},
            {"id": "basic", "monthlyPrice": 999},
            {"id": "starter", "monthlyPrice": "Free"}
        ]})
    }

    #[rstest]
    #[case("trial", true)]
    #[case("basic", false)]
    #[case("starter", true)]
    fn test_find_planはidで探してis_freeを付ける(#[case] id: &str, #[case] is_free: bool) {
        let plan = find_plan(&plans(), id).unwrap();
        assert_eq!(plan["id"], id);
        assert_eq!(plan["isFree"], is_free);
    }

    #[test]
    fn test_find_planは該当なしでnone() {
        assert_eq!(find_plan(&plans(), "enterprise"), None);
        assert_eq!(find_plan(&json!({}), "basic"), None);
    }
}
