//! # 公開 API ハンドラ
//!
//! 受験者向けの認証なしエンドポイント。キャッシュは全呼び出し元で共有する。
//!
//! - `GET /api/public/exams?examCode=` - 試験コードから試験情報を引く
//! - `GET /api/public/results?registrationNumber=&action=` - 結果照会 / 受験票 PDF

use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use crate::{
    error::validation_error_response,
    forward::{ForwardContext, segment},
    proxy::{CachePolicy, ProxyState},
};

const EXAMS_POLICY: CachePolicy = CachePolicy::public(CacheNamespace::PUBLIC_EXAMS, CacheTtl::Long);
const RESULTS_POLICY: CachePolicy =
    CachePolicy::public(CacheNamespace::PUBLIC_RESULTS, CacheTtl::Medium);

/// `action` の値
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultAction {
    Result,
    AdmitCard,
}

impl ResultAction {
    /// 省略時は結果照会
    fn parse(value: Option<&str>) -> Option<Self> {
        match value {
            None | Some("result") => Some(Self::Result),
            Some("admit-card") => Some(Self::AdmitCard),
            Some(_) => None,
        }
    }
}

/// GET /api/public/exams?examCode=
pub async fn public_exam(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let exam_code = match ctx.require_query("examCode") {
        Ok(code) => code,
        Err(response) => return response,
    };

    let path = format!("/api/scholarship-exams/public/{}", segment(&exam_code));
    let request = ctx.upstream(Method::GET, path);
    state.cached_get(&ctx, request, EXAMS_POLICY).await
}

/// GET /api/public/results?registrationNumber=&action=
///
/// `action=admit-card` の場合は受験票 PDF をそのまま返す。
pub async fn public_results(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    let ctx = match ForwardContext::from_parts(&headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let registration_number = match ctx.require_query("registrationNumber") {
        Ok(n) => n,
        Err(response) => return response,
    };
    let Some(action) = ResultAction::parse(ctx.query().get("action")) else {
        return validation_error_response("action は result または admit-card を指定してください");
    };

    match action {
        ResultAction::Result => {
            let path = format!(
                "/api/scholarship-exams/public/result/{}",
                segment(&registration_number)
            );
            let request = ctx.upstream(Method::GET, path);
            state.cached_get(&ctx, request, RESULTS_POLICY).await
        }
        ResultAction::AdmitCard => {
            let path = format!(
                "/api/scholarship-exams/public/admit-card/{}",
                segment(&registration_number)
            );
            state.passthrough_binary(ctx.upstream(Method::GET, path)).await
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(None, Some(ResultAction::Result))]
    #[case(Some("result"), Some(ResultAction::Result))]
    #[case(Some("admit-card"), Some(ResultAction::AdmitCard))]
    #[case(Some("delete"), None)]
    fn test_actionのパース(#[case] value: Option<&str>, #[case] expected: Option<ResultAction>) {
        assert_eq!(ResultAction::parse(value), expected);
    }
}
