//! # 転送コンテキスト
//!
//! ブラウザからのリクエストから、上流 API へ転送する情報を取り出す。
//!
//! - `Cookie` / `Authorization` はそのまま転送する
//! - テナント ID は `X-Tenant-ID` ヘッダー、なければ `tenantId` クエリパラメータ
//! - クエリ文字列は上流へそのまま転送し、キャッシュキー用にパース済みの形も保持する
//!
//! 必須パラメータの検証はここで行い、欠けていれば上流を呼ぶ前に 400 を返す。

use std::borrow::Cow;

use axum::{
    http::{HeaderMap, Method, header},
    response::Response,
};
use axum_extra::extract::CookieJar;
use bytes::Bytes;
use edusuite_domain::{
    cache::{CredentialFingerprint, QueryParams},
    tenant::TenantId,
};
use serde_json::Value;

use crate::{
    client::{UpstreamRequest, upstream::TENANT_ID_HEADER},
    error::validation_error_response,
};

/// JWT を保持する Cookie 名
const JWT_COOKIE_NAME: &str = "jwt";

/// テナント ID を渡すクエリパラメータ名
const TENANT_ID_PARAM: &str = "tenantId";

/// 上流へ転送するリクエスト情報
#[derive(Debug, Clone)]
pub struct ForwardContext {
    cookie:        Option<String>,
    authorization: Option<String>,
    jwt_cookie:    Option<String>,
    tenant_id:     Option<TenantId>,
    raw_query:     Option<String>,
    query:         QueryParams,
}

impl ForwardContext {
    /// ヘッダーと生のクエリ文字列から作成する
    ///
    /// テナント ID が指定されていて形式が不正な場合は 400 を返す。
    pub fn from_parts(headers: &HeaderMap, raw_query: Option<String>) -> Result<Self, Response> {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let query = QueryParams::parse(raw_query.as_deref());

        let tenant_id = match header_str(TENANT_ID_HEADER) {
            Some(value) => Some(TenantId::parse(&value).map_err(|_| {
                validation_error_response("X-Tenant-ID の形式が不正です")
            })?),
            None => match query.get(TENANT_ID_PARAM) {
                Some(value) => Some(TenantId::parse(value).map_err(|_| {
                    validation_error_response("tenantId の形式が不正です")
                })?),
                None => None,
            },
        };

        let jwt_cookie = CookieJar::from_headers(headers)
            .get(JWT_COOKIE_NAME)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty());

        Ok(Self {
            cookie: header_str(header::COOKIE.as_str()),
            authorization: header_str(header::AUTHORIZATION.as_str()),
            jwt_cookie,
            tenant_id,
            raw_query: raw_query.filter(|q| !q.is_empty()),
            query,
        })
    }

    pub fn tenant_id(&self) -> Option<&TenantId> {
        self.tenant_id.as_ref()
    }

    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    pub fn raw_query(&self) -> Option<&str> {
        self.raw_query.as_deref()
    }

    /// パスパラメータをキャッシュキー用のクエリに加える
    ///
    /// 上流へ転送するクエリ文字列は変えない。
    pub fn with_key_param(mut self, name: &str, value: &str) -> Self {
        self.query = std::mem::take(&mut self.query).with(name, value);
        self
    }

    /// 必須のクエリパラメータを取得する
    pub fn require_query(&self, name: &str) -> Result<String, Response> {
        self.query
            .get(name)
            .map(str::to_string)
            .ok_or_else(|| validation_error_response(&format!("{name} は必須です")))
    }

    /// Bearer トークンを取得する
    ///
    /// `Authorization: Bearer ...` を優先し、なければ `jwt` Cookie を使う。
    pub fn bearer_token(&self) -> Option<String> {
        let from_header = self
            .authorization
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        from_header.or_else(|| self.jwt_cookie.clone())
    }

    /// 資格情報のフィンガープリント（キャッシュキー用）
    pub fn fingerprint(&self) -> CredentialFingerprint {
        CredentialFingerprint::from_credentials(
            self.cookie.as_deref(),
            self.authorization.as_deref(),
        )
    }

    /// 資格情報・テナント・クエリを引き継いだ上流リクエストを作る
    pub fn upstream(&self, method: Method, path: impl Into<String>) -> UpstreamRequest {
        UpstreamRequest::new(method, path)
            .query(self.raw_query())
            .cookie(self.cookie.clone())
            .authorization(self.authorization.clone())
            .tenant(self.tenant_id.clone())
    }
}

// --- ボディ ---

/// リクエストボディを JSON としてパースする
///
/// 空ボディは `None`。JSON として不正なら 400。
pub fn parse_body(bytes: &Bytes) -> Result<Option<Value>, Response> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|_| validation_error_response("リクエストボディが不正な JSON です"))
}

/// 必須のボディフィールドを取得する
///
/// 欠落、`null`、空文字列はいずれも 400。
pub fn require_body_field<'a>(body: Option<&'a Value>, name: &str) -> Result<&'a Value, Response> {
    match body.and_then(|b| b.get(name)) {
        None | Some(Value::Null) => Err(validation_error_response(&format!("{name} は必須です"))),
        Some(Value::String(s)) if s.trim().is_empty() => {
            Err(validation_error_response(&format!("{name} は必須です")))
        }
        Some(value) => Ok(value),
    }
}

/// 必須のボディフィールドをパスセグメント用の文字列として取得する
///
/// 文字列と数値のみ受け付ける。
pub fn require_body_id(body: Option<&Value>, name: &str) -> Result<String, Response> {
    match require_body_field(body, name)? {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(validation_error_response(&format!(
            "{name} の形式が不正です"
        ))),
    }
}

/// パスパラメータを上流パスに埋め込むためにエンコードする
pub fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderValue, StatusCode};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_テナントidはヘッダーを優先する() {
        let ctx = ForwardContext::from_parts(
            &headers(&[("x-tenant-id", "from-header")]),
            Some("tenantId=from-query".to_string()),
        )
        .unwrap();

        assert_eq!(ctx.tenant_id().unwrap().as_str(), "from-header");
    }

    #[test]
    fn test_ヘッダーがなければクエリのtenant_idを使う() {
        let ctx =
            ForwardContext::from_parts(&HeaderMap::new(), Some("tenantId=t1&page=2".to_string()))
                .unwrap();

        assert_eq!(ctx.tenant_id().unwrap().as_str(), "t1");
    }

    #[test]
    fn test_不正なテナントidは400() {
        let result = ForwardContext::from_parts(&headers(&[("x-tenant-id", "t1:*")]), None);

        assert_eq!(result.unwrap_err().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_require_queryで欠落と空文字は400() {
        let ctx =
            ForwardContext::from_parts(&HeaderMap::new(), Some("testId=".to_string())).unwrap();

        assert_eq!(
            ctx.require_query("testId").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ctx.require_query("examCode").unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_bearer_tokenはauthorizationヘッダーを優先する() {
        let ctx = ForwardContext::from_parts(
            &headers(&[("authorization", "Bearer header-token"), ("cookie", "jwt=cookie-token")]),
            None,
        )
        .unwrap();

        assert_eq!(ctx.bearer_token().as_deref(), Some("header-token"));
    }

    #[test]
    fn test_bearer_tokenはjwt_cookieにフォールバックする() {
        let ctx = ForwardContext::from_parts(
            &headers(&[("cookie", "theme=dark; jwt=cookie-token")]),
            None,
        )
        .unwrap();

        assert_eq!(ctx.bearer_token().as_deref(), Some("cookie-token"));
    }

    #[test]
    fn test_bearer_tokenは空のbearerを無視する() {
        let ctx = ForwardContext::from_parts(&headers(&[("authorization", "Bearer ")]), None).unwrap();

        assert_eq!(ctx.bearer_token(), None);
    }

    #[test]
    fn test_upstreamは資格情報とクエリを引き継ぐ() {
        let ctx = ForwardContext::from_parts(
            &headers(&[("cookie", "jwt=abc"), ("x-tenant-id", "t1")]),
            Some("page=2".to_string()),
        )
        .unwrap();

        let request = ctx.upstream(Method::GET, "/api/students");

        assert_eq!(request.path_and_query, "/api/students?page=2");
        assert_eq!(request.cookie.as_deref(), Some("jwt=abc"));
        assert_eq!(request.tenant_id.unwrap().as_str(), "t1");
    }

    #[test]
    fn test_with_key_paramは上流へのクエリを変えない() {
        let ctx = ForwardContext::from_parts(&HeaderMap::new(), Some("page=2".to_string()))
            .unwrap()
            .with_key_param("examId", "e1");

        assert_eq!(ctx.query().get("examId"), Some("e1"));
        assert_eq!(
            ctx.upstream(Method::GET, "/api/x").path_and_query,
            "/api/x?page=2"
        );
    }

    #[test]
    fn test_資格情報が異なればフィンガープリントも異なる() {
        let a = ForwardContext::from_parts(&headers(&[("cookie", "jwt=a")]), None).unwrap();
        let b = ForwardContext::from_parts(&headers(&[("cookie", "jwt=b")]), None).unwrap();
        let anon = ForwardContext::from_parts(&HeaderMap::new(), None).unwrap();

        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_eq!(anon.fingerprint().as_str(), "anon");
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body(&Bytes::new()).unwrap(), None);
        assert_eq!(
            parse_body(&Bytes::from_static(br#"{"a":1}"#)).unwrap(),
            Some(json!({"a": 1}))
        );
        assert_eq!(
            parse_body(&Bytes::from_static(b"{oops")).unwrap_err().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_require_body_fieldは欠落_null_空文字を拒否する() {
        let body = json!({"email": "a@b.c", "password": "", "name": null});

        assert!(require_body_field(Some(&body), "email").is_ok());
        assert!(require_body_field(Some(&body), "password").is_err());
        assert!(require_body_field(Some(&body), "name").is_err());
        assert!(require_body_field(Some(&body), "instituteName").is_err());
        assert!(require_body_field(None, "email").is_err());
    }

    #[test]
    fn test_require_body_idは文字列と数値を受け付ける() {
        let body = json!({"testId": "t-1", "n": 42, "obj": {}});

        assert_eq!(require_body_id(Some(&body), "testId").unwrap(), "t-1");
        assert_eq!(require_body_id(Some(&body), "n").unwrap(), "42");
        assert!(require_body_id(Some(&body), "obj").is_err());
    }

    #[test]
    fn test_segmentはパス区切りをエンコードする() {
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
