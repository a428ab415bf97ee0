//! UpstreamClient の reqwest 実装

use std::time::Duration;

use async_trait::async_trait;
use edusuite_shared::observability::REQUEST_ID_HEADER;
use http::{StatusCode, header};

use super::{
    UpstreamClient,
    error::UpstreamError,
    request::UpstreamRequest,
    response::{UpstreamResponse, parse_response},
};
use crate::middleware::request_id::current_request_id;

/// テナント ID を運ぶヘッダー
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// 上流にテナント境界の検証を求めるヘッダー
const TENANT_GUARD_HEADER: &str = "x-tenant-guard";

/// 上流 API クライアント実装
#[derive(Clone)]
pub struct UpstreamClientImpl {
    base_url:    String,
    health_path: String,
    client:      reqwest::Client,
}

impl UpstreamClientImpl {
    /// 新しい UpstreamClient を作成する
    ///
    /// # 引数
    ///
    /// - `base_url`: 上流 API のベース URL（例: `http://localhost:5050`）
    /// - `timeout`: 1 リクエストあたりのタイムアウト
    /// - `health_path`: Readiness Check で叩くパス
    pub fn new(
        base_url: &str,
        timeout: Duration,
        health_path: &str,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            health_path: health_path.to_string(),
            client,
        })
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    fn build(&self, request: &UpstreamRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(request.method.clone(), self.url(&request.path_and_query));

        if let Some(cookie) = &request.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if let Some(authorization) = &request.authorization {
            builder = builder.header(header::AUTHORIZATION, authorization);
        }
        if let Some(tenant_id) = &request.tenant_id {
            builder = builder
                .header(TENANT_ID_HEADER, tenant_id.as_str())
                .header(TENANT_GUARD_HEADER, "true");
        }
        if let Some(request_id) = &request.request_id {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }

        match &request.body {
            Some(body) => builder.json(body),
            None => builder.header(header::CONTENT_TYPE, "application/json"),
        }
    }
}

#[async_trait]
impl UpstreamClient for UpstreamClientImpl {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        tracing::debug!(
            upstream.method = %request.method,
            upstream.path = request.path(),
            "上流 API を呼び出します"
        );

        let response = self.build(&request).send().await?;
        parse_response(response).await
    }

    async fn ping(&self) -> Result<StatusCode, UpstreamError> {
        let mut builder = self.client.get(self.url(&self.health_path));
        if let Some(request_id) = current_request_id() {
            builder = builder.header(REQUEST_ID_HEADER, request_id);
        }
        let response = builder.send().await?;
        Ok(response.status())
    }
}

#[cfg(test)]
mod tests {
    use edusuite_domain::tenant::TenantId;
    use http::Method;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn client() -> UpstreamClientImpl {
        UpstreamClientImpl::new("http://upstream.test/", Duration::from_secs(5), "/health").unwrap()
    }

    #[test]
    fn test_ベースurlの末尾スラッシュを取り除く() {
        assert_eq!(client().url("/api/students"), "http://upstream.test/api/students");
    }

    #[test]
    fn test_資格情報とテナントをヘッダーで転送する() {
        let request = UpstreamRequest::new(Method::GET, "/api/students")
            .query(Some("page=1"))
            .cookie(Some("jwt=abc".to_string()))
            .authorization(Some("Bearer abc".to_string()))
            .tenant(Some(TenantId::parse("t1").unwrap()));

        let built = client().build(&request).build().unwrap();

        assert_eq!(built.method(), Method::GET);
        assert_eq!(built.url().as_str(), "http://upstream.test/api/students?page=1");
        let headers = built.headers();
        assert_eq!(headers.get("cookie").unwrap(), "jwt=abc");
        assert_eq!(headers.get("authorization").unwrap(), "Bearer abc");
        assert_eq!(headers.get("x-tenant-id").unwrap(), "t1");
        assert_eq!(headers.get("x-tenant-guard").unwrap(), "true");
    }

    #[test]
    fn test_request_idをヘッダーで伝播する() {
        let mut request = UpstreamRequest::new(Method::GET, "/api/students");
        request.request_id = Some("req-123".to_string());

        let built = client().build(&request).build().unwrap();

        assert_eq!(built.headers().get("x-request-id").unwrap(), "req-123");
    }

    #[test]
    fn test_テナント不明ならテナントヘッダーを付けない() {
        let request = UpstreamRequest::new(Method::GET, "/api/subscription-plans/public");

        let built = client().build(&request).build().unwrap();

        assert!(built.headers().get("x-tenant-id").is_none());
        assert!(built.headers().get("x-tenant-guard").is_none());
        assert!(built.headers().get("cookie").is_none());
    }

    #[test]
    fn test_jsonボディを送る() {
        let request =
            UpstreamRequest::new(Method::POST, "/api/auth/login").json(json!({"email": "a@b.c"}));

        let built = client().build(&request).build().unwrap();

        assert_eq!(built.headers().get("content-type").unwrap(), "application/json");
        let body = built.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(body).unwrap(),
            json!({"email": "a@b.c"})
        );
    }

    #[tokio::test]
    async fn test_接続できなければnetworkエラーを返す() {
        // 予約済みポート 9 (discard) は通常リッスンされていない
        let client =
            UpstreamClientImpl::new("http://127.0.0.1:9", Duration::from_secs(2), "/health")
                .unwrap();

        let result = client
            .send(UpstreamRequest::new(Method::GET, "/api/students"))
            .await;

        let err = tokio_test::assert_err!(result);
        assert!(matches!(err, UpstreamError::Network(_)));
    }
}
