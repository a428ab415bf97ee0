//! 上流 API へのリクエスト

use edusuite_domain::tenant::TenantId;
use http::Method;
use serde_json::Value;

use crate::middleware::request_id::current_request_id;

/// 上流 API へ転送するリクエスト
///
/// 資格情報とテナントはブラウザから受け取った値をそのまま運ぶ。
/// Request ID は生成時に task-local から読み取る。
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamRequest {
    pub method:         Method,
    /// `/api/students?page=1` のようなパスとクエリ
    pub path_and_query: String,
    pub cookie:         Option<String>,
    pub authorization:  Option<String>,
    pub tenant_id:      Option<TenantId>,
    pub body:           Option<Value>,
    /// 上流へ `X-Request-Id` として渡す値
    pub request_id:     Option<String>,
}

impl UpstreamRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path_and_query: path.into(),
            cookie: None,
            authorization: None,
            tenant_id: None,
            body: None,
            request_id: current_request_id(),
        }
    }

    /// 生のクエリ文字列を付け足す（空なら何もしない）
    pub fn query(mut self, raw_query: Option<&str>) -> Self {
        if let Some(raw) = raw_query.filter(|q| !q.is_empty()) {
            let separator = if self.path_and_query.contains('?') {
                '&'
            } else {
                '?'
            };
            self.path_and_query.push(separator);
            self.path_and_query.push_str(raw);
        }
        self
    }

    pub fn cookie(mut self, cookie: Option<String>) -> Self {
        self.cookie = cookie;
        self
    }

    pub fn authorization(mut self, authorization: Option<String>) -> Self {
        self.authorization = authorization;
        self
    }

    pub fn tenant(mut self, tenant_id: Option<TenantId>) -> Self {
        self.tenant_id = tenant_id;
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// パスだけを取り出す（ログ用）
    pub fn path(&self) -> &str {
        self.path_and_query
            .split_once('?')
            .map_or(self.path_and_query.as_str(), |(path, _)| path)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_queryで生のクエリを付け足す() {
        let request = UpstreamRequest::new(Method::GET, "/api/students").query(Some("page=2&limit=10"));
        assert_eq!(request.path_and_query, "/api/students?page=2&limit=10");
        assert_eq!(request.path(), "/api/students");
    }

    #[test]
    fn test_queryが空なら何もしない() {
        let request = UpstreamRequest::new(Method::GET, "/api/students")
            .query(Some(""))
            .query(None);
        assert_eq!(request.path_and_query, "/api/students");
    }

    #[test]
    fn test_既にクエリがあればアンパサンドで連結する() {
        let request = UpstreamRequest::new(Method::GET, "/api/x?a=1").query(Some("b=2"));
        assert_eq!(request.path_and_query, "/api/x?a=1&b=2");
    }

    #[test]
    fn test_builderで全フィールドを設定できる() {
        let tenant = TenantId::parse("t1").unwrap();
        let request = UpstreamRequest::new(Method::POST, "/api/students")
            .cookie(Some("jwt=abc".to_string()))
            .authorization(Some("Bearer abc".to_string()))
            .tenant(Some(tenant.clone()))
            .json(json!({"name": "Asha"}));

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.cookie.as_deref(), Some("jwt=abc"));
        assert_eq!(request.authorization.as_deref(), Some("Bearer abc"));
        assert_eq!(request.tenant_id, Some(tenant));
        assert_eq!(request.body, Some(json!({"name": "Asha"})));
        assert_eq!(request.request_id, None);
    }
}
