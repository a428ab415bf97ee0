//! 統合テスト共通のスタブとヘルパー
//!
//! 上流 API は [`StubUpstream`] に差し替え、受け取ったリクエストを記録する。
//! キャッシュは実物の `MemoryCache`（または `edusuite_infra::mock` の障害スタブ）を使う。

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode},
};
use edusuite_bff::{
    app_builder::build_app,
    client::{UpstreamClient, UpstreamError, UpstreamRequest, UpstreamResponse},
    proxy::ProxyState,
};
use edusuite_infra::{ResponseCache, cache::MemoryCache};
use serde_json::Value;
use tower::ServiceExt;

type Responder =
    dyn Fn(&UpstreamRequest, usize) -> Result<UpstreamResponse, UpstreamError> + Send + Sync;

// --- 上流スタブ ---

/// 上流 API スタブ
///
/// 応答は `responder` が決める。第 2 引数は 1 始まりの呼び出し回数。
pub struct StubUpstream {
    calls:       Mutex<Vec<UpstreamRequest>>,
    responder:   Box<Responder>,
    ping_result: Result<StatusCode, UpstreamError>,
}

impl StubUpstream {
    pub fn new(
        responder: impl Fn(&UpstreamRequest, usize) -> Result<UpstreamResponse, UpstreamError>
        + Send
        + Sync
        + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls:       Mutex::new(Vec::new()),
            responder:   Box::new(responder),
            ping_result: Ok(StatusCode::OK),
        })
    }

    /// 常に 200 と `{"n": 呼び出し回数}` を返す
    ///
    /// キャッシュから返されたかどうかを `n` で判別できる。
    pub fn counting() -> Arc<Self> {
        Self::new(|_, n| Ok(UpstreamResponse::json(StatusCode::OK, serde_json::json!({"n": n}))))
    }

    /// 常に同じステータスとボディを返す
    pub fn fixed(status: StatusCode, body: Value) -> Arc<Self> {
        Self::new(move |_, _| Ok(UpstreamResponse::json(status, body.clone())))
    }

    /// ヘルスチェックの結果を差し替える
    pub fn with_ping(
        responder: impl Fn(&UpstreamRequest, usize) -> Result<UpstreamResponse, UpstreamError>
        + Send
        + Sync
        + 'static,
        ping_result: Result<StatusCode, UpstreamError>,
    ) -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
            ping_result,
        })
    }

    pub fn calls(&self) -> Vec<UpstreamRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> UpstreamRequest {
        self.calls().pop().expect("上流が呼ばれていること")
    }
}

#[async_trait]
impl UpstreamClient for StubUpstream {
    async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, UpstreamError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(request.clone());
            calls.len()
        };
        (self.responder)(&request, n)
    }

    async fn ping(&self) -> Result<StatusCode, UpstreamError> {
        self.ping_result.clone()
    }
}

// --- アプリ構築 ---

/// メモリキャッシュでアプリを構築する
pub fn app(upstream: Arc<StubUpstream>) -> Router {
    app_with_cache(upstream, Arc::new(MemoryCache::default()))
}

pub fn app_with_cache(upstream: Arc<StubUpstream>, cache: Arc<dyn ResponseCache>) -> Router {
    build_app(Arc::new(ProxyState::new(upstream, cache)))
}

// --- リクエスト ---

pub fn request(method: Method, uri: &str, headers: &[(&str, &str)], body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

pub fn get(uri: &str, headers: &[(&str, &str)]) -> Request<Body> {
    request(Method::GET, uri, headers, None)
}

/// テスト用のレスポンス
pub struct TestResponse {
    pub status:  StatusCode,
    pub headers: HeaderMap,
    pub body:    Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// リクエストを送り、ボディを JSON として読む（空ボディは `Null`）
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    TestResponse {
        status,
        headers,
        body,
    }
}
