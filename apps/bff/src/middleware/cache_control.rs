//! # キャッシュ制御ミドルウェア
//!
//! 動的 API レスポンスがブラウザにキャッシュされないよう、
//! `Cache-Control: no-store` を付与する。
//!
//! キャッシュ HIT のレスポンスはハンドラが `private, max-age=...` を設定済みのため、
//! 既存の `Cache-Control` は上書きしない。

use axum::{
    extract::Request,
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

/// `Cache-Control` が未設定のレスポンスに `no-store` を付与する
pub async fn no_store_by_default(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response
        .headers_mut()
        .entry(header::CACHE_CONTROL)
        .or_insert(HeaderValue::from_static("no-store"));
    response
}
