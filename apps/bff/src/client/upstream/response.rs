//! 上流 API レスポンスの共通ハンドリング

use bytes::Bytes;
use http::{StatusCode, header};
use serde_json::{Value, json};

use super::error::UpstreamError;

/// 上流 API のレスポンスボディ
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamBody {
    /// JSON（空ボディは `Null`）
    Json(Value),
    /// PDF などのバイナリ
    Binary { content_type: String, bytes: Bytes },
}

/// 上流 API のレスポンス
#[derive(Debug, Clone, PartialEq)]
pub struct UpstreamResponse {
    pub status:      StatusCode,
    pub body:        UpstreamBody,
    /// 上流が返した `Set-Cookie` ヘッダー（ブラウザへそのまま中継する）
    pub set_cookies: Vec<String>,
}

impl UpstreamResponse {
    /// JSON ボディのレスポンスを作る（テストやスタブ用）
    pub fn json(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            body: UpstreamBody::Json(body),
            set_cookies: Vec::new(),
        }
    }
}

/// バイナリとして扱う Content-Type か
fn is_binary_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/pdf" || mime == "application/octet-stream" || mime.starts_with("image/")
}

/// reqwest のレスポンスを [`UpstreamResponse`] に変換する
///
/// - バイナリの Content-Type: `Binary`
/// - 空ボディ: `Json(Null)`
/// - JSON: `Json(value)`
/// - JSON 以外のテキスト: 2xx なら `InvalidBody`、それ以外は `{"message": テキスト}`
pub(super) async fn parse_response(
    response: reqwest::Response,
) -> Result<UpstreamResponse, UpstreamError> {
    let status = response.status();
    let set_cookies = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let bytes = response.bytes().await?;

    if let Some(content_type) = content_type.filter(|ct| is_binary_content_type(ct)) {
        return Ok(UpstreamResponse {
            status,
            body: UpstreamBody::Binary {
                content_type,
                bytes,
            },
            set_cookies,
        });
    }

    let body = if bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => value,
            Err(e) if status.is_success() => {
                return Err(UpstreamError::InvalidBody(e.to_string()));
            }
            Err(_) => json!({ "message": String::from_utf8_lossy(&bytes).trim() }),
        }
    };

    Ok(UpstreamResponse {
        status,
        body: UpstreamBody::Json(body),
        set_cookies,
    })
}
