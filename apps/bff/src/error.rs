//! # BFF エラーハンドリング
//!
//! BFF 自身が生成するエラーのレスポンス変換。
//!
//! - 入力不足や認証情報なしなど、上流を呼ぶ前に判明するエラーは RFC 9457 形式で返す
//! - 上流の 4xx / 5xx はここを通らず、[`crate::proxy`] が上流のステータスのまま中継する
//! - 上流に到達できない、または応答を解釈できない場合は 500

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use edusuite_shared::ErrorResponse;

use crate::client::UpstreamError;

// --- IntoResponse for UpstreamError ---

impl IntoResponse for UpstreamError {
    fn into_response(self) -> Response {
        match self {
            UpstreamError::Network(_) | UpstreamError::InvalidBody(_) => internal_error_response(),
        }
    }
}

/// 上流エラーをログ付きでレスポンスに変換する
pub fn log_and_convert_upstream_error(context: &str, err: UpstreamError) -> Response {
    match &err {
        UpstreamError::Network(_) => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "service_communication",
                "{}で内部エラー: {}",
                context,
                err
            );
        }
        UpstreamError::InvalidBody(_) => {
            tracing::error!(
                error.category = "external_service",
                error.kind = "invalid_response",
                "{}で内部エラー: {}",
                context,
                err
            );
        }
    }
    err.into_response()
}

// --- レスポンスヘルパー ---

/// 400 Validation Error
pub fn validation_error_response(detail: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::validation_error(detail)),
    )
        .into_response()
}

/// 401 Unauthorized
pub fn unauthorized_response() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::unauthorized("認証が必要です")),
    )
        .into_response()
}

/// 404 Not Found（未定義ルート）
pub fn not_found_response() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::not_found("エンドポイントが見つかりません")),
    )
        .into_response()
}

/// 500 Internal Server Error
pub fn internal_error_response() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::internal_error()),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_validation_error_responseは400とdetailを返す() {
        let response = validation_error_response("testId は必須です");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["detail"], "testId は必須です");
        assert_eq!(json["status"], 400);
    }

    #[tokio::test]
    async fn test_networkエラーは500の固定メッセージになる() {
        let response =
            log_and_convert_upstream_error("生徒一覧取得", UpstreamError::Network("refused".into()));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(
            json["type"],
            "https://edusuite.example.com/errors/internal-error"
        );
        // 内部情報（接続先など）は漏らさない
        assert_eq!(json["detail"], "内部エラーが発生しました");
    }

    #[tokio::test]
    async fn test_invalid_bodyも500になる() {
        let response = UpstreamError::InvalidBody("expected value".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
