//! # 認証エンドポイントの統合テスト
//!
//! ログイン中ユーザーの取得は上流の応答を詰め直して返し、
//! キャッシュは一切使わない。

mod common;

use axum::http::{Method, StatusCode};
use common::{StubUpstream, app, get, send};
use edusuite_bff::client::UpstreamResponse;
use pretty_assertions::assert_eq;
use serde_json::json;

// --- /api/auth/me ---

#[tokio::test]
async fn test_meは安全なフィールドだけを返す() {
    let upstream = StubUpstream::fixed(
        StatusCode::OK,
        json!({
            "user": {
                "id": "u1",
                "email": "asha@school.test",
                "name": "Asha",
                "role": "admin",
                "tenantId": "tenant-a",
                "password": "$2b$10$hash"
            }
        }),
    );
    let app = app(upstream.clone());

    let response = send(&app, get("/api/auth/me", &[("cookie", "jwt=abc")])).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-cache"), Some("BYPASS"));
    assert_eq!(
        response.body,
        json!({
            "success": true,
            "user": {
                "id": "u1",
                "email": "asha@school.test",
                "name": "Asha",
                "role": "admin",
                "tenantId": "tenant-a",
                "profilePicture": null
            }
        })
    );
    let call = upstream.last_call();
    assert_eq!(call.method, Method::GET);
    assert_eq!(call.path_and_query, "/api/auth/me");
    assert_eq!(call.cookie.as_deref(), Some("jwt=abc"));
}

#[tokio::test]
async fn test_meは毎回上流に問い合わせる() {
    let upstream = StubUpstream::fixed(StatusCode::OK, json!({"user": {"id": "u1"}}));
    let app = app(upstream.clone());

    send(&app, get("/api/auth/me", &[("cookie", "jwt=abc")])).await;
    send(&app, get("/api/auth/me", &[("cookie", "jwt=abc")])).await;

    assert_eq!(upstream.call_count(), 2);
}

#[tokio::test]
async fn test_meで上流が401ならuserをnullにして401を返す() {
    let upstream = StubUpstream::fixed(StatusCode::UNAUTHORIZED, json!({}));
    let app = app(upstream.clone());

    let response = send(&app, get("/api/auth/me", &[])).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"success": false, "user": null, "message": "認証されていません"})
    );
}

#[tokio::test]
async fn test_meで上流の500はそのまま中継する() {
    let upstream = StubUpstream::fixed(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "db down"}));
    let app = app(upstream.clone());

    let response = send(&app, get("/api/auth/me", &[("cookie", "jwt=abc")])).await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body, json!({"success": false, "message": "db down", "error": "db down"}));
}

// --- /api/unified/me ---

#[tokio::test]
async fn test_unified_meはトークンがなければ上流を呼ばずに401を返す() {
    let upstream = StubUpstream::counting();
    let app = app(upstream.clone());

    let response = send(&app, get("/api/unified/me", &[("cookie", "theme=dark")])).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(upstream.call_count(), 0);
}

#[tokio::test]
async fn test_unified_meはjwt_cookieをbearerトークンとして検証する() {
    let upstream = StubUpstream::fixed(
        StatusCode::OK,
        json!({
            "valid": true,
            "user": {
                "id": "u1",
                "email": "asha@school.test",
                "name": "Asha",
                "role": "admin",
                "tenantId": "tenant-a",
                "subdomain": "greenfield",
                "plan": "pro",
                "subscriptionStatus": "trial",
                "trialEndDate": "2026-11-01"
            }
        }),
    );
    let app = app(upstream.clone());

    let response = send(
        &app,
        get(
            "/api/unified/me",
            &[("cookie", "theme=dark; jwt=tok-123"), ("x-tenant-id", "tenant-a")],
        ),
    )
    .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.header("x-cache"), Some("BYPASS"));
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["user"]["subdomain"], "greenfield");
    assert_eq!(response.body["user"]["subscriptionStatus"], "trial");
    assert_eq!(response.body["user"]["tenant"], serde_json::Value::Null);

    let call = upstream.last_call();
    assert_eq!(call.method, Method::POST);
    assert_eq!(call.path_and_query, "/api/auth/validate-token");
    assert_eq!(call.authorization.as_deref(), Some("Bearer tok-123"));
    assert_eq!(call.tenant_id.unwrap().as_str(), "tenant-a");
}

#[tokio::test]
async fn test_unified_meはauthorizationヘッダーをcookieより優先する() {
    let upstream = StubUpstream::fixed(StatusCode::OK, json!({"user": {"id": "u1"}}));
    let app = app(upstream.clone());

    send(
        &app,
        get(
            "/api/unified/me",
            &[("authorization", "Bearer from-header"), ("cookie", "jwt=from-cookie")],
        ),
    )
    .await;

    assert_eq!(
        upstream.last_call().authorization.as_deref(),
        Some("Bearer from-header")
    );
}

#[tokio::test]
async fn test_unified_meで上流が401なら上流のメッセージを返す() {
    let upstream = StubUpstream::new(|_, _| {
        Ok(UpstreamResponse::json(
            StatusCode::UNAUTHORIZED,
            json!({"message": "Token expired"}),
        ))
    });
    let app = app(upstream.clone());

    let response = send(&app, get("/api/unified/me", &[("authorization", "Bearer old")])).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.body,
        json!({"success": false, "user": null, "message": "Token expired"})
    );
}
