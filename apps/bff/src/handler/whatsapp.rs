//! # WhatsApp 連携 API ハンドラ
//!
//! ## エンドポイント
//!
//! - `GET /api/whatsapp/stats` - 送信統計
//! - `GET /api/whatsapp/templates` - メッセージテンプレート
//! - `GET /api/whatsapp/contacts` - 連絡先
//! - `GET /api/whatsapp/messages` - メッセージ履歴
//! - `POST /api/whatsapp/messages` - 送信（上流は `POST /api/whatsapp/send`）
//! - `GET /api/whatsapp/config` / `PUT` - 連携設定
//! - `GET /api/whatsapp/inbox/conversations` - 受信箱の会話一覧
//! - `GET /api/whatsapp/inbox/conversation/{id}` - 会話のメッセージ
//! - `POST /api/whatsapp/inbox/conversation/{id}` - 既読にする（上流は `.../{id}/read`）
//! - `POST /api/whatsapp/inbox/conversation/{id}/reply` - 返信

use std::sync::Arc;

use axum::{
    extract::{Path, RawQuery, State},
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::{CacheNamespace, CacheTtl};

use super::{forward_cached, forward_get, forward_mutation};
use crate::{
    forward::segment,
    proxy::{CachePolicy, ProxyState},
};

const STATS_POLICY: CachePolicy = CachePolicy::tenant(CacheNamespace::WHATSAPP_STATS, CacheTtl::Short);
const TEMPLATES_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::WHATSAPP_TEMPLATES, CacheTtl::Long);
const CONTACTS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::WHATSAPP_CONTACTS, CacheTtl::Medium);
const MESSAGES_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::WHATSAPP_MESSAGES, CacheTtl::VeryShort);
const CONVERSATIONS_POLICY: CachePolicy =
    CachePolicy::tenant(CacheNamespace::WHATSAPP_CONVERSATIONS, CacheTtl::Medium);

/// 送信で変わる名前空間
pub const SEND_INVALIDATES: &[CacheNamespace] = &[
    CacheNamespace::WHATSAPP_STATS,
    CacheNamespace::WHATSAPP_MESSAGES,
    CacheNamespace::WHATSAPP_CONVERSATIONS,
];

/// 既読で変わる名前空間（会話一覧の未読数）
pub const READ_INVALIDATES: &[CacheNamespace] = &[CacheNamespace::WHATSAPP_CONVERSATIONS];

/// 設定変更で変わる名前空間（テンプレートは設定のアカウントに紐づく）
pub const CONFIG_INVALIDATES: &[CacheNamespace] = &[CacheNamespace::WHATSAPP_TEMPLATES];

/// GET /api/whatsapp/stats
pub async fn whatsapp_stats(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/whatsapp/stats", STATS_POLICY).await
}

/// GET /api/whatsapp/templates
pub async fn list_templates(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/whatsapp/templates", TEMPLATES_POLICY).await
}

/// GET /api/whatsapp/contacts
pub async fn list_contacts(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/whatsapp/contacts", CONTACTS_POLICY).await
}

/// GET /api/whatsapp/messages
pub async fn list_messages(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(&state, &headers, query, "/api/whatsapp/messages", MESSAGES_POLICY).await
}

/// GET /api/whatsapp/inbox/conversations
pub async fn list_conversations(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_cached(
        &state,
        &headers,
        query,
        "/api/whatsapp/inbox/conversations",
        CONVERSATIONS_POLICY,
    )
    .await
}

fn conversation_path(id: &str) -> String {
    format!("/api/whatsapp/inbox/conversation/{}", segment(id))
}

/// GET /api/whatsapp/inbox/conversation/{id}
pub async fn get_conversation(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
) -> Response {
    forward_get(&state, &headers, query, &conversation_path(&id)).await
}

/// POST /api/whatsapp/inbox/conversation/{id}
pub async fn mark_conversation_read(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("{}/read", conversation_path(&id));
    forward_mutation(&state, &headers, query, Method::POST, &path, &body, READ_INVALIDATES).await
}

/// POST /api/whatsapp/inbox/conversation/{id}/reply
pub async fn reply_conversation(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let path = format!("{}/reply", conversation_path(&id));
    forward_mutation(&state, &headers, query, Method::POST, &path, &body, SEND_INVALIDATES).await
}

/// POST /api/whatsapp/messages
pub async fn send_message(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(
        &state,
        &headers,
        query,
        Method::POST,
        "/api/whatsapp/send",
        &body,
        SEND_INVALIDATES,
    )
    .await
}

/// GET /api/whatsapp/config
pub async fn get_whatsapp_config(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
) -> Response {
    forward_get(&state, &headers, query, "/api/whatsapp/config").await
}

/// PUT /api/whatsapp/config
pub async fn update_whatsapp_config(
    State(state): State<Arc<ProxyState>>,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: Bytes,
) -> Response {
    forward_mutation(
        &state,
        &headers,
        query,
        Method::PUT,
        "/api/whatsapp/config",
        &body,
        CONFIG_INVALIDATES,
    )
    .await
}
