//! # HTTP リクエストハンドラ
//!
//! axum のルートに対応するハンドラ関数を定義する。
//!
//! ## 設計方針
//!
//! - 各ハンドラはリソースグループ単位のサブモジュールに配置
//! - 親モジュールで re-export し、フラットな API を提供
//! - ハンドラは薄く保ち、転送とキャッシュは [`crate::proxy`] に委譲
//! - 更新系の無効化対象はグループごとに定数で宣言する
//!
//! ## ハンドラ一覧
//!
//! - `health`: ヘルスチェック
//! - `auth`: 認証（ログイン、サインアップ、ログアウト、ユーザー情報）
//! - `students` / `staff` / `employees` / `academics` / `attendance`: 学務
//! - `accounts` / `dashboard`: 会計とダッシュボード
//! - `whatsapp` / `social`: 外部チャネル連携
//! - `scholarship` / `public`: 奨学金試験（管理側と公開側）
//! - `plans` / `tenants` / `settings` / `users`: テナント管理
//! - `analytics` / `demo_requests`: 運営者向け

pub mod academics;
pub mod accounts;
pub mod analytics;
pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod demo_requests;
pub mod employees;
pub mod health;
pub mod plans;
pub mod public;
pub mod scholarship;
pub mod settings;
pub mod social;
pub mod staff;
pub mod students;
pub mod tenants;
pub mod users;
pub mod whatsapp;

use axum::{
    http::{HeaderMap, Method},
    response::Response,
};
use bytes::Bytes;
use edusuite_domain::cache::CacheNamespace;

pub use academics::{
    create_batch,
    create_test,
    delete_batch,
    delete_test,
    get_attendance,
    get_marks,
    get_test,
    list_batches,
    list_tests,
    save_attendance,
    save_marks,
    student_tests,
    update_batch,
    update_test,
};
pub use accounts::{
    accounts_overview,
    create_expense,
    create_receipt,
    create_refund,
    enrollment_trend,
    expenses_trend,
    fees_pending,
    generate_receipt_pdf,
    list_expenses,
    list_receipts,
    list_refunds,
    revenue_trend,
    search_receipts,
};
pub use analytics::{analytics_dashboard, revenue_breakdown, top_tenants};
pub use attendance::student_attendance;
pub use auth::{login, logout, me, signup, unified_me};
pub use dashboard::{dashboard_home, dashboard_overview};
pub use demo_requests::{create_demo_request, get_demo_request, list_demo_requests};
pub use employees::{
    create_employee,
    delete_employee_record,
    employee_action,
    list_employees,
    update_employee_record,
};
pub use health::{health_check, readiness_check};
pub use plans::{public_plans, subscription_plan, subscription_plans};
pub use public::{public_exam, public_results};
pub use scholarship::{
    create_exam,
    delete_exam,
    exam_registrations,
    exam_stats,
    get_exam,
    list_exams,
    update_exam,
};
pub use settings::{
    create_staff_login,
    get_tenant_profile,
    sidebar,
    staff_logins,
    update_tenant_profile,
};
pub use social::{
    create_campaign,
    list_campaigns,
    social_dashboard,
    social_insights,
    social_pages,
    social_status,
};
pub use staff::{create_staff, delete_staff, get_staff, list_staff, update_staff};
pub use students::{create_student, delete_student, get_student, list_students, update_student};
pub use tenants::{current_tenant, list_tenants};
pub use users::{create_user, delete_employee, list_users, update_employee};
pub use whatsapp::{
    get_conversation,
    get_whatsapp_config,
    list_contacts,
    list_conversations,
    list_messages,
    mark_conversation_read,
    reply_conversation,
    list_templates,
    send_message,
    update_whatsapp_config,
    whatsapp_stats,
};

use crate::{
    forward::{ForwardContext, parse_body},
    proxy::{CachePolicy, ProxyState},
};

// --- 共通の転送パターン ---

/// キャッシュ付き GET をそのままのパスで転送する
pub(crate) async fn forward_cached(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    path: &str,
    policy: CachePolicy,
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let request = ctx.upstream(Method::GET, path);
    state.cached_get(&ctx, request, policy).await
}

/// キャッシュしない GET を転送する
pub(crate) async fn forward_get(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    path: &str,
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    state.passthrough(ctx.upstream(Method::GET, path)).await
}

/// 更新系リクエストをボディ付きで転送し、成功したら無効化する
pub(crate) async fn forward_mutation(
    state: &ProxyState,
    headers: &HeaderMap,
    query: Option<String>,
    method: Method,
    path: &str,
    body: &Bytes,
    invalidations: &[CacheNamespace],
) -> Response {
    let ctx = match ForwardContext::from_parts(headers, query) {
        Ok(ctx) => ctx,
        Err(response) => return response,
    };
    let body = match parse_body(body) {
        Ok(body) => body,
        Err(response) => return response,
    };

    let mut request = ctx.upstream(method, path);
    if let Some(body) = body {
        request = request.json(body);
    }
    state.mutate(&ctx, request, invalidations).await
}
