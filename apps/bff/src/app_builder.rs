//! # BFF アプリケーション構築
//!
//! ルーター定義とミドルウェアスタックの組み立てを担当する。
//! `main.rs` は依存の初期化とサーバー起動に集中する。
//!
//! 統合テストからも同じルーターを使うため、ライブラリ側に置く。

use std::sync::Arc;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use edusuite_shared::{
    canonical_log::CanonicalLogLineLayer,
    observability::{MakeRequestUuidV7, make_request_span},
};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    error::not_found_response,
    handler::{
        accounts_overview,
        analytics_dashboard,
        create_batch,
        create_campaign,
        create_demo_request,
        create_employee,
        create_exam,
        create_expense,
        create_receipt,
        create_refund,
        create_staff,
        create_staff_login,
        create_student,
        create_test,
        create_user,
        current_tenant,
        dashboard_home,
        dashboard_overview,
        delete_batch,
        delete_employee,
        delete_employee_record,
        delete_exam,
        delete_staff,
        delete_student,
        delete_test,
        employee_action,
        enrollment_trend,
        exam_registrations,
        exam_stats,
        expenses_trend,
        fees_pending,
        generate_receipt_pdf,
        get_attendance,
        get_conversation,
        get_demo_request,
        get_exam,
        get_marks,
        get_staff,
        get_student,
        get_tenant_profile,
        get_test,
        get_whatsapp_config,
        health_check,
        list_batches,
        list_campaigns,
        list_contacts,
        list_conversations,
        list_demo_requests,
        list_employees,
        list_exams,
        list_expenses,
        list_messages,
        list_receipts,
        list_refunds,
        list_staff,
        list_students,
        list_templates,
        list_tenants,
        list_tests,
        list_users,
        login,
        logout,
        mark_conversation_read,
        me,
        public_exam,
        public_plans,
        public_results,
        readiness_check,
        reply_conversation,
        revenue_breakdown,
        revenue_trend,
        save_attendance,
        save_marks,
        search_receipts,
        send_message,
        sidebar,
        signup,
        social_dashboard,
        social_insights,
        social_pages,
        social_status,
        staff_logins,
        student_attendance,
        student_tests,
        subscription_plan,
        subscription_plans,
        top_tenants,
        unified_me,
        update_batch,
        update_employee,
        update_employee_record,
        update_exam,
        update_staff,
        update_student,
        update_tenant_profile,
        update_test,
        update_whatsapp_config,
        whatsapp_stats,
    },
    middleware::{no_store_by_default, request_id::store_request_id},
    proxy::ProxyState,
};

/// ルーターを構築する
pub fn build_app(state: Arc<ProxyState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/ready", get(readiness_check))
        // 認証
        .route("/api/auth/login", post(login))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/me", get(me))
        .route("/api/unified/me", get(unified_me))
        // 生徒・職員
        .route("/api/students", get(list_students).post(create_student))
        .route(
            "/api/students/{id}",
            get(get_student).put(update_student).delete(delete_student),
        )
        .route("/api/staff", get(list_staff).post(create_staff))
        .route(
            "/api/staff/{id}",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
        // 学務
        .route(
            "/api/academics/batches",
            get(list_batches).post(create_batch),
        )
        .route(
            "/api/academics/batches/{id}",
            put(update_batch).delete(delete_batch),
        )
        .route(
            "/api/academics/attendance",
            get(get_attendance).post(save_attendance),
        )
        .route("/api/academics/marks", get(get_marks).post(save_marks))
        .route("/api/academics/tests", get(list_tests).post(create_test))
        .route(
            "/api/academics/tests/{id}",
            get(get_test).put(update_test).delete(delete_test),
        )
        .route(
            "/api/academics/students/{student_id}/tests",
            get(student_tests),
        )
        .route(
            "/api/attendance/student/{student_id}",
            get(student_attendance),
        )
        // 会計
        .route("/api/accounts/overview", get(accounts_overview))
        .route("/api/accounts/fees-pending", get(fees_pending))
        .route(
            "/api/accounts/expenses",
            get(list_expenses).post(create_expense),
        )
        .route("/api/accounts/receipts", get(list_receipts))
        .route("/api/accounts/receipts/search", get(search_receipts))
        .route("/api/accounts/receipts/create", post(create_receipt))
        .route(
            "/api/accounts/receipts/generate/{payment_id}",
            get(generate_receipt_pdf),
        )
        .route(
            "/api/accounts/refunds",
            get(list_refunds).post(create_refund),
        )
        .route("/api/accounts/enrollment-trend", get(enrollment_trend))
        .route("/api/accounts/expenses-trend", get(expenses_trend))
        .route("/api/accounts/revenue-trend", get(revenue_trend))
        // ダッシュボード
        .route("/api/dashboard/overview", get(dashboard_overview))
        .route("/api/dashboard/home", get(dashboard_home))
        // WhatsApp・ソーシャル
        .route("/api/whatsapp/stats", get(whatsapp_stats))
        .route("/api/whatsapp/templates", get(list_templates))
        .route("/api/whatsapp/contacts", get(list_contacts))
        .route(
            "/api/whatsapp/messages",
            get(list_messages).post(send_message),
        )
        .route(
            "/api/whatsapp/config",
            get(get_whatsapp_config).put(update_whatsapp_config),
        )
        .route(
            "/api/whatsapp/inbox/conversations",
            get(list_conversations),
        )
        .route(
            "/api/whatsapp/inbox/conversation/{id}",
            get(get_conversation).post(mark_conversation_read),
        )
        .route(
            "/api/whatsapp/inbox/conversation/{id}/reply",
            post(reply_conversation),
        )
        .route("/api/social/insights", get(social_insights))
        .route(
            "/api/social/campaigns",
            get(list_campaigns).post(create_campaign),
        )
        .route("/api/social/dashboard", get(social_dashboard))
        .route("/api/social/pages", get(social_pages))
        .route("/api/social/status", get(social_status))
        // 奨学金試験
        .route("/api/scholarship-exams", get(list_exams).post(create_exam))
        .route(
            "/api/scholarship-exams/{id}",
            get(get_exam).put(update_exam).delete(delete_exam),
        )
        .route("/api/scholarship-exams/{id}/stats", get(exam_stats))
        .route(
            "/api/scholarship-exams/{id}/registrations",
            get(exam_registrations),
        )
        .route("/api/public/exams", get(public_exam))
        .route("/api/public/results", get(public_results))
        // テナント管理
        .route("/api/subscription-plans/public", get(public_plans))
        .route("/api/subscription/plans", get(subscription_plans))
        .route("/api/subscription/plans/{plan_id}", get(subscription_plan))
        .route("/api/tenants", get(list_tenants))
        .route("/api/tenant/me", get(current_tenant))
        .route(
            "/api/settings/tenant-profile",
            get(get_tenant_profile).put(update_tenant_profile),
        )
        .route(
            "/api/settings/staff-list",
            get(staff_logins).post(create_staff_login),
        )
        .route("/api/ui/sidebar", get(sidebar))
        .route("/api/user", get(list_users).post(create_user))
        .route(
            "/api/user/employees/{id}",
            put(update_employee).delete(delete_employee),
        )
        // 従業員
        .route("/api/employees", get(list_employees).post(create_employee))
        .route(
            "/api/employees/{id}",
            put(update_employee_record)
                .delete(delete_employee_record)
                .post(employee_action),
        )
        // 運営者向け
        .route("/api/analytics/dashboard", get(analytics_dashboard))
        .route("/api/analytics/revenue-breakdown", get(revenue_breakdown))
        .route("/api/analytics/top-tenants", get(top_tenants))
        .route(
            "/api/demo-requests",
            get(list_demo_requests).post(create_demo_request),
        )
        .route("/api/demo-requests/{id}", get(get_demo_request))
        .fallback(|| async { not_found_response() })
        .with_state(state)
        // キャッシュ制御: ハンドラが Cache-Control を付けなければ no-store
        .layer(from_fn(no_store_by_default))
        // Request ID レイヤー（レイヤー順序が重要: 下に書いたものが外側）
        // 1. SetRequestIdLayer（最外）: リクエスト受信時に UUID v7 を生成（またはクライアント提供値を使用）
        // 2. TraceLayer: カスタムスパンに request_id を含め、全ログに自動注入
        // 3. CanonicalLogLineLayer: リクエスト完了時に1行サマリログを出力（スパン内）
        // 4. PropagateRequestIdLayer: レスポンスヘッダーに X-Request-Id をコピー
        // 5. store_request_id: task-local に保存し、BFF → 上流 API のヘッダー伝播に使用
        .layer(from_fn(store_request_id))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CanonicalLogLineLayer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
