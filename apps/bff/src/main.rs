//! # EduSuite BFF (Backend for Frontend) サーバー
//!
//! フロントエンド専用の API サーバー。
//!
//! ## 役割
//!
//! BFF はブラウザと上流 API（Express）の間に位置し、
//! 以下の責務を担う:
//!
//! - **転送**: Cookie / Authorization / テナント ID を上流へそのまま渡す
//! - **キャッシュ**: 読み取り系のレスポンスを TTL 付きで保持する（Redis、なければメモリ）
//! - **レスポンス整形**: `success` フィールドを揃え、上流のエラーをステータスごと中継する
//! - **入力検証**: 必須パラメータがなければ上流を呼ばずに 400 を返す
//!
//! ## アーキテクチャ
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │   Browser    │────▶│     BFF      │────▶│ Upstream API │
//! │  (Next.js)   │     │  port: 3000  │     │  port: 5050  │
//! └──────────────┘     └──────────────┘     └──────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │    Redis     │
//!                      │  (optional)  │
//!                      └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `BFF_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `BFF_PORT` | **Yes** | ポート番号 |
//! | `UPSTREAM_URL` | **Yes** | 上流 API の URL（`EXPRESS_BACKEND_URL` でも可） |
//! | `UPSTREAM_TIMEOUT_SECS` | No | 上流呼び出しのタイムアウト（デフォルト: 30） |
//! | `UPSTREAM_HEALTH_PATH` | No | Readiness Check のパス（デフォルト: `/health`） |
//! | `REDIS_URL` | No | Redis 接続 URL（未設定ならメモリキャッシュ） |
//! | `CACHE_MAX_ENTRIES` | No | メモリキャッシュの最大エントリ数（デフォルト: 200） |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（.env ファイルを使用）
//! cargo run -p edusuite-bff
//!
//! # 本番環境（環境変数を直接指定）
//! BFF_PORT=3000 UPSTREAM_URL=http://api:5050 REDIS_URL=redis://... cargo run -p edusuite-bff --release
//! ```

mod config;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context as _;
use config::BffConfig;
use edusuite_bff::{app_builder::build_app, client::UpstreamClientImpl, proxy::ProxyState};
use edusuite_infra::cache::{CacheSettings, build_response_cache};
use edusuite_shared::observability::TracingConfig;
use tokio::net::TcpListener;

/// 起動時の Redis 接続待ち時間
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// BFF サーバーのエントリーポイント
///
/// 以下の順序で初期化を行う:
///
/// 1. 環境変数の読み込み（.env ファイル）
/// 2. トレーシングの初期化
/// 3. アプリケーション設定の読み込み
/// 4. キャッシュと上流クライアントの構築
/// 5. HTTP サーバーの起動
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    // 本番環境では .env ファイルは使用せず、環境変数を直接設定する
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("bff");
    edusuite_shared::observability::init_tracing(tracing_config);
    let _tracing_guard = tracing::info_span!("app", service = "bff").entered();

    // 設定読み込み
    let config = BffConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!("BFF サーバーを起動します: {}:{}", config.host, config.port);

    // 依存関係の初期化
    let cache = build_response_cache(&CacheSettings {
        redis_url:       config.redis_url.clone(),
        max_entries:     config.cache_max_entries,
        connect_timeout: REDIS_CONNECT_TIMEOUT,
    })
    .await;
    let upstream = UpstreamClientImpl::new(
        &config.upstream_url,
        config.upstream_timeout,
        &config.upstream_health_path,
    )
    .context("上流 API クライアントの初期化に失敗しました")?;

    tracing::info!(
        upstream.url = %config.upstream_url,
        cache.backend = %cache.backend(),
        "依存関係を初期化しました"
    );

    let state = Arc::new(ProxyState::new(Arc::new(upstream), cache));
    let app = build_app(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("アドレスのパースに失敗しました")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("BFF サーバーが起動しました: {}", addr);

    // Graceful shutdown は axum::serve が自動的に処理する
    axum::serve(listener, app).await?;

    Ok(())
}
