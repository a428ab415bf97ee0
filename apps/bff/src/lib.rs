//! # EduSuite BFF (Backend for Frontend) ライブラリ
//!
//! ブラウザと上流 API の間に立つゲートウェイのコアモジュール。
//!
//! ## モジュール構成
//!
//! - `app_builder`: ルーターとミドルウェアスタックの構築
//! - `client`: 上流 API クライアント
//! - `error`: BFF 自身が返すエラーレスポンス
//! - `forward`: リクエストから転送情報を取り出す
//! - `handler`: HTTP ハンドラ
//! - `middleware`: ミドルウェア（Request ID、Cache-Control）
//! - `proxy`: 転送・キャッシュ・無効化の共通処理

pub mod app_builder;
pub mod client;
pub mod error;
pub mod forward;
pub mod handler;
pub mod middleware;
pub mod proxy;
