//! # 認証ハンドラ
//!
//! BFF の認証エンドポイントを提供する。認証そのものは上流が行い、
//! BFF は資格情報の転送と `Set-Cookie` の中継、レスポンスの絞り込みだけを担う。
//!
//! ## エンドポイント
//!
//! - `POST /api/auth/login` - ログイン
//! - `POST /api/auth/signup` - サインアップ
//! - `POST /api/auth/logout` - ログアウト
//! - `GET /api/auth/me` - Cookie 認証のユーザー情報
//! - `GET /api/unified/me` - Bearer トークン検証（スーパー管理者・テナントユーザー共通）

mod login;
mod session;

pub use login::{login, logout, signup};
pub use session::{me, unified_me};
