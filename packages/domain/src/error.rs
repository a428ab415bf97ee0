//! # ドメイン層エラー定義
//!
//! 値オブジェクトの生成時に発生する検証エラーを表現する。
//!
//! | エラー種別 | HTTP ステータス | 用途 |
//! |-----------|----------------|------|
//! | `InvalidTenantId` | 400 Bad Request | テナント ID の形式不正 |
//! 
use thiserror::Error;

/// ドメイン層で発生するエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// テナント ID の形式が不正
    #[error("テナント ID の形式が不正です: {0}")]
    InvalidTenantId(String),
}
