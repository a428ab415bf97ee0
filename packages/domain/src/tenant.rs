//! # テナント
//!
//! マルチテナント SaaS における顧客組織（教育機関）の識別子。
//!
//! ## 設計判断
//!
//! 上流 API（Express / MongoDB）はテナントを ObjectId 文字列やスラッグで表現する。
//! BFF はその値を解釈せずに中継するため、`TenantId` は `String` の Newtype とする。
//!
//! ただし、テナント ID はキャッシュキーと無効化パターン（`students:list:{tenant}:*`）に
//! 埋め込まれる。`*` などのグロブ文字が紛れ込むと他テナントのキーまで削除しかねないため、
//! 受け付ける文字を `[A-Za-z0-9_-]` の 1〜64 文字に限定する。
//! `-` 1 文字はキャッシュキーで「テナント不明」を表すため、テナント ID としては使えない。
//!
//! ## 使用例
//!
//! ```rust
//! use edusuite_domain::tenant::TenantId;
//!
//! let tenant_id = TenantId::parse("65f1c0ffee0123456789abcd").unwrap();
//! assert_eq!(tenant_id.as_str(), "65f1c0ffee0123456789abcd");
//!
//! assert!(TenantId::parse("tenant:*").is_err());
//! ```

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::DomainError;

/// テナント ID の最大長
const MAX_TENANT_ID_LEN: usize = 64;

/// キャッシュキーでテナント不明を表す値
pub const UNKNOWN_TENANT_MARKER: &str = "-";

/// テナント（教育機関）の一意識別子
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[display("{_0}")]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// 文字列からテナント ID を作成する
    ///
    /// 前後の空白は取り除く。空文字、64 文字超過、許可外の文字を含む場合と
    /// [`UNKNOWN_TENANT_MARKER`] そのものの場合は `DomainError::InvalidTenantId` を返す。
    pub fn parse(value: impl AsRef<str>) -> Result<Self, DomainError> {
        let value = value.as_ref().trim();

        let valid = !value.is_empty()
            && value != UNKNOWN_TENANT_MARKER
            && value.len() <= MAX_TENANT_ID_LEN
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

        if !valid {
            return Err(DomainError::InvalidTenantId(value.to_string()));
        }

        Ok(Self(value.to_string()))
    }

    /// 内部の文字列参照を取得する
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TenantId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TenantId> for String {
    fn from(id: TenantId) -> Self {
        id.0
    }
}
