//! # EduSuite ドメイン層
//!
//! BFF が扱う値オブジェクトを定義する。
//!
//! 業務エンティティ（生徒、支払い、試験など）は上流 API が所有しており、
//! BFF は JSON をそのまま中継する。そのため、このクレートが持つのは
//! テナント識別子とレスポンスキャッシュのキー設計だけである。
//!
//! ## モジュール構成
//!
//! - [`tenant`] - テナント ID
//! - [`cache`] - キャッシュキー、TTL、名前空間、無効化パターン
//! - [`error`] - ドメイン層エラー

pub mod cache;
pub mod error;
pub mod tenant;

pub use error::DomainError;
