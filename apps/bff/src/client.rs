//! # 外部 API クライアント
//!
//! 上流 API（Express）との通信を担当する。

pub mod upstream;

pub use upstream::{
    UpstreamBody,
    UpstreamClient,
    UpstreamClientImpl,
    UpstreamError,
    UpstreamRequest,
    UpstreamResponse,
};
