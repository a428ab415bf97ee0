//! 上流 API クライアントのエラー型

use thiserror::Error;

/// 上流 API クライアントエラー
///
/// 上流が返した 4xx / 5xx はエラーではなく [`UpstreamResponse`](super::UpstreamResponse)
/// としてそのまま中継する。ここに来るのは応答そのものが得られなかった場合だけである。
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    /// 接続失敗、タイムアウトなど
    #[error("ネットワークエラー: {0}")]
    Network(String),

    /// 2xx だがボディを解釈できない
    #[error("不正なレスポンスボディ: {0}")]
    InvalidBody(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Network(err.to_string())
    }
}
