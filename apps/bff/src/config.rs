//! # BFF 設定
//!
//! 環境変数から BFF サーバーの設定を読み込む。

use std::{env, time::Duration};

use edusuite_infra::cache::DEFAULT_MAX_ENTRIES;
use thiserror::Error;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
const DEFAULT_UPSTREAM_HEALTH_PATH: &str = "/health";

/// 設定読み込みエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} が設定されていません")]
    Missing(&'static str),

    #[error("{name} の値が不正です: {value}")]
    Invalid { name: &'static str, value: String },
}

/// BFF サーバーの設定
#[derive(Debug, Clone)]
pub struct BffConfig {
    /// バインドアドレス
    pub host: String,
    /// ポート番号
    pub port: u16,
    /// 上流 API（Express）のベース URL
    pub upstream_url: String,
    /// 上流 API 呼び出しのタイムアウト
    pub upstream_timeout: Duration,
    /// Readiness Check で叩く上流のパス
    pub upstream_health_path: String,
    /// Redis 接続 URL（未設定ならメモリキャッシュのみ）
    pub redis_url: Option<String>,
    /// メモリキャッシュの最大エントリ数
    pub cache_max_entries: usize,
}

impl BffConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 任意の取得関数から設定を読み込む
    ///
    /// テストでは環境変数を書き換えずに検証できるよう、この関数を使う。
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = get("BFF_PORT").ok_or(ConfigError::Missing("BFF_PORT"))?;
        let upstream_url = get("UPSTREAM_URL")
            .or_else(|| get("EXPRESS_BACKEND_URL"))
            .ok_or(ConfigError::Missing("UPSTREAM_URL"))?;

        Ok(Self {
            host: get("BFF_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_value("BFF_PORT", &port)?,
            upstream_url,
            upstream_timeout: Duration::from_secs(parse_or(
                "UPSTREAM_TIMEOUT_SECS",
                get("UPSTREAM_TIMEOUT_SECS"),
                DEFAULT_UPSTREAM_TIMEOUT_SECS,
            )?),
            upstream_health_path: get("UPSTREAM_HEALTH_PATH")
                .unwrap_or_else(|| DEFAULT_UPSTREAM_HEALTH_PATH.to_string()),
            redis_url: get("REDIS_URL"),
            cache_max_entries: parse_or(
                "CACHE_MAX_ENTRIES",
                get("CACHE_MAX_ENTRIES"),
                DEFAULT_MAX_ENTRIES,
            )?,
        })
    }
}

fn parse_value<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        value: value.to_string(),
    })
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(v) => parse_value(name, &v),
        None => Ok(default),
    }
}
