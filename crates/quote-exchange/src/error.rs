//! 거래소 에러 타입.

use quote_core::{ProviderError, StoreError};
use thiserror::Error;

/// KIS 연동 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 요청 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 토큰 발급 실패
    #[error("Authentication failed (HTTP {status}): {body}")]
    Authentication { status: u16, body: String },

    /// 재인증 후에도 토큰 만료 응답
    #[error("Token expired: {0}")]
    TokenExpired(String),

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 토큰 저장소 에러
    #[error("Token store error: {0}")]
    Store(#[from] StoreError),

    /// 설정 에러
    #[error("Config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else {
            ExchangeError::NetworkError(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for ProviderError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::Authentication { .. } => ProviderError::Authentication(err.to_string()),
            ExchangeError::TokenExpired(msg) => ProviderError::TokenExpired(msg),
            ExchangeError::NetworkError(_) | ExchangeError::Timeout(_) => {
                ProviderError::Network(err.to_string())
            }
            other => ProviderError::Other(other.to_string()),
        }
    }
}
