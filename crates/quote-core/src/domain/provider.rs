//! 시세 제공자 추상화.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Quote, Symbol};

/// 시세 제공자 에러.
///
/// 단일 종목 조회에 한정된 실패이며, 호출자는 다음 종목으로 진행합니다.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// 토큰 발급 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// 재인증 후에도 토큰 만료 응답
    #[error("토큰 만료: {0}")]
    TokenExpired(String),

    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 기타 에러
    #[error("기타 에러: {0}")]
    Other(String),
}

/// 단일 종목 시세 제공자 trait.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// 종목의 현재가를 조회합니다.
    ///
    /// 업무 오류나 잘못된 응답처럼 포기할 조회는 `Ok(None)`,
    /// 인증 실패처럼 치명적인 경우는 `Err`를 반환합니다.
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, ProviderError>;
}
