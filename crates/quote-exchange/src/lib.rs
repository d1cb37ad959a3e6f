//! 증권사 API 연동.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - KIS 접근 토큰 발급 및 저장소 기반 캐시
//! - 국내 주식 현재가 조회 (`QuoteProvider` 구현)
//! - 정규장 거래 시간 판정

pub mod connector;
pub mod error;

pub use connector::kis::{
    Credential, KisAuth, KisConfig, KisEnvironment, KisQuoteClient, MarketClock, MarketStatus,
    TokenStore,
};
pub use error::*;
