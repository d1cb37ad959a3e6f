//! 한국투자증권 (KIS) 연동 모듈.
//!
//! # 기능
//!
//! - OAuth 2.0 접근 토큰 발급 및 영속 캐시 (발급 후 23시간 유효)
//! - 국내 주식 현재가 조회 (토큰 만료 시 1회 재인증 후 재시도)
//! - 정규장 거래 시간 판정
//!
//! # API 문서
//!
//! 공식 API 문서: <https://apiportal.koreainvestment.com/>
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use quote_exchange::connector::kis::{KisAuth, KisConfig, KisQuoteClient, TokenStore};
//!
//! let tokens = Arc::new(TokenStore::new(record_store));
//! let auth = KisAuth::new(KisConfig::new(app_key, app_secret), tokens)?;
//! let client = KisQuoteClient::new(auth);
//!
//! let quote = client.get_quote(&Symbol::new("005930", "삼성전자")).await?;
//! ```

pub mod auth;
pub mod client_kr;
pub mod config;
pub mod market_hours;
pub mod token_store;

pub use auth::KisAuth;
pub use client_kr::{KisQuoteClient, KrStockPrice, TOKEN_EXPIRED_MSG_CODE};
pub use config::{KisConfig, KisEnvironment};
pub use market_hours::{MarketClock, MarketStatus};
pub use token_store::{Credential, TokenStore, CREDENTIAL_TTL_HOURS, TOKEN_COLLECTION};

/// 거래 ID (TR_ID).
pub mod tr_id {
    /// 주식현재가 시세 (실전/모의 공통)
    pub const KR_PRICE: &str = "FHKST01010100";
}
