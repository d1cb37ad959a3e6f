//! 에러 타입 정의.

use quote_core::{ProviderError, SinkError, StoreError};
use quote_exchange::ExchangeError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Collector 에러 타입
#[derive(Debug, Error)]
pub enum CollectorError {
    /// 설정 에러
    #[error("Configuration error: {0}")]
    Config(String),

    /// 저장소 에러 (종목 목록, 토큰)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// 메트릭 싱크 에러
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// 시세 제공자 에러
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// 증권사 연동 에러
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    /// 스케줄러 에러
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
