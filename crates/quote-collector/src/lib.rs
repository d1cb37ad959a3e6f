//! KRX 현재가 수집기.
//!
//! 이 crate는 장중에 주기적으로 종목 현재가를 조회해 시계열 DB에 기록하는
//! 바이너리를 제공합니다:
//! - 환경변수 기반 설정
//! - 시장 시간 기반 폴링 스케줄러 (중복 실행 방지)
//! - 종목별 장애 격리 수집 주기

pub mod config;
pub mod context;
pub mod error;
pub mod modules;
pub mod scheduler;
pub mod stats;

pub use config::CollectorConfig;
pub use context::AppContext;
pub use error::{CollectorError, Result};
pub use scheduler::{CycleOutcome, PollScheduler};
pub use stats::CycleStats;
