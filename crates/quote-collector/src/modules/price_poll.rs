//! 현재가 수집 주기.
//!
//! 종목 목록을 읽고 싱크 연결을 하나 연 뒤, 종목마다 순서대로 시세를 조회해
//! 기록합니다. 종목 하나의 실패(패닉 포함)는 기록만 하고 다음 종목으로
//! 진행하며, 싱크 연결은 어떤 경로로 끝나든 닫습니다.

use crate::{CycleStats, Result};
use chrono::Utc;
use futures::FutureExt;
use quote_core::{MetricsSink, QuoteProvider, SinkConnection, Symbol, SymbolSource};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// 종목 조회 후 최소 대기 시간
pub const MIN_REQUEST_DELAY: Duration = Duration::from_millis(200);
/// 종목 조회 후 최대 대기 시간
pub const MAX_REQUEST_DELAY: Duration = Duration::from_millis(500);

/// 종목 하나의 처리 결과
enum SymbolOutcome {
    /// 싱크에 기록됨
    Written,
    /// 시세 없음
    Empty,
}

/// 현재가 수집기
pub struct PricePoll {
    symbols: Arc<dyn SymbolSource>,
    provider: Arc<dyn QuoteProvider>,
    sink: Arc<dyn MetricsSink>,
    request_delay: Duration,
}

impl PricePoll {
    /// 새 수집기 생성
    pub fn new(
        symbols: Arc<dyn SymbolSource>,
        provider: Arc<dyn QuoteProvider>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            symbols,
            provider,
            sink,
            request_delay: MIN_REQUEST_DELAY,
        }
    }

    /// 종목 조회 후 대기 시간 설정 (200~500ms 범위로 보정)
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay.clamp(MIN_REQUEST_DELAY, MAX_REQUEST_DELAY);
        self
    }

    /// 수집 주기 한 번 실행.
    ///
    /// 종목 목록 로드나 싱크 연결에 실패하면 주기 전체가 에러입니다.
    pub async fn run_cycle(&self) -> Result<CycleStats> {
        let start = Instant::now();

        let symbols = self.symbols.load().await?;
        info!(count = symbols.len(), "수집 주기 시작");

        let mut conn = self.sink.open().await?;
        let mut stats = CycleStats::new(symbols.len());

        for symbol in &symbols {
            let outcome = AssertUnwindSafe(self.collect_one(conn.as_mut(), symbol))
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(SymbolOutcome::Written)) => stats.success += 1,
                Ok(Ok(SymbolOutcome::Empty)) => {
                    debug!(symbol = %symbol, "시세 없음");
                    stats.empty += 1;
                }
                Ok(Err(e)) => {
                    warn!(symbol = %symbol, error = %e, "종목 수집 실패");
                    stats.errors += 1;
                }
                Err(_) => {
                    error!(symbol = %symbol, "종목 수집 중 패닉 발생");
                    stats.errors += 1;
                }
            }

            tokio::time::sleep(self.request_delay).await;
        }

        if let Err(e) = conn.close().await {
            warn!(error = %e, "싱크 연결 닫기 실패");
        }

        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    async fn collect_one(
        &self,
        conn: &mut dyn SinkConnection,
        symbol: &Symbol,
    ) -> Result<SymbolOutcome> {
        let Some(quote) = self.provider.fetch_quote(symbol).await? else {
            return Ok(SymbolOutcome::Empty);
        };

        conn.write(&quote.to_point(Utc::now())).await?;

        Ok(SymbolOutcome::Written)
    }
}
