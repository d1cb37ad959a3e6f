//! 시장 시간 기반 폴링 스케줄러.
//!
//! cron 일정(평일 9~15시, 한국 시간)은 대략적인 1차 필터이고, 실제 실행 여부는
//! 매 발화 시 [`MarketClock`]이 판정합니다. 동시에 한 주기만 실행되며 겹치는
//! 발화는 건너뜁니다.

use crate::modules::PricePoll;
use crate::{CycleStats, Result};
use chrono::{DateTime, Utc};
use quote_exchange::{MarketClock, MarketStatus};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// 발화 한 번의 결과
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// 장 운영 시간이 아니어서 건너뜀
    MarketClosed(MarketStatus),
    /// 이전 주기가 진행 중이어서 건너뜀
    Overlapped,
    /// 주기 완료
    Completed(CycleStats),
    /// 주기 전체 실패 (종목 목록 로드, 싱크 연결)
    Failed(String),
}

/// 폴링 스케줄러
pub struct PollScheduler {
    poll: PricePoll,
    clock: MarketClock,
    running: Mutex<()>,
}

impl PollScheduler {
    /// 새 스케줄러 생성
    pub fn new(poll: PricePoll, clock: MarketClock) -> Self {
        Self {
            poll,
            clock,
            running: Mutex::new(()),
        }
    }

    /// 현재 시각으로 발화
    pub async fn fire(&self) -> CycleOutcome {
        self.fire_at(Utc::now()).await
    }

    /// 주어진 시각으로 발화. 장중일 때만 수집 주기를 실행합니다.
    pub async fn fire_at(&self, now: DateTime<Utc>) -> CycleOutcome {
        self.run_guarded(Some(now)).await
    }

    /// 시장 시간 확인 없이 수집 주기 실행
    pub async fn run_now(&self) -> CycleOutcome {
        self.run_guarded(None).await
    }

    async fn run_guarded(&self, gate_at: Option<DateTime<Utc>>) -> CycleOutcome {
        let Ok(_guard) = self.running.try_lock() else {
            warn!("이전 수집 주기 진행 중, 이번 발화 건너뜀");
            return CycleOutcome::Overlapped;
        };

        if let Some(now) = gate_at {
            let status = self.clock.status(now);
            if status != MarketStatus::Open {
                info!(status = %status, "장 운영 시간 아님, 수집 건너뜀");
                return CycleOutcome::MarketClosed(status);
            }
        }

        match self.poll.run_cycle().await {
            Ok(stats) => {
                stats.log_summary("현재가 수집");
                CycleOutcome::Completed(stats)
            }
            Err(e) => {
                error!(error = %e, "수집 주기 실패");
                CycleOutcome::Failed(e.to_string())
            }
        }
    }

    /// cron 일정으로 작업을 등록하고 스케줄러를 시작합니다.
    ///
    /// 반환된 `JobScheduler`의 `shutdown`으로 중지합니다.
    pub async fn start(self: Arc<Self>, cron: &str) -> Result<JobScheduler> {
        let sched = JobScheduler::new().await?;

        let scheduler = self.clone();
        let job = Job::new_async_tz(cron, self.clock.timezone(), move |_uuid, _l| {
            let scheduler = scheduler.clone();
            Box::pin(async move {
                scheduler.fire().await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!(cron = cron, timezone = %self.clock.timezone(), "폴링 스케줄 등록");
        Ok(sched)
    }
}
