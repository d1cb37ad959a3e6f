//! 수집 주기 통계.

use serde::Serialize;
use std::time::Duration;

/// 한 수집 주기의 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleStats {
    /// 대상 종목 수
    pub total: usize,
    /// 싱크 기록까지 성공한 종목 수
    pub success: usize,
    /// 조회는 끝났지만 시세가 없는 종목 수
    pub empty: usize,
    /// 에러로 건너뛴 종목 수
    pub errors: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, operation: &str) {
        tracing::info!(
            operation = operation,
            total = self.total,
            success = self.success,
            empty = self.empty,
            errors = self.errors,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "수집 주기 완료"
        );
    }
}
