//! 국내 주식시장 거래 시간 판정.
//!
//! 한국 시간(Asia/Seoul) 기준 평일 09:00:00 ~ 15:30:00 (양 끝 포함)을
//! 장중으로 봅니다. 공휴일은 판정하지 않습니다.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use chrono_tz::Asia::Seoul;
use chrono_tz::Tz;

/// 정규장 시작 시각.
const KRX_OPEN: NaiveTime = hms(9, 0, 0);
/// 정규장 마감 시각 (포함).
const KRX_CLOSE: NaiveTime = hms(15, 30, 0);

const fn hms(hour: u32, min: u32, sec: u32) -> NaiveTime {
    match NaiveTime::from_hms_opt(hour, min, sec) {
        Some(time) => time,
        None => panic!("invalid time of day"),
    }
}

/// 장 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarketStatus {
    /// 거래 가능 (장 시작)
    Open,
    /// 휴장 (주말)
    Closed,
    /// 평일 장 시작 전
    PreMarket,
    /// 평일 장 마감 후
    AfterHours,
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarketStatus::Open => write!(f, "Open"),
            MarketStatus::Closed => write!(f, "Closed"),
            MarketStatus::PreMarket => write!(f, "Pre-Market"),
            MarketStatus::AfterHours => write!(f, "After-Hours"),
        }
    }
}

/// 거래 시간 판정기. 순수 함수이며 상태가 없습니다.
#[derive(Debug, Clone, Copy)]
pub struct MarketClock {
    timezone: Tz,
    open: NaiveTime,
    close: NaiveTime,
}

impl Default for MarketClock {
    fn default() -> Self {
        Self::krx()
    }
}

impl MarketClock {
    /// 한국거래소 정규장 (09:00 ~ 15:30, Asia/Seoul).
    pub fn krx() -> Self {
        Self {
            timezone: Seoul,
            open: KRX_OPEN,
            close: KRX_CLOSE,
        }
    }

    /// 기준 시간대.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// 주어진 시각의 장 상태.
    pub fn status(&self, now: DateTime<Utc>) -> MarketStatus {
        let local = now.with_timezone(&self.timezone);

        if matches!(local.weekday(), Weekday::Sat | Weekday::Sun) {
            return MarketStatus::Closed;
        }

        let time = local.time();
        if time < self.open {
            MarketStatus::PreMarket
        } else if time > self.close {
            MarketStatus::AfterHours
        } else {
            MarketStatus::Open
        }
    }

    /// 주어진 시각이 장중인지 확인.
    pub fn is_market_open(&self, now: DateTime<Utc>) -> bool {
        self.status(now) == MarketStatus::Open
    }
}
