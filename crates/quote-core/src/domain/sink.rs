//! 시계열 메트릭 싱크 추상화.
//!
//! 수집 주기마다 싱크 연결을 하나 열고(`open`), 종목별로 포인트를 기록한 뒤
//! 반드시 닫습니다(`close`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 싱크 에러.
#[derive(Debug, Error)]
pub enum SinkError {
    /// 연결 생성 실패
    #[error("싱크 연결 실패: {0}")]
    Connection(String),

    /// 쓰기 요청 거부
    #[error("싱크 쓰기 거부 (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// 기록할 수 없는 포인트
    #[error("잘못된 포인트: {0}")]
    InvalidPoint(String),
}

/// 포인트 필드 값.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    /// 정수
    Integer(i64),
    /// 실수
    Float(f64),
}

/// 시계열 포인트.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    /// measurement 이름
    pub measurement: String,
    /// 태그 (삽입 순서 유지)
    pub tags: Vec<(String, String)>,
    /// 필드 (삽입 순서 유지)
    pub fields: Vec<(String, FieldValue)>,
    /// 타임스탬프 (없으면 서버 수신 시각)
    pub timestamp: Option<DateTime<Utc>>,
}

impl DataPoint {
    /// 빈 포인트를 생성합니다.
    pub fn new(measurement: impl Into<String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Vec::new(),
            fields: Vec::new(),
            timestamp: None,
        }
    }

    /// 태그를 추가합니다.
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// 필드를 추가합니다.
    pub fn field(mut self, key: impl Into<String>, value: FieldValue) -> Self {
        self.fields.push((key.into(), value));
        self
    }

    /// 타임스탬프를 설정합니다.
    pub fn timestamp(mut self, ts: DateTime<Utc>) -> Self {
        self.timestamp = Some(ts);
        self
    }
}

/// 한 수집 주기 동안 유지되는 싱크 연결.
#[async_trait]
pub trait SinkConnection: Send {
    /// 포인트 하나를 기록합니다.
    async fn write(&mut self, point: &DataPoint) -> Result<(), SinkError>;

    /// 연결을 닫습니다.
    async fn close(self: Box<Self>) -> Result<(), SinkError>;
}

/// 메트릭 싱크 trait.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    /// 새 연결을 엽니다.
    async fn open(&self) -> Result<Box<dyn SinkConnection>, SinkError>;
}
