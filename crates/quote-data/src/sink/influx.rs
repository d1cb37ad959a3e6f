//! 라인 프로토콜 HTTP 쓰기 API 싱크.
//!
//! `POST {url}/api/v2/write?org=..&bucket=..&precision=ns`,
//! `Authorization: Token <token>` 헤더를 사용합니다.

use super::line_protocol;
use async_trait::async_trait;
use quote_core::{DataPoint, MetricsSink, SinkConnection, SinkError};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, error, info};

/// 시계열 DB 접속 설정.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// 서버 URL (예: "http://localhost:8086")
    pub url: String,
    /// API 토큰
    pub token: SecretString,
    /// 조직
    pub org: String,
    /// 버킷
    pub bucket: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl InfluxConfig {
    /// 새 설정을 생성합니다.
    pub fn new(
        url: impl Into<String>,
        token: SecretString,
        org: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            token,
            org: org.into(),
            bucket: bucket.into(),
            timeout_secs: 30,
        }
    }

    /// 쓰기 API URL.
    pub fn write_url(&self) -> String {
        format!("{}/api/v2/write", self.url.trim_end_matches('/'))
    }
}

/// 라인 프로토콜 싱크.
pub struct InfluxSink {
    config: InfluxConfig,
}

impl InfluxSink {
    /// 새 싱크를 생성합니다.
    pub fn new(config: InfluxConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl MetricsSink for InfluxSink {
    async fn open(&self) -> Result<Box<dyn SinkConnection>, SinkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .build()
            .map_err(|e| SinkError::Connection(format!("HTTP client 생성 실패: {}", e)))?;

        debug!(url = %self.config.url, bucket = %self.config.bucket, "싱크 연결 열기");

        Ok(Box::new(InfluxConnection {
            client,
            config: self.config.clone(),
            written: 0,
        }))
    }
}

/// 한 수집 주기 동안의 쓰기 연결.
struct InfluxConnection {
    client: Client,
    config: InfluxConfig,
    written: usize,
}

#[async_trait]
impl SinkConnection for InfluxConnection {
    async fn write(&mut self, point: &DataPoint) -> Result<(), SinkError> {
        let line = line_protocol::encode(point)?;

        let response = self
            .client
            .post(self.config.write_url())
            .query(&[
                ("org", self.config.org.as_str()),
                ("bucket", self.config.bucket.as_str()),
                ("precision", "ns"),
            ])
            .header(
                "Authorization",
                format!("Token {}", self.config.token.expose_secret()),
            )
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(line)
            .send()
            .await
            .map_err(|e| SinkError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Point write failed: {} - {}", status, body);
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        self.written += 1;
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), SinkError> {
        info!(written = self.written, "싱크 연결 닫기");
        Ok(())
    }
}
