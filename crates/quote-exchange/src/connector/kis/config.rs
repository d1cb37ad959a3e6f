//! 한국투자증권 (KIS) API 설정.
//!
//! 시세 조회에는 app_key와 app_secret만 필요합니다.

use crate::ExchangeError;
use secrecy::SecretString;
use std::str::FromStr;

/// KIS API 환경 유형.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KisEnvironment {
    /// 실전투자
    #[default]
    Real,
    /// 모의투자
    Paper,
}

impl KisEnvironment {
    /// 이 환경의 REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &'static str {
        match self {
            KisEnvironment::Real => "https://openapi.koreainvestment.com:9443",
            KisEnvironment::Paper => "https://openapivts.koreainvestment.com:29443",
        }
    }
}

impl FromStr for KisEnvironment {
    type Err = ExchangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "real" | "prod" => Ok(KisEnvironment::Real),
            "paper" | "mock" | "vts" => Ok(KisEnvironment::Paper),
            other => Err(ExchangeError::Config(format!(
                "알 수 없는 KIS 환경: '{}' (real|paper)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for KisEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KisEnvironment::Real => write!(f, "real"),
            KisEnvironment::Paper => write!(f, "paper"),
        }
    }
}

/// KIS API 설정.
#[derive(Debug, Clone)]
pub struct KisConfig {
    /// 앱키
    pub app_key: SecretString,
    /// 앱시크릿
    pub app_secret: SecretString,
    /// 환경 (실전/모의)
    pub environment: KisEnvironment,
    /// 기본 URL 재정의 (테스트 서버 등)
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl KisConfig {
    /// 새로운 KIS 설정 생성.
    pub fn new(app_key: SecretString, app_secret: SecretString) -> Self {
        Self {
            app_key,
            app_secret,
            environment: KisEnvironment::default(),
            base_url: None,
            timeout_secs: 30,
        }
    }

    /// 환경 설정.
    pub fn with_environment(mut self, environment: KisEnvironment) -> Self {
        self.environment = environment;
        self
    }

    /// 기본 URL 재정의.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// 타임아웃 설정.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// REST API 기본 URL 반환. 끝의 `/`는 제거됩니다.
    pub fn rest_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_base_url())
            .trim_end_matches('/')
            .to_string()
    }
}
