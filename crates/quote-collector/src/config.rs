//! 환경변수 기반 설정 모듈.
//!
//! `$CONFIG_DIR/.env`(기본 `config/.env`)를 읽은 뒤 환경변수에서 값을 가져옵니다.
//! 필수 값(앱키, 싱크 접속 정보)은 실제로 필요한 명령에서만 검증합니다.

use crate::error::CollectorError;
use crate::modules::{MAX_REQUEST_DELAY, MIN_REQUEST_DELAY};
use crate::Result;
use quote_data::{InfluxConfig, StorageBackend};
use quote_exchange::{KisConfig, KisEnvironment};
use secrecy::SecretString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 기본 설정 디렉터리
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Collector 전체 설정
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// `.env`, 토큰, 종목 목록이 있는 디렉터리
    pub config_dir: PathBuf,
    /// 토큰 저장소 백엔드
    pub storage_backend: StorageBackend,
    /// KIS 설정
    pub kis: KisSettings,
    /// 시계열 싱크 설정
    pub influx: InfluxSettings,
    /// 폴링 설정
    pub poll: PollConfig,
}

/// KIS 접속 설정
#[derive(Debug, Clone)]
pub struct KisSettings {
    /// 앱키
    pub app_key: Option<SecretString>,
    /// 앱시크릿
    pub app_secret: Option<SecretString>,
    /// 실전/모의
    pub environment: KisEnvironment,
    /// 기본 URL 재정의
    pub base_url: Option<String>,
    /// HTTP 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 시계열 싱크 설정
#[derive(Debug, Clone)]
pub struct InfluxSettings {
    /// 서버 URL
    pub url: Option<String>,
    /// API 토큰
    pub token: Option<SecretString>,
    /// 조직
    pub org: Option<String>,
    /// 버킷
    pub bucket: Option<String>,
    /// HTTP 타임아웃 (초)
    pub timeout_secs: u64,
}

/// 폴링 설정
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// 수집 주기 (분 단위)
    pub interval_minutes: u32,
    /// cron 표현식 재정의 (초 포함 6필드)
    pub cron: Option<String>,
    /// 종목 조회 후 대기 시간 (밀리초, 200~500)
    pub request_delay_ms: u64,
}

/// `$CONFIG_DIR/.env`와 현재 디렉터리의 `.env`를 환경에 로드합니다.
///
/// 이미 설정된 환경변수는 덮어쓰지 않습니다.
pub fn load_env_files() -> PathBuf {
    dotenvy::dotenv().ok();

    let config_dir = config_dir_from(|key| std::env::var(key).ok());
    dotenvy::from_path(config_dir.join(".env")).ok();
    config_dir
}

fn config_dir_from(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("CONFIG_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR))
}

impl CollectorConfig {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> Result<Self> {
        load_env_files();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 키 조회 함수로 설정 로드
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let secret = |key: &str| var(key).map(SecretString::from);

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(raw) => raw.parse().map_err(CollectorError::Config)?,
            None => StorageBackend::default(),
        };

        let environment = match var("KIS_ENVIRONMENT") {
            Some(raw) => raw.parse()?,
            None => KisEnvironment::default(),
        };

        let timeout_secs = env_var_parse(&var, "HTTP_TIMEOUT_SECS", 30);

        Ok(Self {
            config_dir: config_dir_from(&lookup),
            storage_backend,
            kis: KisSettings {
                app_key: secret("APP_KEY"),
                app_secret: secret("APP_SECRET"),
                environment,
                base_url: var("KIS_BASE_URL"),
                timeout_secs,
            },
            influx: InfluxSettings {
                url: var("INFLUXDB_URL"),
                token: secret("INFLUXDB_TOKEN"),
                org: var("INFLUXDB_ORG"),
                bucket: var("INFLUXDB_BUCKET"),
                timeout_secs,
            },
            poll: PollConfig {
                interval_minutes: env_var_parse(&var, "POLL_INTERVAL_MINUTES", 1),
                cron: var("POLL_CRON"),
                request_delay_ms: clamp_request_delay_ms(env_var_parse(
                    &var,
                    "REQUEST_DELAY_MS",
                    MIN_REQUEST_DELAY.as_millis() as u64,
                )),
            },
        })
    }

    /// 설정 디렉터리 경로
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }
}

impl KisSettings {
    /// KIS 클라이언트 설정 생성. 앱키/시크릿이 없으면 에러.
    pub fn to_kis_config(&self) -> Result<KisConfig> {
        let mut config = KisConfig::new(
            required(self.app_key.clone(), "APP_KEY")?,
            required(self.app_secret.clone(), "APP_SECRET")?,
        )
        .with_environment(self.environment)
        .with_timeout(self.timeout_secs);

        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }

        Ok(config)
    }
}

impl InfluxSettings {
    /// 싱크 설정 생성. 접속 정보가 하나라도 없으면 에러.
    pub fn to_influx_config(&self) -> Result<InfluxConfig> {
        let mut config = InfluxConfig::new(
            required(self.url.clone(), "INFLUXDB_URL")?,
            required(self.token.clone(), "INFLUXDB_TOKEN")?,
            required(self.org.clone(), "INFLUXDB_ORG")?,
            required(self.bucket.clone(), "INFLUXDB_BUCKET")?,
        );
        config.timeout_secs = self.timeout_secs;
        Ok(config)
    }
}

impl PollConfig {
    /// 스케줄 cron 표현식.
    ///
    /// 재정의가 없으면 평일 9~15시 N분 간격 (`0 */N 9-15 * * Mon-Fri`).
    pub fn cron_expression(&self) -> String {
        match &self.cron {
            Some(cron) => cron.clone(),
            None => format!(
                "0 */{} 9-15 * * Mon-Fri",
                self.interval_minutes.clamp(1, 59)
            ),
        }
    }

    /// 종목 조회 후 대기 시간을 Duration으로 반환
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }
}

fn clamp_request_delay_ms(ms: u64) -> u64 {
    ms.clamp(
        MIN_REQUEST_DELAY.as_millis() as u64,
        MAX_REQUEST_DELAY.as_millis() as u64,
    )
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| CollectorError::Config(format!("{} 환경변수가 설정되지 않았습니다", key)))
}

/// 환경변수에서 값을 파싱 (실패 시 기본값 사용)
fn env_var_parse<T: std::str::FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> T {
    var(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
