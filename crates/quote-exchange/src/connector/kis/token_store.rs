//! 접근 토큰 영속 저장소.
//!
//! 발급된 토큰을 `token` 컬렉션에 `{"access_token", "issued_time"}` 형식으로
//! 기록하고, 발급 후 23시간이 지나지 않은 최신 토큰만 유효로 봅니다.
//! 네트워크 접근은 하지 않습니다.

use crate::ExchangeError;
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use quote_core::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// 토큰 컬렉션 이름.
pub const TOKEN_COLLECTION: &str = "token";

/// 토큰 유효 기간 (발급 기준 23시간).
pub const CREDENTIAL_TTL_HOURS: i64 = 23;

/// 발급 시각이 기록된 접근 토큰.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    /// 접근 토큰
    pub token: String,
    /// 발급 시각
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    /// 새 토큰 생성.
    pub fn new(token: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            token: token.into(),
            issued_at,
        }
    }

    /// 주어진 시각에 유효한지 확인.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now - self.issued_at < Duration::hours(CREDENTIAL_TTL_HOURS)
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.issued_at + Duration::hours(CREDENTIAL_TTL_HOURS)
    }

    /// 인증 헤더 값 반환.
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// 저장 레코드 형식.
#[derive(Debug, Serialize, Deserialize)]
struct TokenRecord {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    issued_time: String,
}

impl TokenRecord {
    fn from_credential(credential: &Credential) -> Self {
        Self {
            access_token: credential.token.clone(),
            issued_time: credential.issued_at.to_rfc3339(),
        }
    }

    /// 레코드를 토큰으로 변환합니다. 토큰이나 시각이 비어 있으면 `None`.
    fn into_credential(self) -> Option<Credential> {
        if self.access_token.is_empty() || self.issued_time.is_empty() {
            return None;
        }
        let issued_at = parse_issued_time(&self.issued_time)?;
        Some(Credential::new(self.access_token, issued_at))
    }
}

/// 발급 시각 파싱.
///
/// 오프셋이 있는 RFC 3339 형식을 우선하고, 오프셋 없는 ISO 형식은
/// 로컬 시각으로 해석합니다.
fn parse_issued_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// 접근 토큰 저장소.
///
/// 동시 접근은 내부 뮤텍스로 직렬화됩니다. 마지막으로 기록한 토큰은
/// 메모리에도 보관하여, 영속 저장소가 실패해도 만료 전까지 재사용합니다.
pub struct TokenStore {
    store: Arc<dyn RecordStore>,
    issued: Mutex<Option<Credential>>,
}

impl TokenStore {
    /// 레코드 저장소 위에 토큰 저장소를 생성합니다.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            issued: Mutex::new(None),
        }
    }

    /// 현재 유효한 토큰을 반환합니다.
    pub async fn get(&self) -> Option<Credential> {
        self.get_at(Utc::now()).await
    }

    /// 주어진 시각 기준으로 유효한 최신 토큰을 반환합니다.
    ///
    /// 저장소에 유효한 토큰이 없으면 이 프로세스가 마지막으로 기록한 토큰을
    /// 확인합니다. 저장소를 읽을 수 없거나 레코드가 손상된 경우에도 에러 없이 `None`.
    pub async fn get_at(&self, now: DateTime<Utc>) -> Option<Credential> {
        let issued = self.issued.lock().await;

        if let Some(credential) = self.read_stored(now).await {
            return Some(credential);
        }

        issued.clone().filter(|credential| {
            let valid = credential.is_valid_at(now);
            if valid {
                debug!(expires_at = %credential.expires_at(), "메모리 토큰 사용");
            }
            valid
        })
    }

    async fn read_stored(&self, now: DateTime<Utc>) -> Option<Credential> {
        let record = match self.store.latest(TOKEN_COLLECTION).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("저장된 토큰 없음");
                return None;
            }
            Err(e) => {
                warn!(store = %self.store.describe(), error = %e, "토큰 저장소 읽기 실패");
                return None;
            }
        };

        let credential = match serde_json::from_value::<TokenRecord>(record) {
            Ok(record) => record.into_credential()?,
            Err(e) => {
                warn!(error = %e, "토큰 레코드 형식 오류");
                return None;
            }
        };

        if credential.is_valid_at(now) {
            debug!(expires_at = %credential.expires_at(), "저장된 토큰 사용");
            Some(credential)
        } else {
            debug!(issued_at = %credential.issued_at, "저장된 토큰 만료");
            None
        }
    }

    /// 토큰을 현재 시각으로 기록합니다.
    pub async fn put(&self, token: &str) -> Result<Credential, ExchangeError> {
        self.put_at(token, Utc::now()).await
    }

    /// 토큰을 주어진 발급 시각으로 기록합니다.
    ///
    /// 영속 기록에 실패해도 메모리 사본은 갱신됩니다.
    pub async fn put_at(
        &self,
        token: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<Credential, ExchangeError> {
        let credential = Credential::new(token, issued_at);
        let record = serde_json::to_value(TokenRecord::from_credential(&credential))?;

        let mut issued = self.issued.lock().await;
        *issued = Some(credential.clone());
        self.store.insert(TOKEN_COLLECTION, record).await?;

        Ok(credential)
    }
}
