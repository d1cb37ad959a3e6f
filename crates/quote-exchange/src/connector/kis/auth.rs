//! KIS OAuth 2.0 인증 모듈.
//!
//! 접근 토큰 발급 (POST /oauth2/tokenP)만 담당하며, 발급된 토큰은
//! [`TokenStore`]에 기록합니다. 캐시 판단은 호출자가 합니다.

use super::config::KisConfig;
use super::token_store::{Credential, TokenStore};
use crate::ExchangeError;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

/// KIS OAuth 토큰 응답.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    /// 접근 토큰
    pub access_token: String,
    /// 토큰 타입 (항상 "Bearer")
    #[serde(default)]
    pub token_type: Option<String>,
    /// 토큰 만료 시간 (초)
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// KIS OAuth 오류 응답 (토큰 발급 실패 시).
#[derive(Debug, Clone, Deserialize)]
struct KisOAuthErrorResponse {
    error_code: String,
    error_description: String,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    appkey: &'a str,
    appsecret: &'a str,
}

/// KIS 토큰 발급 클라이언트.
pub struct KisAuth {
    config: KisConfig,
    client: Client,
    tokens: Arc<TokenStore>,
}

impl KisAuth {
    /// 새로운 인증 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: KisConfig, tokens: Arc<TokenStore>) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ExchangeError::NetworkError(format!("HTTP client 생성 실패: {}", e)))?;

        Ok(Self {
            config,
            client,
            tokens,
        })
    }

    /// 설정 참조 반환.
    pub fn config(&self) -> &KisConfig {
        &self.config
    }

    /// 토큰 저장소 참조 반환.
    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    /// HTTP 클라이언트 참조 반환.
    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// 시세 조회용 요청 헤더 생성.
    pub fn build_headers(
        &self,
        credential: &Credential,
        tr_id: &str,
    ) -> Result<HeaderMap, ExchangeError> {
        fn value(name: &str, raw: &str) -> Result<HeaderValue, ExchangeError> {
            HeaderValue::from_str(raw).map_err(|_| {
                ExchangeError::ParseError(format!("{}에 유효하지 않은 문자 포함", name))
            })
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/json; charset=utf-8"),
        );
        headers.insert(
            "authorization",
            value("authorization", &credential.auth_header())?,
        );
        headers.insert(
            "appkey",
            value("app_key", self.config.app_key.expose_secret())?,
        );
        headers.insert(
            "appsecret",
            value("app_secret", self.config.app_secret.expose_secret())?,
        );
        headers.insert("tr_id", value("tr_id", tr_id)?);
        headers.insert("custtype", HeaderValue::from_static("P"));

        Ok(headers)
    }

    /// 새 접근 토큰을 발급받아 저장소에 기록합니다.
    ///
    /// 내부 재시도는 없으며, HTTP 실패 응답은 상태 코드와 본문을 담은
    /// `ExchangeError::Authentication`이 됩니다. 저장소 기록 실패는 경고만
    /// 남기고 발급된 토큰을 그대로 반환합니다.
    pub async fn authenticate(&self) -> Result<Credential, ExchangeError> {
        let app_key = self.config.app_key.expose_secret();
        info!(
            "Requesting new KIS access token... (AppKey: {}...)",
            app_key.chars().take(8).collect::<String>()
        );

        let url = format!("{}/oauth2/tokenP", self.config.rest_base_url());
        let request_body = TokenRequest {
            grant_type: "client_credentials",
            appkey: app_key,
            appsecret: self.config.app_secret.expose_secret(),
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json; charset=utf-8")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            match serde_json::from_str::<KisOAuthErrorResponse>(&body) {
                Ok(oauth_error) => error!(
                    code = %oauth_error.error_code,
                    "KIS OAuth 에러: {}", oauth_error.error_description
                ),
                Err(_) => error!("Token request failed: {} - {}", status, body),
            }
            return Err(ExchangeError::Authentication {
                status: status.as_u16(),
                body,
            });
        }

        let token_resp: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ExchangeError::ParseError(format!("Failed to parse token response: {}", e))
        })?;

        let stored = self.tokens.put(&token_resp.access_token).await;
        let credential = match stored {
            Ok(credential) => credential,
            Err(e) => {
                warn!(error = %e, "토큰 저장 실패, 발급된 토큰으로 계속 진행");
                Credential::new(token_resp.access_token, Utc::now())
            }
        };

        info!(
            "KIS access token obtained, valid until: {}",
            credential.expires_at()
        );

        Ok(credential)
    }
}
