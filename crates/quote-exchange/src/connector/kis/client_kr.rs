//! KIS 국내 주식 시세 클라이언트.
//!
//! 주식현재가 시세 (GET /uapi/domestic-stock/v1/quotations/inquire-price)를
//! 조회하여 [`Quote`]로 변환합니다.
//!
//! 응답의 `msg_cd`가 토큰 만료(`EGW00123`)이면 HTTP 상태와 무관하게
//! 한 번 재인증 후 한 번만 재시도합니다.

use super::auth::KisAuth;
use super::token_store::Credential;
use super::tr_id;
use crate::ExchangeError;
use async_trait::async_trait;
use quote_core::{ProviderError, Quote, QuoteProvider, Symbol};
use serde::{Deserialize, Deserializer};
use tracing::{debug, error, info, warn};

/// 토큰 만료 메시지 코드.
pub const TOKEN_EXPIRED_MSG_CODE: &str = "EGW00123";

/// KIS 응답 공통 봉투.
#[derive(Debug, Deserialize)]
struct KisPriceResponse {
    #[serde(default)]
    rt_cd: String,
    #[serde(default)]
    msg_cd: String,
    #[serde(default)]
    msg1: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
}

/// 국내 주식 현재가 데이터.
#[derive(Debug, Clone, Deserialize)]
pub struct KrStockPrice {
    /// 종목코드 (단축)
    #[serde(rename = "stck_shrn_iscd", default)]
    pub stock_code: String,
    /// 현재가
    #[serde(rename = "stck_prpr", deserialize_with = "deserialize_int")]
    pub current_price: i64,
    /// 전일대비
    #[serde(rename = "prdy_vrss", deserialize_with = "deserialize_int")]
    pub price_change: i64,
    /// 등락률 (%)
    #[serde(rename = "prdy_ctrt", deserialize_with = "deserialize_float")]
    pub change_rate: f64,
    /// 누적거래량
    #[serde(rename = "acml_vol", deserialize_with = "deserialize_int")]
    pub volume: i64,
    /// 누적거래대금
    #[serde(rename = "acml_tr_pbmn", deserialize_with = "deserialize_int")]
    pub trading_value: i64,
    /// 당일 시가
    #[serde(rename = "stck_oprc", deserialize_with = "deserialize_int")]
    pub open: i64,
    /// 당일 고가
    #[serde(rename = "stck_hgpr", deserialize_with = "deserialize_int")]
    pub high: i64,
    /// 당일 저가
    #[serde(rename = "stck_lwpr", deserialize_with = "deserialize_int")]
    pub low: i64,
}

impl KrStockPrice {
    /// 종목 정보와 합쳐 시세 스냅샷을 만듭니다.
    pub fn into_quote(self, symbol: &Symbol) -> Quote {
        Quote {
            code: symbol.code.clone(),
            name: symbol.name.clone(),
            current_price: self.current_price,
            price_diff: self.price_change,
            change_rate: self.change_rate,
            volume: self.volume,
            trading_value: self.trading_value,
            open_price: self.open,
            high_price: self.high,
            low_price: self.low,
        }
    }
}

/// 단일 요청 결과.
enum PriceReply {
    /// 정상 시세
    Price(KrStockPrice),
    /// 토큰 만료 응답
    TokenExpired(String),
    /// 포기할 응답 (업무 오류, HTTP 오류, 형식 오류)
    Rejected,
}

/// KIS 국내 주식 시세 클라이언트.
pub struct KisQuoteClient {
    auth: KisAuth,
}

impl KisQuoteClient {
    /// 인증 클라이언트로 시세 클라이언트 생성.
    pub fn new(auth: KisAuth) -> Self {
        Self { auth }
    }

    /// 인증 클라이언트 참조 반환.
    pub fn auth(&self) -> &KisAuth {
        &self.auth
    }

    /// 저장된 토큰을 사용하고, 없으면 새로 발급받습니다.
    async fn credential(&self) -> Result<Credential, ExchangeError> {
        if let Some(credential) = self.auth.tokens().get().await {
            return Ok(credential);
        }
        info!("유효한 저장 토큰 없음, 새 토큰 발급");
        self.auth.authenticate().await
    }

    /// 종목 현재가 조회.
    ///
    /// 업무 오류나 형식 오류는 `Ok(None)`, 인증 실패와 재인증 후의
    /// 두 번째 토큰 만료, 네트워크 에러는 `Err`입니다.
    pub async fn get_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, ExchangeError> {
        let mut credential = self.credential().await?;
        let mut reauthenticated = false;

        loop {
            match self.request_price(&credential, &symbol.code).await? {
                PriceReply::Price(price) => {
                    let quote = price.into_quote(symbol);
                    info!(
                        code = %quote.code,
                        name = %quote.name,
                        price = quote.current_price,
                        change_rate = quote.change_rate,
                        "시세 조회 성공"
                    );
                    return Ok(Some(quote));
                }
                PriceReply::Rejected => return Ok(None),
                PriceReply::TokenExpired(message) if reauthenticated => {
                    error!(code = %symbol.code, "재인증 후에도 토큰 만료: {}", message);
                    return Err(ExchangeError::TokenExpired(message));
                }
                PriceReply::TokenExpired(message) => {
                    warn!(code = %symbol.code, "토큰 만료 응답, 재인증 후 재시도: {}", message);
                    credential = self.auth.authenticate().await?;
                    reauthenticated = true;
                }
            }
        }
    }

    async fn request_price(
        &self,
        credential: &Credential,
        stock_code: &str,
    ) -> Result<PriceReply, ExchangeError> {
        let url = format!(
            "{}/uapi/domestic-stock/v1/quotations/inquire-price",
            self.auth.config().rest_base_url()
        );
        let headers = self.auth.build_headers(credential, tr_id::KR_PRICE)?;

        let response = self
            .auth
            .client()
            .get(&url)
            .headers(headers)
            .query(&[("FID_COND_MRKT_DIV_CODE", "J"), ("FID_INPUT_ISCD", stock_code)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        debug!("KR price response: {}", body);

        let resp = match serde_json::from_str::<KisPriceResponse>(&body) {
            Ok(resp) => resp,
            Err(e) => {
                error!(code = stock_code, status = %status, "시세 응답 파싱 실패: {}", e);
                return Ok(PriceReply::Rejected);
            }
        };

        if resp.msg_cd == TOKEN_EXPIRED_MSG_CODE {
            return Ok(PriceReply::TokenExpired(format!("{} {}", resp.msg_cd, resp.msg1)));
        }

        if !status.is_success() || resp.rt_cd != "0" {
            error!(
                code = stock_code,
                status = %status,
                rt_cd = %resp.rt_cd,
                msg_cd = %resp.msg_cd,
                "KR price inquiry failed: {}",
                resp.msg1
            );
            return Ok(PriceReply::Rejected);
        }

        let Some(output) = resp.output else {
            error!(code = stock_code, "시세 응답에 output 없음");
            return Ok(PriceReply::Rejected);
        };

        match serde_json::from_value::<KrStockPrice>(output) {
            Ok(price) => Ok(PriceReply::Price(price)),
            Err(e) => {
                error!(code = stock_code, "시세 숫자 필드 파싱 실패: {}", e);
                Ok(PriceReply::Rejected)
            }
        }
    }
}

#[async_trait]
impl QuoteProvider for KisQuoteClient {
    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<Quote>, ProviderError> {
        self.get_quote(symbol).await.map_err(ProviderError::from)
    }
}

/// 문자열 또는 숫자로 오는 필드.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Text(String),
    Int(i64),
    Float(f64),
}

fn deserialize_int<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(v) => Ok(v),
        RawNumber::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid integer: '{}'", s))),
        RawNumber::Float(v) => Err(serde::de::Error::custom(format!(
            "Invalid integer: {}",
            v
        ))),
    }
}

fn deserialize_float<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = match RawNumber::deserialize(deserializer)? {
        RawNumber::Int(v) => v as f64,
        RawNumber::Float(v) => v,
        RawNumber::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("Invalid float: '{}'", s)))?,
    };

    if value.is_finite() {
        Ok(value)
    } else {
        Err(serde::de::Error::custom("Non-finite float"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn output() -> serde_json::Value {
        json!({
            "stck_shrn_iscd": "005930",
            "stck_prpr": "70000",
            "prdy_vrss": "1000",
            "prdy_ctrt": "1.45",
            "acml_vol": "1000000",
            "acml_tr_pbmn": "70000000000",
            "stck_oprc": "69000",
            "stck_hgpr": "71000",
            "stck_lwpr": "68000"
        })
    }

    #[test]
    fn test_parse_price_output() {
        let price: KrStockPrice = serde_json::from_value(output()).unwrap();
        let quote = price.into_quote(&Symbol::new("005930", "삼성전자"));

        assert_eq!(quote.name, "삼성전자");
        assert_eq!(quote.current_price, 70000);
        assert_eq!(quote.price_diff, 1000);
        assert!((quote.change_rate - 1.45).abs() < f64::EPSILON);
        assert_eq!(quote.trading_value, 70_000_000_000);
        assert_eq!(quote.low_price, 68000);
    }

    #[test]
    fn test_negative_values() {
        let mut value = output();
        value["prdy_vrss"] = json!("-1500");
        value["prdy_ctrt"] = json!("-2.10");

        let price: KrStockPrice = serde_json::from_value(value).unwrap();
        assert_eq!(price.price_change, -1500);
        assert!((price.change_rate + 2.10).abs() < f64::EPSILON);
    }

    #[test]
    fn test_malformed_numbers_are_rejected() {
        for (field, bad) in [
            ("stck_prpr", json!("")),
            ("stck_prpr", json!("70,000")),
            ("acml_vol", json!("1.5")),
            ("prdy_ctrt", json!("abc")),
            ("prdy_ctrt", json!("NaN")),
        ] {
            let mut value = output();
            value[field] = bad;
            assert!(
                serde_json::from_value::<KrStockPrice>(value).is_err(),
                "{} should be rejected",
                field
            );
        }
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value = output();
        value.as_object_mut().unwrap().remove("stck_hgpr");
        assert!(serde_json::from_value::<KrStockPrice>(value).is_err());
    }
}
