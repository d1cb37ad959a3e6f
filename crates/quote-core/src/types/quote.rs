//! 시세 스냅샷 타입.

use crate::domain::{DataPoint, FieldValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 시세 포인트의 measurement 이름.
pub const QUOTE_MEASUREMENT: &str = "stock_price";

/// 단일 종목의 현재가 스냅샷.
///
/// 조회할 때마다 새로 만들어지며 싱크에 한 번 전달된 뒤 버려집니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// 종목코드
    pub code: String,
    /// 종목명
    pub name: String,
    /// 현재가
    pub current_price: i64,
    /// 전일대비
    pub price_diff: i64,
    /// 등락률 (%, 소수점 둘째 자리)
    pub change_rate: f64,
    /// 누적거래량
    pub volume: i64,
    /// 누적거래대금
    pub trading_value: i64,
    /// 시가
    pub open_price: i64,
    /// 고가
    pub high_price: i64,
    /// 저가
    pub low_price: i64,
}

impl Quote {
    /// 숫자 필드를 (이름, 값) 순서대로 반환합니다.
    pub fn numeric_fields(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("current_price", FieldValue::Integer(self.current_price)),
            ("price_diff", FieldValue::Integer(self.price_diff)),
            ("change_rate", FieldValue::Float(self.change_rate)),
            ("volume", FieldValue::Integer(self.volume)),
            ("trading_value", FieldValue::Integer(self.trading_value)),
            ("opening_price", FieldValue::Integer(self.open_price)),
            ("high_price", FieldValue::Integer(self.high_price)),
            ("low_price", FieldValue::Integer(self.low_price)),
        ]
    }

    /// 싱크에 기록할 포인트로 변환합니다.
    ///
    /// 종목코드와 종목명은 태그, 숫자 필드는 측정값이 됩니다.
    pub fn to_point(&self, timestamp: DateTime<Utc>) -> DataPoint {
        let mut point = DataPoint::new(QUOTE_MEASUREMENT)
            .tag("code", &self.code)
            .tag("name", &self.name)
            .timestamp(timestamp);

        for (key, value) in self.numeric_fields() {
            point = point.field(key, value);
        }

        point
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn samsung() -> Quote {
        Quote {
            code: "005930".to_string(),
            name: "삼성전자".to_string(),
            current_price: 70000,
            price_diff: 1000,
            change_rate: 1.45,
            volume: 1_000_000,
            trading_value: 70_000_000_000,
            open_price: 69000,
            high_price: 71000,
            low_price: 68000,
        }
    }

    #[test]
    fn test_to_point_tags_and_fields() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 4, 1, 0, 0).unwrap();
        let point = samsung().to_point(ts);

        assert_eq!(point.measurement, "stock_price");
        assert_eq!(
            point.tags,
            vec![
                ("code".to_string(), "005930".to_string()),
                ("name".to_string(), "삼성전자".to_string()),
            ]
        );
        assert_eq!(point.fields.len(), 8);
        assert_eq!(
            point.fields[0],
            ("current_price".to_string(), FieldValue::Integer(70000))
        );
        assert_eq!(
            point.fields[2],
            ("change_rate".to_string(), FieldValue::Float(1.45))
        );
        assert_eq!(point.timestamp, Some(ts));
    }

    #[test]
    fn test_field_keys_match_series_schema() {
        let keys: Vec<&str> = samsung().numeric_fields().iter().map(|(k, _)| *k).collect();

        assert_eq!(
            keys,
            vec![
                "current_price",
                "price_diff",
                "change_rate",
                "volume",
                "trading_value",
                "opening_price",
                "high_price",
                "low_price",
            ]
        );
    }
}
