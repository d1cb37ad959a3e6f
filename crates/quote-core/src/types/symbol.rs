//! 수집 대상 종목 정의.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 수집 대상 종목.
///
/// 외부 목록(`stocks.json` 또는 문서 저장소의 `stocks` 테이블)에서 읽어오는
/// 참조 데이터입니다. 종목코드 중복은 검사하지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 종목코드 (예: "005930")
    pub code: String,
    /// 표시용 종목명 (예: "삼성전자")
    pub name: String,
}

impl Symbol {
    /// 새 종목을 생성합니다.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_display() {
        let symbol = Symbol::new("005930", "삼성전자");
        assert_eq!(symbol.to_string(), "삼성전자(005930)");
    }

    #[test]
    fn test_symbol_deserialize_ignores_field_order() {
        let json = r#"{"name": "NAVER", "code": "035420"}"#;
        let symbol: Symbol = serde_json::from_str(json).unwrap();
        assert_eq!(symbol, Symbol::new("035420", "NAVER"));
    }
}
