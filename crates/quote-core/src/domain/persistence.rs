//! 레코드 저장소 및 종목 목록 추상화.
//!
//! 토큰 저장소와 종목 목록은 같은 저장소 인터페이스 위에서 동작하며,
//! 구현체(플랫 JSON 파일, 문서 저장소)는 설정으로 선택합니다.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::types::Symbol;

// =============================================================================
// 에러 타입
// =============================================================================

/// 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 파일 입출력 에러
    #[error("저장소 입출력 에러: {0}")]
    Io(#[from] std::io::Error),

    /// 직렬화/역직렬화 에러
    #[error("저장소 직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 저장된 데이터 형식이 예상과 다름
    #[error("손상된 저장소 데이터: {0}")]
    Corrupt(String),
}

// =============================================================================
// RecordStore Trait
// =============================================================================

/// 컬렉션 단위로 JSON 레코드를 보관하는 저장소.
///
/// 컬렉션은 이름으로 구분되며(`token`, `stocks`), 레코드 순서는 삽입 순서를
/// 따릅니다. 구현체는 동시 호출에 대해 내부적으로 직렬화해야 합니다.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 컬렉션의 모든 레코드를 삽입 순서대로 반환합니다.
    ///
    /// 컬렉션이 없으면 빈 목록을 반환합니다.
    async fn all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;

    /// 컬렉션이 저장소에 존재하는지 확인합니다. 비어 있어도 존재할 수 있습니다.
    async fn contains(&self, collection: &str) -> Result<bool, StoreError> {
        Ok(!self.all(collection).await?.is_empty())
    }

    /// 가장 최근에 기록된 레코드를 반환합니다.
    async fn latest(&self, collection: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.all(collection).await?.pop())
    }

    /// 레코드를 기록합니다. 이후 `latest`는 이 레코드를 반환해야 합니다.
    async fn insert(&self, collection: &str, record: Value) -> Result<(), StoreError>;

    /// 컬렉션 내용을 주어진 레코드들로 교체합니다.
    async fn replace_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError>;

    /// 로그용 저장소 이름.
    fn describe(&self) -> String;
}

// =============================================================================
// SymbolSource Trait
// =============================================================================

/// 수집 대상 종목 목록 제공자.
#[async_trait]
pub trait SymbolSource: Send + Sync {
    /// 종목 목록을 순서대로 반환합니다.
    async fn load(&self) -> Result<Vec<Symbol>, StoreError>;
}
