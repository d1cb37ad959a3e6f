//! 수집 대상 종목 목록 저장소.
//!
//! 여러 저장소를 우선순위 순으로 가지며, 조회는 `stocks` 컬렉션이 존재하는
//! 첫 저장소에서 읽고 저장은 모든 저장소에 기록합니다.

use async_trait::async_trait;
use quote_core::{RecordStore, StoreError, Symbol, SymbolSource};
use std::sync::Arc;
use tracing::{error, info, warn};

/// 종목 목록 컬렉션 이름.
pub const STOCKS_COLLECTION: &str = "stocks";

/// 종목 목록 저장소.
#[derive(Clone)]
pub struct SymbolStore {
    stores: Vec<Arc<dyn RecordStore>>,
}

impl SymbolStore {
    /// 기본 저장소로 생성합니다.
    pub fn new(primary: Arc<dyn RecordStore>) -> Self {
        Self {
            stores: vec![primary],
        }
    }

    /// 기본 저장소에 목록이 없을 때 읽을 대체 저장소를 추가합니다.
    pub fn with_fallback(mut self, store: Arc<dyn RecordStore>) -> Self {
        self.stores.push(store);
        self
    }

    /// 저장소 하나에서 종목 목록을 읽습니다. 컬렉션이 없으면 `None`.
    ///
    /// 컬렉션 자체를 읽지 못하면 에러이고, 개별 항목의 형식 오류는
    /// 경고만 남기고 건너뜁니다.
    async fn load_from(store: &dyn RecordStore) -> Result<Option<Vec<Symbol>>, StoreError> {
        if !store.contains(STOCKS_COLLECTION).await? {
            return Ok(None);
        }

        let records = store.all(STOCKS_COLLECTION).await?;
        let mut symbols = Vec::with_capacity(records.len());

        // 해석할 수 없는 항목은 그 항목만 건너뛴다
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Symbol>(record) {
                Ok(symbol) => symbols.push(symbol),
                Err(e) => warn!(
                    store = %store.describe(),
                    index,
                    error = %e,
                    "종목 항목 해석 실패, 건너뜀"
                ),
            }
        }

        Ok(Some(symbols))
    }

    /// 종목 목록을 저장합니다.
    ///
    /// 모든 저장소에 기록을 시도하며, 실패가 있으면 마지막 에러를 반환합니다.
    pub async fn save(&self, symbols: &[Symbol]) -> Result<(), StoreError> {
        let records = symbols
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;

        let mut last_error = None;
        for store in &self.stores {
            if let Err(e) = store.replace_all(STOCKS_COLLECTION, records.clone()).await {
                error!(store = %store.describe(), error = %e, "종목 목록 저장 실패");
                last_error = Some(e);
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => {
                info!(count = symbols.len(), "종목 목록 저장 완료");
                Ok(())
            }
        }
    }

    /// 종목코드로 종목을 찾습니다.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<Symbol>, StoreError> {
        Ok(self.load().await?.into_iter().find(|s| s.code == code))
    }

    /// 종목을 추가하거나 같은 코드의 종목명을 갱신합니다.
    pub async fn upsert(&self, symbol: Symbol) -> Result<(), StoreError> {
        let mut symbols = self.load().await?;
        match symbols.iter_mut().find(|s| s.code == symbol.code) {
            Some(existing) => existing.name = symbol.name,
            None => symbols.push(symbol),
        }
        self.save(&symbols).await
    }

    /// 종목을 제거합니다. 제거했으면 `true`.
    pub async fn remove(&self, code: &str) -> Result<bool, StoreError> {
        let mut symbols = self.load().await?;
        let before = symbols.len();
        symbols.retain(|s| s.code != code);

        if symbols.len() == before {
            return Ok(false);
        }

        self.save(&symbols).await?;
        Ok(true)
    }
}

#[async_trait]
impl SymbolSource for SymbolStore {
    async fn load(&self) -> Result<Vec<Symbol>, StoreError> {
        let mut last_error = None;

        for store in &self.stores {
            match Self::load_from(store.as_ref()).await {
                Ok(Some(symbols)) => return Ok(symbols),
                Ok(None) => continue,
                Err(e) => {
                    warn!(store = %store.describe(), error = %e, "종목 목록 로드 실패, 다음 저장소 시도");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(Vec::new()),
        }
    }
}
