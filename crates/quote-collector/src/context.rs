//! 애플리케이션 컨텍스트.
//!
//! 시작 시 한 번 만들어 각 구성 요소에 전달합니다. 저장소는 즉시 열고,
//! 네트워크 클라이언트는 필요한 명령에서만 생성합니다.

use crate::config::CollectorConfig;
use crate::modules::PricePoll;
use crate::scheduler::PollScheduler;
use crate::Result;
use quote_data::{open_record_store, DocumentStore, InfluxSink, JsonFileStore, SymbolStore};
use quote_exchange::{KisAuth, KisQuoteClient, MarketClock, TokenStore};
use std::sync::Arc;
use tracing::info;

/// 애플리케이션 컨텍스트
pub struct AppContext {
    /// 설정
    pub config: CollectorConfig,
    /// 종목 목록 저장소 (JSON 파일 우선, 문서 저장소 대체)
    pub symbols: Arc<SymbolStore>,
    /// 접근 토큰 저장소
    pub tokens: Arc<TokenStore>,
    /// 거래 시간 판정기
    pub clock: MarketClock,
}

impl AppContext {
    /// 설정으로 컨텍스트 생성
    pub fn new(config: CollectorConfig) -> Self {
        let dir = config.config_dir();

        let symbols = SymbolStore::new(Arc::new(JsonFileStore::new(dir))).with_fallback(Arc::new(
            DocumentStore::new(dir.join(quote_data::storage::DOCUMENT_FILE)),
        ));

        let token_backing = open_record_store(config.storage_backend, dir);
        info!(
            config_dir = %dir.display(),
            token_store = %token_backing.describe(),
            "저장소 초기화"
        );

        Self {
            symbols: Arc::new(symbols),
            tokens: Arc::new(TokenStore::new(token_backing)),
            clock: MarketClock::krx(),
            config,
        }
    }

    /// KIS 시세 클라이언트 생성
    pub fn quote_client(&self) -> Result<Arc<KisQuoteClient>> {
        let auth = KisAuth::new(self.config.kis.to_kis_config()?, self.tokens.clone())?;
        Ok(Arc::new(KisQuoteClient::new(auth)))
    }

    /// 시계열 싱크 생성
    pub fn sink(&self) -> Result<Arc<InfluxSink>> {
        Ok(Arc::new(InfluxSink::new(
            self.config.influx.to_influx_config()?,
        )))
    }

    /// 폴링 스케줄러 생성
    pub fn poll_scheduler(&self) -> Result<Arc<PollScheduler>> {
        let poll = PricePoll::new(self.symbols.clone(), self.quote_client()?, self.sink()?)
            .with_request_delay(self.config.poll.request_delay());

        Ok(Arc::new(PollScheduler::new(poll, self.clock)))
    }
}
