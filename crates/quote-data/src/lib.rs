//! 저장소 및 메트릭 싱크.
//!
//! 이 crate는 다음을 제공합니다:
//! - 플랫 JSON 파일 / 문서 저장소 기반 `RecordStore` 구현
//! - 종목 목록 저장소 (`SymbolStore`)
//! - 라인 프로토콜 기반 시계열 싱크 (`InfluxSink`)

pub mod sink;
pub mod storage;
pub mod symbols;

pub use sink::{InfluxConfig, InfluxSink};
pub use storage::{open_record_store, DocumentStore, JsonFileStore, StorageBackend};
pub use symbols::{SymbolStore, STOCKS_COLLECTION};
