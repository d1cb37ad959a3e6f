//! # Quote Core
//!
//! 시세 수집기의 핵심 도메인 타입과 외부 협력자 인터페이스를 제공합니다.
//!
//! - 종목(`Symbol`) 및 시세 스냅샷(`Quote`) 타입
//! - 레코드 저장소, 종목 목록, 시세 제공자, 메트릭 싱크 trait
//! - 로깅 인프라

pub mod domain;
pub mod logging;
pub mod types;

pub use domain::*;
pub use logging::*;
pub use types::*;
