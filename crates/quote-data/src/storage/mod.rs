//! 레코드 저장소 구현.
//!
//! - `json`: 컬렉션마다 `<dir>/<collection>.json`
//! - `document`: `<dir>/db.json` 단일 파일에 테이블별 저장

mod document;
mod json_file;

pub use document::DocumentStore;
pub use json_file::JsonFileStore;

use quote_core::RecordStore;
use std::path::Path;
use std::sync::Arc;

/// 문서 저장소 파일 이름.
pub const DOCUMENT_FILE: &str = "db.json";

/// 저장소 백엔드 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageBackend {
    /// 플랫 JSON 파일
    #[default]
    Json,
    /// 단일 파일 문서 저장소
    Document,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "file" => Ok(Self::Json),
            "document" | "db" | "tinydb" => Ok(Self::Document),
            _ => Err(format!("Unknown storage backend: {}", s)),
        }
    }
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Json => write!(f, "json"),
            StorageBackend::Document => write!(f, "document"),
        }
    }
}

/// 설정 디렉터리 아래에 백엔드에 맞는 저장소를 엽니다.
pub fn open_record_store(backend: StorageBackend, dir: &Path) -> Arc<dyn RecordStore> {
    match backend {
        StorageBackend::Json => Arc::new(JsonFileStore::new(dir)),
        StorageBackend::Document => Arc::new(DocumentStore::new(dir.join(DOCUMENT_FILE))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("json".parse::<StorageBackend>().unwrap(), StorageBackend::Json);
        assert_eq!(
            "Document".parse::<StorageBackend>().unwrap(),
            StorageBackend::Document
        );
        assert_eq!(
            "tinydb".parse::<StorageBackend>().unwrap(),
            StorageBackend::Document
        );
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_open_record_store_describes_location() {
        let dir = Path::new("/tmp/quote-config");
        assert_eq!(
            open_record_store(StorageBackend::Json, dir).describe(),
            "json:/tmp/quote-config"
        );
        assert_eq!(
            open_record_store(StorageBackend::Document, dir).describe(),
            "document:/tmp/quote-config/db.json"
        );
    }
}
