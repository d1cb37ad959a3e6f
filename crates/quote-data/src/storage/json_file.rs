//! 컬렉션마다 JSON 파일 하나를 쓰는 저장소.
//!
//! `<dir>/<collection>.json` 파일에 단일 객체(최근 레코드) 또는 배열(전체
//! 레코드)을 저장합니다. `token.json`, `stocks.json`과 같은 형식입니다.

use async_trait::async_trait;
use quote_core::{RecordStore, StoreError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// 플랫 JSON 파일 저장소.
pub struct JsonFileStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    /// 디렉터리를 기준으로 저장소를 생성합니다.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            lock: Mutex::new(()),
        }
    }

    /// 컬렉션 파일 경로.
    pub fn path_for(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{}.json", collection))
    }

    async fn read_value(path: &Path) -> Result<Option<Value>, StoreError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_value(&self, path: &Path, value: &Value) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(value)?;
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;

        debug!(path = %path.display(), "JSON 파일 저장");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let _guard = self.lock.lock().await;

        match Self::read_value(&self.path_for(collection)).await? {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(records)) => Ok(records),
            Some(record @ Value::Object(_)) => Ok(vec![record]),
            Some(other) => Err(StoreError::Corrupt(format!(
                "{}.json: 객체 또는 배열이 아님 ({})",
                collection, other
            ))),
        }
    }

    async fn contains(&self, collection: &str) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.path_for(collection)).await?)
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write_value(&self.path_for(collection), &record).await
    }

    async fn replace_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        self.write_value(&self.path_for(collection), &Value::Array(records))
            .await
    }

    fn describe(&self) -> String {
        format!("json:{}", self.dir.display())
    }
}
