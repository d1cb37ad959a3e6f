//! 단일 파일 문서 저장소.
//!
//! 파일 하나(`db.json`)에 이름 붙은 테이블들을 보관합니다. 각 테이블은
//! 정수 문자열 ID를 키로 하는 객체이며, 기존 TinyDB 파일과 호환됩니다.
//!
//! ```json
//! {"token": {"1": {"access_token": "...", "issued_time": "..."}},
//!  "stocks": {"1": {"code": "005930", "name": "삼성전자"}}}
//! ```

use async_trait::async_trait;
use quote_core::{RecordStore, StoreError};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::sync::Mutex;
use tracing::debug;

/// 문서 저장소.
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

type Tables = Map<String, Value>;

impl DocumentStore {
    /// 파일 경로를 기준으로 저장소를 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_tables(&self) -> Result<Tables, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Tables::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Tables::new());
        }

        match serde_json::from_slice(&bytes)? {
            Value::Object(tables) => Ok(tables),
            _ => Err(StoreError::Corrupt(format!(
                "{}: 최상위가 객체가 아님",
                self.path.display()
            ))),
        }
    }

    async fn write_tables(&self, tables: Tables) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec(&Value::Object(tables))?).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(path = %self.path.display(), "문서 저장소 저장");
        Ok(())
    }

    /// 테이블 레코드를 ID 순서로 정렬해 반환합니다.
    fn sorted_records(table: &Value, collection: &str) -> Result<Vec<(u64, Value)>, StoreError> {
        let Value::Object(rows) = table else {
            return Err(StoreError::Corrupt(format!("테이블 '{}'이 객체가 아님", collection)));
        };

        let mut records = rows
            .iter()
            .map(|(id, record)| {
                id.parse::<u64>()
                    .map(|id| (id, record.clone()))
                    .map_err(|_| {
                        StoreError::Corrupt(format!("테이블 '{}'의 잘못된 ID: {}", collection, id))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by_key(|(id, _)| *id);
        Ok(records)
    }

    fn numbered(records: Vec<Value>) -> Value {
        let rows: Map<String, Value> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| ((i + 1).to_string(), record))
            .collect();
        Value::Object(rows)
    }
}

#[async_trait]
impl RecordStore for DocumentStore {
    async fn all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let _guard = self.lock.lock().await;
        let tables = self.read_tables().await?;

        match tables.get(collection) {
            Some(table) => Ok(Self::sorted_records(table, collection)?
                .into_iter()
                .map(|(_, record)| record)
                .collect()),
            None => Ok(Vec::new()),
        }
    }

    async fn contains(&self, collection: &str) -> Result<bool, StoreError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_tables().await?.contains_key(collection))
    }

    async fn insert(&self, collection: &str, record: Value) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut tables = self.read_tables().await?;

        let next_id = match tables.get(collection) {
            Some(table) => Self::sorted_records(table, collection)?
                .last()
                .map(|(id, _)| id + 1)
                .unwrap_or(1),
            None => 1,
        };

        let table = tables
            .entry(collection.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(rows) = table else {
            return Err(StoreError::Corrupt(format!("테이블 '{}'이 객체가 아님", collection)));
        };
        rows.insert(next_id.to_string(), record);

        self.write_tables(tables).await
    }

    async fn replace_all(&self, collection: &str, records: Vec<Value>) -> Result<(), StoreError> {
        let _guard = self.lock.lock().await;
        let mut tables = self.read_tables().await?;
        tables.insert(collection.to_string(), Self::numbered(records));
        self.write_tables(tables).await
    }

    fn describe(&self) -> String {
        format!("document:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn temp_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("quote-doc-{}", uuid::Uuid::new_v4()))
            .join("db.json")
    }

    #[tokio::test]
    async fn test_insert_appends_and_latest_wins() {
        let path = temp_path();
        let store = DocumentStore::new(&path);

        store.insert("token", json!({"access_token": "a"})).await.unwrap();
        store.insert("token", json!({"access_token": "b"})).await.unwrap();

        let all = store.all("token").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(store.latest("token").await.unwrap().unwrap()["access_token"], "b");

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_reads_tinydb_file_in_id_order() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{"_default": {}, "stocks": {"10": {"code": "C"}, "2": {"code": "B"}, "1": {"code": "A"}}}"#,
        )
        .unwrap();

        let store = DocumentStore::new(&path);
        let codes: Vec<_> = store
            .all("stocks")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["code"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(codes, vec!["A", "B", "C"]);
        assert!(store.contains("_default").await.unwrap());
        assert!(store.all("_default").await.unwrap().is_empty());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_replace_all_truncates_and_keeps_other_tables() {
        let path = temp_path();
        let store = DocumentStore::new(&path);

        store.insert("token", json!({"access_token": "t"})).await.unwrap();
        store
            .replace_all("stocks", vec![json!({"code": "1"}), json!({"code": "2"})])
            .await
            .unwrap();
        store
            .replace_all("stocks", vec![json!({"code": "3"})])
            .await
            .unwrap();

        assert_eq!(store.all("stocks").await.unwrap(), vec![json!({"code": "3"})]);
        assert_eq!(store.all("token").await.unwrap().len(), 1);

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_empty_file_is_empty_store() {
        let path = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "").unwrap();

        let store = DocumentStore::new(&path);
        assert!(store.all("token").await.unwrap().is_empty());

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
