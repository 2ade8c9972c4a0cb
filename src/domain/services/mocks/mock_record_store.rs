use super::*;
use crate::models::LoggerRecord;

/// Mock记录存储（内存实现）
///
/// ID按 最大ID+1 分配，名称必须唯一，与JSON文件存储的行为一致
#[derive(Debug, Clone)]
pub struct MockRecordStore {
    base: MockServiceBase,
    records: Arc<Mutex<Vec<LoggerRecord>>>,
}

impl MockRecordStore {
    pub fn new(config: MockConfig) -> Self {
        Self {
            base: MockServiceBase::new(config),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 使用初始记录创建
    pub fn with_records(records: Vec<LoggerRecord>) -> Self {
        let store = Self::new(MockConfig::default());
        *lock(&store.records) = records;
        store
    }

    /// 当前存储的记录快照
    pub fn snapshot(&self) -> Vec<LoggerRecord> {
        lock(&self.records).clone()
    }

    fn check_unique_name(records: &[LoggerRecord], name: &str, own_id: Option<i64>) -> AppResult<()> {
        match records.iter().find(|r| r.name == name && r.id != own_id) {
            Some(existing) => Err(AppError::conflict_error(format!(
                "名称为 '{}' 的连接已存在 (id={:?})",
                name, existing.id
            ))),
            None => Ok(()),
        }
    }

    async fn run<T>(
        &self,
        method: &str,
        parameters: serde_json::Value,
        op: impl FnOnce(&mut Vec<LoggerRecord>) -> AppResult<T>,
    ) -> AppResult<T> {
        self.base.simulate_delay().await;
        let result = match self.base.take_injected_error(method) {
            Some(error) => Err(error),
            None => {
                let mut records = lock(&self.records);
                op(&mut *records)
            }
        };
        let summary = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        self.base.record_call(method, parameters, &summary);
        result
    }
}

impl MockService for MockRecordStore {
    fn mock_base(&self) -> &MockServiceBase {
        &self.base
    }
}

#[async_trait]
impl IRecordStore for MockRecordStore {
    async fn list(&self) -> AppResult<Vec<LoggerRecord>> {
        self.run("list", serde_json::Value::Null, |records| Ok(records.clone())).await
    }

    async fn create(&self, record: LoggerRecord) -> AppResult<LoggerRecord> {
        let parameters = serde_json::json!({ "name": record.name });
        self.run("create", parameters, move |records| {
            Self::check_unique_name(records, &record.name, None)?;
            let id = records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1;
            let created = LoggerRecord { id: Some(id), ..record };
            records.push(created.clone());
            Ok(created)
        })
        .await
    }

    async fn update(&self, id: i64, record: LoggerRecord) -> AppResult<LoggerRecord> {
        let parameters = serde_json::json!({ "id": id, "name": record.name });
        self.run("update", parameters, move |records| {
            Self::check_unique_name(records, &record.name, Some(id))?;
            let slot = records
                .iter_mut()
                .find(|r| r.id == Some(id))
                .ok_or_else(|| AppError::not_found_error("LoggerRecord", format!("记录不存在: {}", id)))?;
            *slot = LoggerRecord { id: Some(id), ..record };
            Ok(slot.clone())
        })
        .await
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        self.run("delete", serde_json::json!({ "id": id }), move |records| {
            let before = records.len();
            records.retain(|r| r.id != Some(id));
            if records.len() == before {
                return Err(AppError::not_found_error("LoggerRecord", format!("记录不存在: {}", id)));
            }
            Ok(())
        })
        .await
    }
}
