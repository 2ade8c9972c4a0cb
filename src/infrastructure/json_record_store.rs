/// JSON文件记录存储
///
/// 业务说明：
/// 日志器记录保存在应用设置JSON文件的 `connections` 数组中，
/// 文件中的其他顶层字段（例如数据库设置）原样保留。
/// - 文件不存在或内容为空：视为空列表
/// - 新建时ID按 最大ID+1 分配（空列表从1开始）
/// - 新建/更新时名称必须唯一
/// - 更新/删除不存在的ID返回未找到错误

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::domain::services::{BaseService, IRecordStore};
use crate::models::LoggerRecord;
use crate::utils::config::PersistenceConfig;
use crate::utils::error::{AppError, AppResult};

const CONNECTIONS_KEY: &str = "connections";

/// JSON文件记录存储实现
#[derive(Debug)]
pub struct JsonRecordStore {
    path: PathBuf,
    /// 串行化"读取-修改-写入"
    write_lock: Mutex<()>,
    is_active: AtomicBool,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            is_active: AtomicBool::new(false),
        }
    }

    /// 按持久化配置创建
    pub fn from_config(config: &PersistenceConfig) -> Self {
        Self::new(config.records_path.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取整个设置文件
    async fn load_document(&self) -> AppResult<Map<String, Value>> {
        if !self.path.exists() {
            return Ok(Map::new());
        }

        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| AppError::io_error(format!("读取设置文件 {:?} 失败", self.path), e.kind().to_string()))?;
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(AppError::persistence_error(format!("设置文件 {:?} 的顶层不是对象", self.path))),
            Err(e) => Err(AppError::json_error(format!("设置文件格式无效: {}", e))),
        }
    }

    fn records_of(document: &Map<String, Value>) -> AppResult<Vec<LoggerRecord>> {
        match document.get(CONNECTIONS_KEY) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| AppError::json_error(format!("解析日志器记录失败: {}", e))),
        }
    }

    async fn save_document(&self, mut document: Map<String, Value>, records: &[LoggerRecord]) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::io_error(format!("创建目录 {:?} 失败", parent), e.kind().to_string()))?;
            }
        }

        let records = serde_json::to_value(records)
            .map_err(|e| AppError::json_error(format!("序列化日志器记录失败: {}", e)))?;
        document.insert(CONNECTIONS_KEY.to_string(), records);

        let content = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|e| AppError::json_error(format!("序列化设置文件失败: {}", e)))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| AppError::io_error(format!("写入设置文件 {:?} 失败", self.path), e.kind().to_string()))
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

    fn next_id(records: &[LoggerRecord]) -> i64 {
        records.iter().filter_map(|r| r.id).max().unwrap_or(0) + 1
    }
}

#[async_trait]
impl BaseService for JsonRecordStore {
    fn service_name(&self) -> &'static str {
        "JsonRecordStore"
    }

    async fn initialize(&mut self) -> AppResult<()> {
        // 提前暴露格式错误
        let document = self.load_document().await?;
        let count = Self::records_of(&document)?.len();
        self.is_active.store(true, Ordering::SeqCst);
        log::info!("{} 服务已初始化: {:?} ({} 条记录)", self.service_name(), self.path, count);
        Ok(())
    }

    async fn shutdown(&mut self) -> AppResult<()> {
        self.is_active.store(false, Ordering::SeqCst);
        log::info!("{} 服务已关闭", self.service_name());
        Ok(())
    }

    async fn health_check(&self) -> AppResult<()> {
        if !self.is_active.load(Ordering::SeqCst) {
            return Err(AppError::persistence_error(format!("{} 服务未激活", self.service_name())));
        }
        let document = self.load_document().await?;
        Self::records_of(&document).map(|_| ())
    }
}

#[async_trait]
impl IRecordStore for JsonRecordStore {
    async fn list(&self) -> AppResult<Vec<LoggerRecord>> {
        let document = self.load_document().await?;
        Self::records_of(&document)
    }

    async fn create(&self, mut record: LoggerRecord) -> AppResult<LoggerRecord> {
        let _guard = self.write_lock.lock().await;
        let document = self.load_document().await?;
        let mut records = Self::records_of(&document)?;

        Self::check_unique_name(&records, &record.name, None)?;
        record.id = Some(Self::next_id(&records));
        records.push(record.clone());

        self.save_document(document, &records).await?;
        log::info!("新建日志器记录 '{}' (ID: {:?})", record.name, record.id);
        Ok(record)
    }

    async fn update(&self, id: i64, mut record: LoggerRecord) -> AppResult<LoggerRecord> {
        let _guard = self.write_lock.lock().await;
        let document = self.load_document().await?;
        let mut records = Self::records_of(&document)?;

        let position = records
            .iter()
            .position(|r| r.id == Some(id))
            .ok_or_else(|| AppError::not_found_error("LoggerRecord", format!("ID为 {} 的记录不存在", id)))?;
        Self::check_unique_name(&records, &record.name, Some(id))?;
        record.id = Some(id);
        records[position] = record.clone();

        self.save_document(document, &records).await?;
        log::info!("更新日志器记录 '{}' (ID: {})", record.name, id);
        Ok(record)
    }

    async fn delete(&self, id: i64) -> AppResult<()> {
        let _guard = self.write_lock.lock().await;
        let document = self.load_document().await?;
        let mut records = Self::records_of(&document)?;

        let before = records.len();
        records.retain(|r| r.id != Some(id));
        if records.len() == before {
            return Err(AppError::not_found_error("LoggerRecord", format!("ID为 {} 的记录不存在", id)));
        }

        self.save_document(document, &records).await?;
        log::info!("删除日志器记录 (ID: {})", id);
        Ok(())
    }
}
