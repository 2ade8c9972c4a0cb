//! # 草稿存储
//!
//! ## 业务说明
//! 草稿是编辑会话的最后一次快照，保存在一个显式的可变单元中，
//! 不参与任何变更通知：写入草稿不会触发界面刷新。
//! 会话挂载时读取一次草稿，之后会话的每次变更经过防抖后写回。
//!
//! ## 防抖规则
//! - 每次变更取消尚未执行的写入并重新计时
//! - 静默期（默认 500ms）结束后写入最后一次的快照
//! - 销毁时丢弃尚未执行的写入，不会补写（最后一段输入可能丢失）
//! - 每次写入、取消或新的计时都会推进代数，已唤醒的旧任务在单元锁内核对代数后放弃写入
//! - 防抖写入需要当前线程处于 tokio 运行时中，否则返回结构性错误
//!
//! 草稿的生命周期等于 `DraftStore` 实例的生命周期。

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::domain::form_mapper::wire_to_session;
use crate::domain::registry::LoggerTypeRegistry;
use crate::log_draft_event;
use crate::models::{EditSessionSnapshot, FieldErrors, LoggerType};
use crate::utils::config::EditorConfig;
use crate::utils::error::{AppError, AppResult};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// 草稿单元：快照与写入代数
struct DraftCell {
    snapshot: EditSessionSnapshot,
    generation: u64,
}

/// 草稿存储（带防抖写入）
pub struct DraftStore {
    cell: Arc<Mutex<DraftCell>>,
    write_count: Arc<AtomicUsize>,
    debounce: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl DraftStore {
    /// 使用给定种子快照创建
    pub fn new(seed: EditSessionSnapshot, debounce: Duration) -> Self {
        Self {
            cell: Arc::new(Mutex::new(DraftCell { snapshot: seed, generation: 0 })),
            write_count: Arc::new(AtomicUsize::new(0)),
            debounce,
            pending: Mutex::new(None),
        }
    }

    /// 以某类型的默认记录作为种子创建
    pub fn seeded(
        registry: &LoggerTypeRegistry,
        logger_type: LoggerType,
        debounce: Duration,
    ) -> AppResult<Self> {
        let record = registry.build_default_record(logger_type)?;
        let seed = EditSessionSnapshot {
            values: wire_to_session(&record).0,
            errors: FieldErrors::new(),
            editing_id: None,
            dirty: false,
        };
        Ok(Self::new(seed, debounce))
    }

    /// 按编辑器配置创建（默认类型与防抖时长）
    pub fn from_config(config: &EditorConfig) -> AppResult<Self> {
        Self::seeded(
            LoggerTypeRegistry::global(),
            config.default_logger_type,
            config.draft_debounce(),
        )
    }

    /// 读取草稿
    pub fn get_draft(&self) -> EditSessionSnapshot {
        lock(&self.cell).snapshot.clone()
    }

    /// 立即写入草稿，之前计时的写入全部作废
    pub fn set_draft(&self, snapshot: EditSessionSnapshot) {
        let mut cell = lock(&self.cell);
        cell.generation += 1;
        write(&mut cell, &self.write_count, snapshot);
    }

    /// 检查当前线程是否处于 tokio 运行时中
    pub fn runtime(&self) -> AppResult<Handle> {
        Handle::try_current()
            .map_err(|_| AppError::structural_error("草稿防抖写入需要在 tokio 运行时中调用"))
    }

    /// 防抖写入：取消尚未执行的写入，静默期结束后写入本次快照
    pub fn schedule(&self, snapshot: EditSessionSnapshot) -> AppResult<()> {
        let runtime = self.runtime()?;
        let cell = Arc::clone(&self.cell);
        let write_count = Arc::clone(&self.write_count);
        let debounce = self.debounce;

        let mut pending = lock(&self.pending);
        let generation = {
            let mut cell = lock(&self.cell);
            cell.generation += 1;
            cell.generation
        };

        let handle = runtime.spawn(async move {
            tokio::time::sleep(debounce).await;
            let mut cell = lock(&cell);
            if cell.generation != generation {
                log_draft_event!("草稿写入已过期 (代数 {} != {})", generation, cell.generation);
                return;
            }
            write(&mut cell, &write_count, snapshot);
        });

        if let Some(previous) = pending.replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// 取消尚未执行的写入
    pub fn cancel(&self) {
        lock(&self.cell).generation += 1;
        if let Some(handle) = lock(&self.pending).take() {
            if !handle.is_finished() {
                log_draft_event!("丢弃尚未执行的草稿写入");
            }
            handle.abort();
        }
    }

    /// 是否有尚未执行的写入
    pub fn has_pending(&self) -> bool {
        lock(&self.pending).as_ref().map_or(false, |h| !h.is_finished())
    }

    /// 实际写入次数
    pub fn write_count(&self) -> usize {
        self.write_count.load(Ordering::SeqCst)
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

fn write(cell: &mut DraftCell, write_count: &AtomicUsize, snapshot: EditSessionSnapshot) {
    let name = snapshot.values.name.clone();
    cell.snapshot = snapshot;
    let count = write_count.fetch_add(1, Ordering::SeqCst) + 1;
    log_draft_event!("草稿已写入 (第 {} 次, 名称: '{}')", count, name);
}

impl Drop for DraftStore {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore")
            .field("debounce", &self.debounce)
            .field("write_count", &self.write_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> DraftStore {
        DraftStore::seeded(LoggerTypeRegistry::global(), LoggerType::EasySerial, Duration::from_millis(500)).unwrap()
    }

    fn named(store: &DraftStore, name: &str) -> EditSessionSnapshot {
        let mut snapshot = store.get_draft();
        snapshot.values.name = name.to_string();
        snapshot
    }

    #[test]
    fn test_seeded_with_default_type() {
        let store = store();
        let draft = store.get_draft();
        assert_eq!(draft.values.logger_type(), LoggerType::EasySerial);
        assert_eq!(draft.editing_id, None);
        assert_eq!(store.write_count(), 0);

        let config = EditorConfig { default_logger_type: LoggerType::Mbox, ..EditorConfig::default() };
        let mbox_store = DraftStore::from_config(&config).unwrap();
        assert_eq!(mbox_store.get_draft().values.logger_type(), LoggerType::Mbox);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ten_rapid_changes_produce_one_write() {
        let store = store();

        for i in 0..10 {
            store.schedule(named(&store, &format!("name-{}", i))).unwrap();
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_draft().values.name, "name-9");
    }

    #[tokio::test(start_paused = true)]
    async fn test_quiet_period_restarts_on_each_change() {
        let store = store();

        store.schedule(named(&store, "a")).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        store.schedule(named(&store, "b")).unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(store.write_count(), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_draft().values.name, "b");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_write() {
        let store = store();
        store.schedule(named(&store, "lost")).unwrap();
        assert!(store.has_pending());

        store.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(store.get_draft().values.name, "");

        store.set_draft(named(&store, "sync"));
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_draft().values.name, "sync");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_does_not_flush() {
        let store = store();
        let cell = Arc::clone(&store.cell);
        store.schedule(named(&store, "pending")).unwrap();
        drop(store);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(lock(&cell).snapshot.values.name, "");
    }

    #[test]
    fn test_schedule_outside_runtime_is_structural_error() {
        let store = store();
        let error = store.schedule(named(&store, "x")).unwrap_err();
        assert!(error.is_fatal());
        assert_eq!(store.write_count(), 0);
        assert!(!store.has_pending());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_woken_write_does_not_override_sync_push() {
        let store = DraftStore::seeded(LoggerTypeRegistry::global(), LoggerType::EasySerial, Duration::from_millis(5)).unwrap();
        for round in 0..50 {
            store.schedule(named(&store, "debounced")).unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
            store.cancel();
            store.set_draft(named(&store, &format!("sync-{}", round)));
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(store.get_draft().values.name, format!("sync-{}", round));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_draft_supersedes_scheduled_write() {
        let store = store();
        store.schedule(named(&store, "late")).unwrap();
        store.set_draft(named(&store, "now"));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_draft().values.name, "now");
    }
}
