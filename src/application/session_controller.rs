//! # 编辑会话控制器 (Edit Session Controller)
//!
//! ## 业务说明
//! 控制器是编辑界面唯一的入口，持有唯一的编辑会话以及记录列表、
//! 可用计数器列表、串口列表等缓存，并编排与外部协作者的交互。
//!
//! ## 核心职责
//! 1. **会话生命周期**: 挂载时从草稿恢复，类型切换/选择记录时整体替换会话
//! 2. **字段编辑**: 每次修改后重新校验，并以防抖方式写回草稿
//! 3. **条件依赖**: 关闭外部计数器时重置计数器字段，打开或改变配对时运行协调
//! 4. **保存/删除**: 新建或更新记录，两步确认删除
//! 5. **后台刷新**: 记录列表与可用计数器列表按请求序号丢弃过期响应
//!
//! ## 错误处理
//! - 字段校验错误只阻止保存，不弹通知
//! - 协作者返回的传输/业务错误弹一次通知并返回 `Err`
//! - 用户取消静默忽略
//! - 结构性错误（未注册类型、未挂载）直接返回，调用方视为致命
//!
//! ## 并发模型
//! 状态保存在 `Arc<Mutex<ControllerState>>` 中，锁只在同步片段内持有，
//! 从不跨越 `.await`；异步操作完成后重新读取最新的会话和缓存。

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::application::draft_store::DraftStore;
use crate::application::edit_session::EditSession;
use crate::domain::counter_reconciler::{
    connection_choices, device_choices, reconcile, selector_view, ReconcileContext,
};
use crate::domain::form_mapper::parser_settings_for_test;
use crate::domain::port_options::port_options;
use crate::domain::registry::{EditorKind, LoggerTypeRegistry};
use crate::domain::services::{
    ICounterAvailabilitySource, INotifier, IParserTester, IRecordStore, ISerialPortDiscovery,
};
use crate::domain::validation::validate_form;
use crate::models::{
    CounterFeedState, CounterOption, CounterSelectorView, EditSessionSnapshot, FieldErrors, FormValues, LoggerRecord,
    LoggerType, MboxConfig, ParserTestOutcome, PortOption, SerialPortInfo,
};
use crate::utils::error::{AppError, AppResult};
use crate::{log_communication_failure, log_draft_event, log_user_operation};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn not_mounted() -> AppError {
    AppError::structural_error("编辑会话尚未挂载")
}

/// 控制器依赖的外部协作者
#[derive(Clone)]
pub struct SessionControllerDeps {
    pub records: Arc<dyn IRecordStore>,
    pub counters: Arc<dyn ICounterAvailabilitySource>,
    pub parser_tester: Arc<dyn IParserTester>,
    pub ports: Arc<dyn ISerialPortDiscovery>,
    pub notifier: Arc<dyn INotifier>,
}

/// 各项后台操作的加载状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingFlags {
    pub saving: bool,
    pub deleting: bool,
    pub testing: bool,
    pub loading_counters: bool,
    pub loading_records: bool,
}

/// 删除确认令牌
///
/// `request_delete` 返回，交给 `confirm_delete` 真正执行删除
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelete {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Default)]
struct ControllerState {
    session: Option<EditSession>,
    /// 记录列表缓存，从未加载时为 None
    records: Option<Vec<LoggerRecord>>,
    feed: CounterFeedState,
    ports: Vec<SerialPortInfo>,
    loading: LoadingFlags,
    records_seq: u64,
    counters_seq: u64,
    parser_seq: u64,
    parser_cancel: Option<CancellationToken>,
}

impl ControllerState {
    fn session(&self) -> AppResult<&EditSession> {
        self.session.as_ref().ok_or_else(not_mounted)
    }

    fn session_mut(&mut self) -> AppResult<&mut EditSession> {
        self.session.as_mut().ok_or_else(not_mounted)
    }

    /// 对当前会话运行计数器协调，返回配对是否被修改
    fn reconcile_session(&mut self) -> bool {
        let ControllerState { session, records, feed, .. } = self;
        let Some(session) = session.as_mut() else {
            return false;
        };
        let editing_id = session.editing_id;
        let Some(mbox) = session.values.config.as_mbox_mut() else {
            session.counter_synthetic = None;
            return false;
        };
        if !mbox.ext_counter {
            session.counter_synthetic = None;
            return false;
        }

        let outcome = reconcile(
            mbox,
            ReconcileContext {
                feed: &*feed,
                records: records.as_deref(),
                editing_id,
            },
        );
        // 列表未加载时保留已有的合成选项
        if feed.entries().is_some() {
            session.counter_synthetic = outcome.synthetic;
        }
        outcome.changed
    }
}

/// 编辑会话控制器
pub struct EditSessionController {
    deps: SessionControllerDeps,
    registry: Arc<LoggerTypeRegistry>,
    draft: Arc<DraftStore>,
    state: Arc<Mutex<ControllerState>>,
}

impl EditSessionController {
    pub fn new(deps: SessionControllerDeps, registry: Arc<LoggerTypeRegistry>, draft: Arc<DraftStore>) -> Self {
        Self {
            deps,
            registry,
            draft,
            state: Arc::new(Mutex::new(ControllerState::default())),
        }
    }

    /// 挂载：从草稿恢复会话（只读取一次）
    pub fn mount(&self) -> AppResult<EditSessionSnapshot> {
        let session = EditSession::from_snapshot(self.draft.get_draft());
        // 草稿中的类型必须已注册
        self.registry.descriptor(session.logger_type())?;

        let mut state = lock(&self.state);
        state.session = Some(session);
        state.reconcile_session();
        let snapshot = state.session()?.snapshot();
        log_draft_event!("会话已从草稿恢复 (类型: {})", snapshot.values.logger_type());
        Ok(snapshot)
    }

    // ========================================================================
    // 字段编辑
    // ========================================================================

    /// 修改普通字段
    ///
    /// 修改后按前后差异处理条件依赖，重新校验，标记为已修改并防抖写回草稿。
    /// 闭包不能改变记录类型，类型切换必须通过 `switch_type`。
    /// 需要在 tokio 运行时中调用，否则返回结构性错误且会话保持不变。
    pub fn edit<F>(&self, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut FormValues),
    {
        self.draft.runtime()?;
        let snapshot = {
            let mut state = lock(&self.state);
            let session = state.session_mut()?;
            let before = session.values.clone();
            f(&mut session.values);

            if session.values.logger_type() != before.logger_type() {
                session.values = before;
                return Err(AppError::structural_error("类型切换必须通过 switch_type 完成"));
            }

            let mut needs_reconcile = false;
            if let (Some(old), Some(new)) = (before.config.as_mbox(), session.values.config.as_mbox_mut()) {
                if old.ext_counter && !new.ext_counter {
                    new.reset_counter_fields();
                    session.counter_synthetic = None;
                } else if new.ext_counter && (!old.ext_counter
                    || (old.counter_connection_id, old.counter_device_id)
                        != (new.counter_connection_id, new.counter_device_id)) {
                    needs_reconcile = true;
                }
            }
            if needs_reconcile {
                state.reconcile_session();
            }

            let session = state.session_mut()?;
            session.revalidate(&self.registry)?;
            session.dirty = true;
            session.snapshot()
        };

        self.draft.schedule(snapshot)
    }

    /// 修改 MBox 配置字段，当前会话不是 MBox 类型时返回结构性错误
    fn edit_mbox<F>(&self, f: F) -> AppResult<()>
    where
        F: FnOnce(&mut MboxConfig),
    {
        let logger_type = lock(&self.state).session()?.logger_type();
        if logger_type != LoggerType::Mbox {
            return Err(AppError::structural_error(format!("当前类型 {} 没有外部计数器配置", logger_type)));
        }
        self.edit(|values| {
            if let Some(mbox) = values.config.as_mbox_mut() {
                f(mbox);
            }
        })
    }

    /// 写库开关，关闭后数据库字段的错误随之消失，已填写的值保留
    pub fn set_enabled(&self, enabled: bool) -> AppResult<()> {
        self.edit(|values| values.enabled = enabled)
    }

    /// 外部计数器开关
    pub fn set_ext_counter(&self, enabled: bool) -> AppResult<()> {
        self.edit_mbox(|mbox| mbox.ext_counter = enabled)
    }

    /// 选择计数器连接，设备随之自动选择该连接下的第一个可用设备
    pub fn set_counter_connection(&self, connection_id: Option<i64>) -> AppResult<()> {
        self.edit_mbox(|mbox| {
            mbox.counter_connection_id = connection_id;
            mbox.counter_device_id = None;
        })
    }

    pub fn set_counter_device(&self, device_id: Option<i64>) -> AppResult<()> {
        self.edit_mbox(|mbox| mbox.counter_device_id = device_id)
    }

    // ========================================================================
    // 会话整体替换
    // ========================================================================

    /// 切换记录类型
    ///
    /// 取消尚未执行的草稿写入，并立即同步写入新会话
    pub fn switch_type(&self, logger_type: LoggerType) -> AppResult<()> {
        let snapshot = {
            let mut state = lock(&self.state);
            let session = state.session_mut()?;
            let previous = session.logger_type();
            session.switch_type(&self.registry, logger_type)?;
            log_user_operation!("切换类型: {} → {}", previous, logger_type);
            state.session()?.snapshot()
        };
        self.push_draft_now(snapshot);
        Ok(())
    }

    /// 按名称选择记录
    ///
    /// - 与缓存列表中的名称完全匹配：整体加载该记录
    /// - 名称清空：当前类型的默认值，清除记录ID
    /// - 未匹配的文本：保留为名称，清除记录ID（保存时新建）
    pub fn select_record_by_name(&self, name: &str) -> AppResult<()> {
        let snapshot = {
            let mut state = lock(&self.state);
            let matched = state
                .records
                .as_ref()
                .and_then(|records| records.iter().find(|r| r.name == name))
                .cloned();
            let current_type = state.session()?.logger_type();

            let session = match matched {
                Some(record) => {
                    log_user_operation!("加载记录 '{}' (ID: {:?})", record.name, record.id);
                    self.registry.descriptor(record.logger_type())?;
                    EditSession::from_record(&record)
                }
                None if name.trim().is_empty() => EditSession::fresh(&self.registry, current_type)?,
                None => {
                    let mut session = state.session()?.clone();
                    session.values.name = name.to_string();
                    session.editing_id = None;
                    session.counter_synthetic = None;
                    session.dirty = true;
                    session.revalidate(&self.registry)?;
                    session
                }
            };

            state.session = Some(session);
            if state.reconcile_session() {
                state.session_mut()?.revalidate(&self.registry)?;
            }
            state.session()?.snapshot()
        };
        self.push_draft_now(snapshot);
        Ok(())
    }

    fn push_draft_now(&self, snapshot: EditSessionSnapshot) {
        self.draft.cancel();
        self.draft.set_draft(snapshot);
    }

    // ========================================================================
    // 保存与删除
    // ========================================================================

    /// 保存当前会话
    ///
    /// 没有记录ID时新建，否则更新。成功后刷新记录列表：
    /// 新建后会话重置为当前类型的默认值，更新后采用服务端返回的记录。
    /// 字段校验失败时返回 `ValidationError`，不弹通知。
    pub async fn save<F>(&self, on_success: F) -> AppResult<LoggerRecord>
    where
        F: FnOnce(&LoggerRecord),
    {
        let (record, editing_id) = {
            let mut state = lock(&self.state);
            if state.loading.saving {
                return Err(AppError::business_logic_error("正在保存，请稍候"));
            }
            let session = state.session_mut()?;
            session.revalidate(&self.registry)?;
            if !session.is_valid() {
                return Err(AppError::validation_error(format!("{} 个字段未通过校验", session.errors.len())));
            }
            let pending = (session.to_record(), session.editing_id);
            state.loading.saving = true;
            pending
        };

        log_user_operation!("保存记录 '{}' (ID: {:?})", record.name, editing_id);
        let result = match editing_id {
            None => self.deps.records.create(record).await,
            Some(id) => self.deps.records.update(id, record).await,
        };
        lock(&self.state).loading.saving = false;

        let saved = match result {
            Ok(saved) => saved,
            Err(error) => {
                self.report_failure("保存", &error);
                return Err(error);
            }
        };

        if let Err(error) = self.refresh_records().await {
            log::warn!("保存后刷新记录列表失败: {}", error);
        }

        let snapshot = {
            let mut state = lock(&self.state);
            let current_type = state.session()?.logger_type();
            let session = match editing_id {
                None => EditSession::fresh(&self.registry, current_type)?,
                Some(_) => EditSession::from_record(&saved),
            };
            state.session = Some(session);
            state.reconcile_session();
            state.session()?.snapshot()
        };
        self.push_draft_now(snapshot);

        self.deps.notifier.info(&format!("已保存 '{}'", saved.name));
        on_success(&saved);
        Ok(saved)
    }

    /// 删除第一步：生成确认令牌，只对已保存的记录有效
    pub fn request_delete(&self) -> AppResult<PendingDelete> {
        let state = lock(&self.state);
        let session = state.session()?;
        let id = session
            .editing_id
            .ok_or_else(|| AppError::business_logic_error("当前记录尚未保存，无法删除"))?;
        Ok(PendingDelete {
            id,
            name: session.values.name.clone(),
        })
    }

    /// 删除第二步：确认后执行删除
    ///
    /// 令牌必须仍指向当前会话的记录。成功后会话重置为当前类型的默认值。
    pub async fn confirm_delete<F>(&self, pending: PendingDelete, on_success: F) -> AppResult<()>
    where
        F: FnOnce(i64),
    {
        {
            let mut state = lock(&self.state);
            if state.loading.deleting {
                return Err(AppError::business_logic_error("正在删除，请稍候"));
            }
            if state.session()?.editing_id != Some(pending.id) {
                return Err(AppError::business_logic_error("确认的记录已不是当前编辑的记录"));
            }
            state.loading.deleting = true;
        }

        log_user_operation!("删除记录 '{}' (ID: {})", pending.name, pending.id);
        let result = self.deps.records.delete(pending.id).await;
        lock(&self.state).loading.deleting = false;

        if let Err(error) = result {
            self.report_failure("删除", &error);
            return Err(error);
        }

        if let Err(error) = self.refresh_records().await {
            log::warn!("删除后刷新记录列表失败: {}", error);
        }

        let snapshot = {
            let mut state = lock(&self.state);
            let current_type = state.session()?.logger_type();
            state.session = Some(EditSession::fresh(&self.registry, current_type)?);
            state.session()?.snapshot()
        };
        self.push_draft_now(snapshot);

        self.deps.notifier.info(&format!("已删除 '{}'", pending.name));
        on_success(pending.id);
        Ok(())
    }

    // ========================================================================
    // 后台刷新
    // ========================================================================

    /// 刷新记录列表缓存，过期的响应直接丢弃
    pub async fn refresh_records(&self) -> AppResult<()> {
        let seq = {
            let mut state = lock(&self.state);
            state.records_seq += 1;
            state.loading.loading_records = true;
            state.records_seq
        };

        let result = self.deps.records.list().await;

        let snapshot = {
            let mut state = lock(&self.state);
            if seq != state.records_seq {
                log::debug!("丢弃过期的记录列表响应 (#{})", seq);
                return Ok(());
            }
            state.loading.loading_records = false;
            match result {
                Ok(records) => {
                    log::debug!("记录列表已刷新: {} 条", records.len());
                    state.records = Some(records);
                    self.after_background_reconcile(&mut state)?
                }
                Err(error) => {
                    drop(state);
                    self.report_failure("加载记录列表", &error);
                    return Err(error);
                }
            }
        };

        if let Some(snapshot) = snapshot {
            self.draft.schedule(snapshot)?;
        }
        Ok(())
    }

    /// 刷新可用计数器列表，过期的响应直接丢弃
    ///
    /// 加载失败时列表进入失败状态，计数器选择器被禁用，会话不受影响
    pub async fn refresh_counters(&self) -> AppResult<()> {
        let seq = {
            let mut state = lock(&self.state);
            state.counters_seq += 1;
            state.loading.loading_counters = true;
            if !matches!(state.feed, CounterFeedState::Loaded(_)) {
                state.feed = CounterFeedState::Loading;
            }
            state.counters_seq
        };

        let result = self.deps.counters.list_available().await;

        let snapshot = {
            let mut state = lock(&self.state);
            if seq != state.counters_seq {
                log::debug!("丢弃过期的可用计数器响应 (#{})", seq);
                return Ok(());
            }
            state.loading.loading_counters = false;
            match result {
                Ok(entries) => {
                    log::debug!("可用计数器已刷新: {} 个", entries.len());
                    state.feed = CounterFeedState::Loaded(entries);
                    self.after_background_reconcile(&mut state)?
                }
                Err(error) => {
                    state.feed = CounterFeedState::Failed(error.to_string());
                    drop(state);
                    self.report_failure("加载计数器列表", &error);
                    return Err(error);
                }
            }
        };

        if let Some(snapshot) = snapshot {
            self.draft.schedule(snapshot)?;
        }
        Ok(())
    }

    /// 缓存更新后重新协调，配对被修改时返回需要写入草稿的快照
    fn after_background_reconcile(&self, state: &mut ControllerState) -> AppResult<Option<EditSessionSnapshot>> {
        if state.session.is_none() || !state.reconcile_session() {
            return Ok(None);
        }
        let session = state.session_mut()?;
        session.revalidate(&self.registry)?;
        session.dirty = true;
        Ok(Some(session.snapshot()))
    }

    /// 刷新串口列表
    pub async fn refresh_ports(&self) -> AppResult<()> {
        match self.deps.ports.list_ports().await {
            Ok(ports) => {
                lock(&self.state).ports = ports;
                Ok(())
            }
            Err(error) => {
                self.report_failure("获取串口列表", &error);
                Err(error)
            }
        }
    }

    /// 并发刷新记录列表、可用计数器和串口列表
    ///
    /// 各项失败互不影响（各自通知一次），返回第一个错误
    pub async fn refresh_all(&self) -> AppResult<()> {
        let (records, counters, ports) =
            futures::join!(self.refresh_records(), self.refresh_counters(), self.refresh_ports());
        records.and(counters).and(ports)
    }

    // ========================================================================
    // 解析器测试
    // ========================================================================

    /// 使用当前解析器设置试解析一段原始文本
    ///
    /// 新的测试会先取消仍在进行的测试。被取消或被后续测试取代时返回 `Ok(None)`。
    /// 测试不会修改编辑会话。
    pub async fn test_parser(&self, raw_text: String) -> AppResult<Option<ParserTestOutcome>> {
        let (token, seq, settings) = {
            let mut state = lock(&self.state);
            let session = state.session()?;
            if session.logger_type() != LoggerType::EasySerial {
                return Err(AppError::business_logic_error(format!(
                    "类型 {} 不支持解析器测试",
                    session.logger_type()
                )));
            }
            let settings = parser_settings_for_test(&session.values.parser_subtree());

            if let Some(previous) = state.parser_cancel.take() {
                previous.cancel();
            }
            let token = CancellationToken::new();
            state.parser_seq += 1;
            state.parser_cancel = Some(token.clone());
            state.loading.testing = true;
            (token, state.parser_seq, settings)
        };

        let result = self
            .deps
            .parser_tester
            .test_parser(raw_text, settings, token.clone())
            .await;

        let current = {
            let mut state = lock(&self.state);
            let current = state.parser_seq == seq;
            if current {
                state.loading.testing = false;
                state.parser_cancel = None;
            }
            current
        };

        match result {
            Ok(_) if !current || token.is_cancelled() => Ok(None),
            Ok(outcome) => Ok(Some(outcome)),
            Err(error) if error.is_cancelled() || !current => {
                log::debug!("解析器测试已取消: {}", error);
                Ok(None)
            }
            Err(error) => {
                self.report_failure("解析器测试", &error);
                Err(error)
            }
        }
    }

    /// 取消正在进行的解析器测试
    pub fn cancel_parser_test(&self) {
        let mut state = lock(&self.state);
        if let Some(token) = state.parser_cancel.take() {
            token.cancel();
            state.loading.testing = false;
            log_user_operation!("取消解析器测试");
        }
    }

    // ========================================================================
    // 只读访问
    // ========================================================================

    pub fn snapshot(&self) -> AppResult<EditSessionSnapshot> {
        Ok(lock(&self.state).session()?.snapshot())
    }

    pub fn values(&self) -> AppResult<FormValues> {
        Ok(lock(&self.state).session()?.values.clone())
    }

    pub fn errors(&self) -> AppResult<FieldErrors> {
        Ok(lock(&self.state).session()?.errors.clone())
    }

    /// 会话整体是否有效（决定保存按钮是否可用）
    pub fn is_valid(&self) -> bool {
        let state = lock(&self.state);
        state
            .session
            .as_ref()
            .and_then(|session| validate_form(&session.values, &self.registry).ok())
            .map_or(false, |errors| errors.is_empty())
    }

    pub fn loading(&self) -> LoadingFlags {
        lock(&self.state).loading
    }

    pub fn cached_records(&self) -> Option<Vec<LoggerRecord>> {
        lock(&self.state).records.clone()
    }

    pub fn counter_feed(&self) -> CounterFeedState {
        lock(&self.state).feed.clone()
    }

    /// 当前类型对应的编辑器
    pub fn editor_kind(&self) -> AppResult<EditorKind> {
        let logger_type = lock(&self.state).session()?.logger_type();
        Ok(self.registry.descriptor(logger_type)?.editor)
    }

    /// 计数器选择器视图（合成的"使用中"选项在前）
    pub fn counter_options(&self) -> AppResult<CounterSelectorView> {
        let state = lock(&self.state);
        let session = state.session()?;
        Ok(selector_view(&state.feed, session.counter_synthetic.as_ref()))
    }

    /// 计数器连接选项（去重，保持出现顺序）
    pub fn counter_connection_choices(&self) -> AppResult<Vec<(i64, String)>> {
        Ok(connection_choices(&self.counter_options()?.options))
    }

    /// 某个计数器连接下的设备选项
    pub fn counter_device_choices(&self, connection_id: i64) -> AppResult<Vec<CounterOption>> {
        let view = self.counter_options()?;
        Ok(device_choices(&view.options, connection_id).into_iter().cloned().collect())
    }

    /// 串口选项，已保存但未被发现的串口以禁用状态注入
    pub fn port_options(&self) -> AppResult<Vec<PortOption>> {
        let state = lock(&self.state);
        let session = state.session()?;
        let saved = session.values.config.serial_port().map(|p| p.port.as_str());
        Ok(port_options(&state.ports, saved))
    }

    fn report_failure(&self, operation: &str, error: &AppError) {
        if error.is_cancelled() {
            log::debug!("{}已取消", operation);
            return;
        }
        log_communication_failure!("{}失败: {}", operation, error);
        self.deps.notifier.error(&format!("{}失败: {}", operation, error));
    }
}

impl Drop for EditSessionController {
    fn drop(&mut self) {
        self.draft.cancel();
        if let Some(token) = lock(&self.state).parser_cancel.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::services::{
        MockICounterAvailabilitySource, MockINotifier, MockIParserTester, MockIRecordStore,
        MockISerialPortDiscovery,
    };
    use crate::models::{AvailableCounter, TypeConfig};
    use std::time::Duration;

    fn available(connection_id: i64, device_id: i64) -> AvailableCounter {
        AvailableCounter {
            connection_id,
            connection_name: format!("Counters {}", connection_id),
            device_id,
            device_name: format!("Dev {}", device_id),
            serial: device_id,
            state: None,
        }
    }

    struct Mocks {
        records: MockIRecordStore,
        counters: MockICounterAvailabilitySource,
        parser_tester: MockIParserTester,
        ports: MockISerialPortDiscovery,
        notifier: MockINotifier,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                records: MockIRecordStore::new(),
                counters: MockICounterAvailabilitySource::new(),
                parser_tester: MockIParserTester::new(),
                ports: MockISerialPortDiscovery::new(),
                notifier: MockINotifier::new(),
            }
        }

        fn controller(self, logger_type: LoggerType) -> EditSessionController {
            let deps = SessionControllerDeps {
                records: Arc::new(self.records),
                counters: Arc::new(self.counters),
                parser_tester: Arc::new(self.parser_tester),
                ports: Arc::new(self.ports),
                notifier: Arc::new(self.notifier),
            };
            let registry = Arc::new(LoggerTypeRegistry::builtin());
            let draft = Arc::new(
                DraftStore::seeded(&registry, logger_type, Duration::from_millis(500)).unwrap(),
            );
            let controller = EditSessionController::new(deps, registry, draft);
            controller.mount().unwrap();
            controller
        }
    }

    #[tokio::test]
    async fn test_validation_failure_blocks_save_without_notification() {
        let mut mocks = Mocks::new();
        mocks.records.expect_create().never();
        mocks.notifier.expect_error().never();
        let controller = mocks.controller(LoggerType::EasySerial);

        let error = controller.save(|_| {}).await.unwrap_err();
        assert!(error.is_validation());
        assert!(controller.errors().unwrap().contains_key("name"));
        assert!(!controller.loading().saving);
    }

    #[tokio::test]
    async fn test_create_resets_session_and_calls_back() {
        let mut mocks = Mocks::new();
        mocks.records.expect_create().times(1).returning(|mut record| {
            record.id = Some(7);
            Ok(record)
        });
        mocks.records.expect_list().returning(|| Ok(Vec::new()));
        mocks.notifier.expect_info().times(1).return_const(());
        let controller = mocks.controller(LoggerType::EasySerial);

        controller
            .edit(|values| {
                values.name = "Line 1".to_string();
                if let Some(port) = values.config.serial_port_mut() {
                    port.port = "COM3".to_string();
                }
            })
            .unwrap();

        let mut saved_id = None;
        let saved = controller.save(|record| saved_id = record.id).await.unwrap();
        assert_eq!(saved.id, Some(7));
        assert_eq!(saved_id, Some(7));

        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.values.name, "");
        assert_eq!(snapshot.editing_id, None);
        assert_eq!(snapshot.values.logger_type(), LoggerType::EasySerial);
    }

    #[tokio::test]
    async fn test_update_failure_notifies_once_and_keeps_session() {
        let mut mocks = Mocks::new();
        mocks
            .records
            .expect_update()
            .times(1)
            .returning(|_, _| Err(AppError::conflict_error("名称已存在")));
        mocks.notifier.expect_error().times(1).return_const(());
        let controller = mocks.controller(LoggerType::ModbusTcp);

        {
            let mut state = lock(&controller.state);
            let session = state.session.as_mut().unwrap();
            session.editing_id = Some(4);
        }
        controller
            .edit(|values| {
                values.name = "PLC".to_string();
                if let TypeConfig::ModbusTcp(cfg) = &mut values.config {
                    cfg.host.address = "10.0.0.5".to_string();
                }
            })
            .unwrap();

        let error = controller.save(|_| panic!("不应回调")).await.unwrap_err();
        assert_eq!(error.error_code(), "CONFLICT_ERROR");
        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.values.name, "PLC");
        assert_eq!(snapshot.editing_id, Some(4));
    }

    #[tokio::test]
    async fn test_cancelled_parser_error_is_silent() {
        let mut mocks = Mocks::new();
        mocks
            .parser_tester
            .expect_test_parser()
            .returning(|_, _, _| Err(AppError::cancelled("解析器测试")));
        mocks.notifier.expect_error().never();
        let controller = mocks.controller(LoggerType::EasySerial);

        let outcome = controller.test_parser("1;2\n".to_string()).await.unwrap();
        assert!(outcome.is_none());
        assert!(!controller.loading().testing);
    }

    #[tokio::test]
    async fn test_failed_counter_feed_degrades_selector() {
        let mut mocks = Mocks::new();
        mocks
            .counters
            .expect_list_available()
            .returning(|| Err(AppError::network_error("连接被拒绝")));
        mocks.notifier.expect_error().times(1).return_const(());
        let controller = mocks.controller(LoggerType::Mbox);

        assert!(controller.refresh_counters().await.is_err());
        let view = controller.counter_options().unwrap();
        assert!(view.disabled);
        assert!(view.message.is_some());
        assert!(controller.counter_feed().is_failed());
    }

    #[tokio::test]
    async fn test_enable_ext_counter_auto_selects_first_device() {
        let mut mocks = Mocks::new();
        mocks
            .counters
            .expect_list_available()
            .returning(|| Ok(vec![available(2, 5), available(2, 6), available(3, 1)]));
        let controller = mocks.controller(LoggerType::Mbox);
        controller.refresh_counters().await.unwrap();

        controller.set_ext_counter(true).unwrap();
        controller.set_counter_connection(Some(2)).unwrap();
        let values = controller.values().unwrap();
        let mbox = values.config.as_mbox().unwrap();
        assert_eq!(mbox.counter_pair(), Some((2, 5)));

        controller.set_counter_connection(Some(3)).unwrap();
        let values = controller.values().unwrap();
        assert_eq!(values.config.as_mbox().unwrap().counter_pair(), Some((3, 1)));
    }

    #[tokio::test]
    async fn test_edit_rejects_type_change() {
        let controller = Mocks::new().controller(LoggerType::EasySerial);
        let error = controller
            .edit(|values| values.config = TypeConfig::Mbox(MboxConfig::default()))
            .unwrap_err();
        assert!(error.is_fatal());
        assert_eq!(controller.values().unwrap().logger_type(), LoggerType::EasySerial);
    }

    #[test]
    fn test_operations_before_mount_are_structural_errors() {
        let mocks = Mocks::new();
        let deps = SessionControllerDeps {
            records: Arc::new(mocks.records),
            counters: Arc::new(mocks.counters),
            parser_tester: Arc::new(mocks.parser_tester),
            ports: Arc::new(mocks.ports),
            notifier: Arc::new(mocks.notifier),
        };
        let registry = Arc::new(LoggerTypeRegistry::builtin());
        let draft = Arc::new(DraftStore::seeded(&registry, LoggerType::Mbox, Duration::from_millis(500)).unwrap());
        let controller = EditSessionController::new(deps, registry, draft);

        assert!(controller.snapshot().unwrap_err().is_fatal());
        assert!(controller.request_delete().unwrap_err().is_fatal());
        assert!(!controller.is_valid());
    }

    #[test]
    fn test_edit_outside_runtime_leaves_session_unchanged() {
        let controller = Mocks::new().controller(LoggerType::Mbox);

        let error = controller.edit(|values| values.name = "x".to_string()).unwrap_err();
        assert!(error.is_fatal());
        assert!(controller.set_enabled(true).unwrap_err().is_fatal());

        let snapshot = controller.snapshot().unwrap();
        assert_eq!(snapshot.values.name, "");
        assert!(!snapshot.values.enabled);
        assert!(!snapshot.dirty);
    }
}
