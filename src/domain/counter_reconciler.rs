//! # 计数器配对协调
//!
//! ## 业务说明
//! MBox 记录打开外部计数器后，通过（计数器连接, 设备）二元组引用某个
//! mbox_counter 记录下的设备。可用计数器列表随时间变化，本模块保证该引用始终有效：
//!
//! 1. 列表未加载完成（未加载/加载中/失败）时不做任何修改
//! 2. 当前配对在可用列表中：不变
//! 3. 当前配对不在列表中，但属于本记录（正在编辑的已保存记录，其缓存副本持有同一配对）：
//!    保留配对，并合成一个"使用中"的展示选项，绝不自动更改
//! 4. 否则自动选择同一连接下列表中的第一个设备（保持服务端顺序）；
//!    该连接下没有可用设备时，设备置空，由校验提示
//!
//! 合成选项只存在于会话自己的选项列表中，共享的可用列表从不修改。

use crate::models::{
    AvailableCounter, CounterFeedState, CounterOption, CounterSelectorView, LoggerRecord, MboxConfig,
    TypeConfig,
};

/// 可用列表加载失败时的提示
pub const FEED_FAILED_MESSAGE: &str = "计数器列表加载失败";

const IN_USE_SUFFIX: &str = "（使用中）";

/// 协调结果
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reconciliation {
    /// 配对是否被修改
    pub changed: bool,
    /// 本会话的合成"使用中"选项
    pub synthetic: Option<CounterOption>,
}

/// 协调所需的上下文
#[derive(Debug, Clone, Copy)]
pub struct ReconcileContext<'a> {
    pub feed: &'a CounterFeedState,
    /// 记录列表缓存，从未加载时为 None
    pub records: Option<&'a [LoggerRecord]>,
    /// 正在编辑的记录ID
    pub editing_id: Option<i64>,
}

/// 协调 MBox 配置中的计数器配对
pub fn reconcile(mbox: &mut MboxConfig, ctx: ReconcileContext<'_>) -> Reconciliation {
    if !mbox.ext_counter {
        return Reconciliation::default();
    }
    let Some(entries) = ctx.feed.entries() else {
        return Reconciliation::default();
    };
    let Some(connection_id) = mbox.counter_connection_id else {
        return Reconciliation::default();
    };

    if let Some(device_id) = mbox.counter_device_id {
        if entries.iter().any(|e| e.pair() == (connection_id, device_id)) {
            return Reconciliation::default();
        }
        if let Some(synthetic) = held_by_session(connection_id, device_id, ctx) {
            return Reconciliation {
                changed: false,
                synthetic: Some(synthetic),
            };
        }
    }

    let replacement = entries
        .iter()
        .find(|e| e.connection_id == connection_id)
        .map(|e| e.device_id);
    let changed = replacement != mbox.counter_device_id;
    if changed {
        log::debug!(
            "计数器配对调整: 连接 {} 设备 {:?} → {:?}",
            connection_id,
            mbox.counter_device_id,
            replacement
        );
    }
    mbox.counter_device_id = replacement;

    Reconciliation {
        changed,
        synthetic: None,
    }
}

/// 配对是否属于正在编辑的已保存记录，是则返回合成选项
fn held_by_session(connection_id: i64, device_id: i64, ctx: ReconcileContext<'_>) -> Option<CounterOption> {
    let editing_id = ctx.editing_id?;

    let Some(records) = ctx.records else {
        // 记录列表从未加载：仍然保留，使用数字占位标签
        return Some(placeholder_option(connection_id, device_id));
    };

    let held = records
        .iter()
        .filter(|r| r.id == Some(editing_id))
        .filter_map(|r| r.config.as_mbox())
        .any(|m| m.counter_pair() == Some((connection_id, device_id)));
    if !held {
        return None;
    }

    let counter_record = records.iter().find(|r| r.id == Some(connection_id));
    let connection_label = counter_record
        .map(|r| r.name.clone())
        .unwrap_or_else(|| format!("连接 #{}", connection_id));
    let device_name = counter_record
        .and_then(|r| match &r.config {
            TypeConfig::MboxCounter(cfg) => cfg.devices.iter().find(|d| d.device_id == device_id),
            _ => None,
        })
        .map(|d| d.name.clone())
        .unwrap_or_else(|| format!("设备 #{}", device_id));

    Some(CounterOption {
        connection_id,
        device_id,
        connection_label,
        device_label: format!("{}{}", device_name, IN_USE_SUFFIX),
        in_use: true,
    })
}

fn placeholder_option(connection_id: i64, device_id: i64) -> CounterOption {
    CounterOption {
        connection_id,
        device_id,
        connection_label: format!("连接 #{}", connection_id),
        device_label: format!("设备 #{}{}", device_id, IN_USE_SUFFIX),
        in_use: true,
    }
}

fn feed_option(entry: &AvailableCounter) -> CounterOption {
    CounterOption {
        connection_id: entry.connection_id,
        device_id: entry.device_id,
        connection_label: entry.connection_name.clone(),
        device_label: entry.device_name.clone(),
        in_use: false,
    }
}

/// 会话的计数器选择器视图：合成选项在前，其后是可用列表
pub fn selector_view(feed: &CounterFeedState, synthetic: Option<&CounterOption>) -> CounterSelectorView {
    let mut options: Vec<CounterOption> = synthetic.cloned().into_iter().collect();
    if let Some(entries) = feed.entries() {
        options.extend(entries.iter().map(feed_option));
    }

    match feed {
        CounterFeedState::Failed(_) => CounterSelectorView {
            options,
            disabled: true,
            message: Some(FEED_FAILED_MESSAGE.to_string()),
        },
        _ => CounterSelectorView {
            options,
            disabled: false,
            message: None,
        },
    }
}

/// 不重复的连接选项，保持出现顺序
pub fn connection_choices(options: &[CounterOption]) -> Vec<(i64, String)> {
    let mut choices: Vec<(i64, String)> = Vec::new();
    for option in options {
        if !choices.iter().any(|(id, _)| *id == option.connection_id) {
            choices.push((option.connection_id, option.connection_label.clone()));
        }
    }
    choices
}

/// 某个连接下的设备选项
pub fn device_choices(options: &[CounterOption], connection_id: i64) -> Vec<&CounterOption> {
    options.iter().filter(|o| o.connection_id == connection_id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CounterDeviceConfig, MboxCounterConfig};

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

    fn mbox_with_pair(connection_id: i64, device_id: Option<i64>) -> MboxConfig {
        MboxConfig {
            ext_counter: true,
            counter_connection_id: Some(connection_id),
            counter_device_id: device_id,
            ..MboxConfig::default()
        }
    }

    fn mbox_record(id: i64, mbox: MboxConfig) -> LoggerRecord {
        LoggerRecord {
            id: Some(id),
            name: format!("Scale {}", id),
            autostart: false,
            enabled: false,
            db_user: None,
            db_password: None,
            table_name: None,
            query_template: None,
            config: TypeConfig::Mbox(mbox),
        }
    }

    fn counter_record(id: i64, name: &str, devices: Vec<(i64, &str)>) -> LoggerRecord {
        LoggerRecord {
            id: Some(id),
            name: name.to_string(),
            autostart: false,
            enabled: false,
            db_user: None,
            db_password: None,
            table_name: None,
            query_template: None,
            config: TypeConfig::MboxCounter(MboxCounterConfig {
                devices: devices
                    .into_iter()
                    .map(|(device_id, name)| CounterDeviceConfig {
                        device_id,
                        name: name.to_string(),
                        serial: device_id,
                        enabled: true,
                    })
                    .collect(),
                ..MboxCounterConfig::default()
            }),
        }
    }

    #[test]
    fn test_absent_pair_auto_selects_first_of_same_connection() {
        let feed = CounterFeedState::Loaded(vec![available(1, 10), available(1, 11), available(3, 1)]);
        let mut mbox = mbox_with_pair(1, Some(99));

        let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: Some(&[]), editing_id: None });

        assert!(result.changed);
        assert_eq!(result.synthetic, None);
        assert_eq!(mbox.counter_pair(), Some((1, 10)));
    }

    #[test]
    fn test_present_pair_unchanged() {
        let feed = CounterFeedState::Loaded(vec![available(1, 10), available(1, 11)]);
        let mut mbox = mbox_with_pair(1, Some(11));

        let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: None, editing_id: None });

        assert_eq!(result, Reconciliation::default());
        assert_eq!(mbox.counter_pair(), Some((1, 11)));
    }

    #[test]
    fn test_no_device_for_connection_becomes_unresolved() {
        let feed = CounterFeedState::Loaded(vec![available(1, 10)]);
        let mut mbox = mbox_with_pair(4, Some(2));

        let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: Some(&[]), editing_id: Some(8) });

        assert!(result.changed);
        assert_eq!(mbox.counter_connection_id, Some(4));
        assert_eq!(mbox.counter_device_id, None);
    }

    #[test]
    fn test_pair_held_by_record_synthesizes_in_use_option() {
        let feed = CounterFeedState::Loaded(vec![available(2, 6)]);
        let records = vec![
            counter_record(2, "Line counters", vec![(5, "Tank-Counter"), (6, "Spare")]),
            mbox_record(8, mbox_with_pair(2, Some(5))),
        ];
        let mut mbox = mbox_with_pair(2, Some(5));

        let result = reconcile(
            &mut mbox,
            ReconcileContext { feed: &feed, records: Some(records.as_slice()), editing_id: Some(8) },
        );

        assert!(!result.changed);
        assert_eq!(mbox.counter_pair(), Some((2, 5)));
        let synthetic = result.synthetic.unwrap();
        assert!(synthetic.in_use);
        assert_eq!(synthetic.connection_label, "Line counters");
        assert_eq!(synthetic.device_label, "Tank-Counter（使用中）");

        let view = selector_view(&feed, Some(&synthetic));
        assert_eq!(view.options.iter().filter(|o| o.in_use).count(), 1);
        assert_eq!(view.options.len(), 2);
        // 共享列表没有被修改
        assert_eq!(feed.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_other_session_is_not_offered_the_held_pair() {
        let feed = CounterFeedState::Loaded(vec![available(2, 6)]);
        let records = vec![
            counter_record(2, "Line counters", vec![(5, "Tank-Counter"), (6, "Spare")]),
            mbox_record(8, mbox_with_pair(2, Some(5))),
        ];
        // 新建会话手动输入了同一配对
        let mut mbox = mbox_with_pair(2, Some(5));

        let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: Some(records.as_slice()), editing_id: None });

        assert_eq!(result.synthetic, None);
        assert_eq!(mbox.counter_pair(), Some((2, 6)));
    }

    #[test]
    fn test_cold_cache_keeps_pair_with_placeholders() {
        let feed = CounterFeedState::Loaded(vec![]);
        let mut mbox = mbox_with_pair(2, Some(5));

        let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: None, editing_id: Some(8) });

        let synthetic = result.synthetic.unwrap();
        assert_eq!(synthetic.connection_label, "连接 #2");
        assert_eq!(synthetic.device_label, "设备 #5（使用中）");
        assert_eq!(mbox.counter_pair(), Some((2, 5)));
    }

    #[test]
    fn test_feed_not_loaded_or_failed_changes_nothing() {
        for feed in [
            CounterFeedState::NotLoaded,
            CounterFeedState::Loading,
            CounterFeedState::Failed("timeout".to_string()),
        ] {
            let mut mbox = mbox_with_pair(1, Some(99));
            let result = reconcile(&mut mbox, ReconcileContext { feed: &feed, records: None, editing_id: None });
            assert_eq!(result, Reconciliation::default());
            assert_eq!(mbox.counter_pair(), Some((1, 99)));
        }

        let view = selector_view(&CounterFeedState::Failed("timeout".to_string()), None);
        assert!(view.disabled);
        assert_eq!(view.message.as_deref(), Some(FEED_FAILED_MESSAGE));
    }

    #[test]
    fn test_choice_helpers_keep_feed_order() {
        let feed = CounterFeedState::Loaded(vec![available(3, 1), available(1, 11), available(3, 2), available(1, 10)]);
        let view = selector_view(&feed, None);

        let connections: Vec<i64> = connection_choices(&view.options).into_iter().map(|(id, _)| id).collect();
        assert_eq!(connections, vec![3, 1]);

        let devices: Vec<i64> = device_choices(&view.options, 1).into_iter().map(|o| o.device_id).collect();
        assert_eq!(devices, vec![11, 10]);
    }
}
