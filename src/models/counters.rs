//! # 计数器与串口选项模型
//!
//! ## 业务说明
//! - `AvailableCounter`: 后端返回的"可用计数器"条目，保持服务端顺序
//! - `CounterOption`: 会话内选择器展示的选项，可能包含合成的"使用中"选项
//! - `CounterFeedState`: 可用计数器列表的加载状态
//! - `SerialPortInfo` / `PortOption`: 串口发现结果与下拉选项

use serde::{Deserialize, Serialize};

/// 一个可被 MBox 记录绑定的计数器设备
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailableCounter {
    /// 所属 mbox_counter 记录的ID
    pub connection_id: i64,
    pub connection_name: String,
    pub device_id: i64,
    pub device_name: String,
    /// 总线地址
    pub serial: i64,
    /// 运行状态（worker 未运行时为 None）
    pub state: Option<String>,
}

impl AvailableCounter {
    pub fn pair(&self) -> (i64, i64) {
        (self.connection_id, self.device_id)
    }
}

/// 计数器选择器中的一个选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOption {
    pub connection_id: i64,
    pub device_id: i64,
    pub connection_label: String,
    pub device_label: String,
    /// 合成的"使用中"选项：当前记录持有但不在可用列表中
    pub in_use: bool,
}

/// 可用计数器列表的加载状态
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CounterFeedState {
    #[default]
    NotLoaded,
    Loading,
    Loaded(Vec<AvailableCounter>),
    Failed(String),
}

impl CounterFeedState {
    /// 已加载的条目，其他状态返回 None
    pub fn entries(&self) -> Option<&[AvailableCounter]> {
        match self {
            CounterFeedState::Loaded(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, CounterFeedState::Failed(_))
    }
}

/// 计数器选择器的完整视图
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CounterSelectorView {
    pub options: Vec<CounterOption>,
    /// 列表加载失败时选择器不可用
    pub disabled: bool,
    /// 选择器下方的提示（例如加载失败）
    pub message: Option<String>,
}

/// 串口发现结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerialPortInfo {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// 串口下拉选项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortOption {
    pub name: String,
    pub label: String,
    /// 已保存但当前未发现的串口以禁用状态注入
    pub disabled: bool,
}
