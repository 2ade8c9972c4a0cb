/// 本地可用计数器来源
///
/// 业务说明：
/// 从记录存储推导可供 MBox 记录绑定的计数器设备
/// 1. 收集所有打开外部计数器的 MBox 记录占用的（连接, 设备）配对
/// 2. 遍历所有 mbox_counter 记录中已启用且未被占用的设备
/// 结果保持记录顺序和设备顺序。本地没有运行时信息，`state` 始终为空。

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::services::{ICounterAvailabilitySource, IRecordStore};
use crate::models::{AvailableCounter, LoggerRecord, TypeConfig};
use crate::utils::error::AppResult;

pub struct LocalCounterAvailability {
    records: Arc<dyn IRecordStore>,
}

impl LocalCounterAvailability {
    pub fn new(records: Arc<dyn IRecordStore>) -> Self {
        Self { records }
    }

    /// 从记录列表计算可用设备
    pub fn available_from(records: &[LoggerRecord]) -> Vec<AvailableCounter> {
        let bound: HashSet<(i64, i64)> = records
            .iter()
            .filter(|r| r.id.is_some())
            .filter_map(|r| r.config.as_mbox())
            .filter(|mbox| mbox.ext_counter)
            .filter_map(|mbox| mbox.counter_pair())
            .collect();

        let mut available = Vec::new();
        for record in records {
            let (Some(connection_id), TypeConfig::MboxCounter(counter)) = (record.id, &record.config) else {
                continue;
            };
            for device in counter.devices.iter().filter(|d| d.enabled) {
                if bound.contains(&(connection_id, device.device_id)) {
                    continue;
                }
                available.push(AvailableCounter {
                    connection_id,
                    connection_name: record.name.clone(),
                    device_id: device.device_id,
                    device_name: device.name.clone(),
                    serial: device.serial,
                    state: None,
                });
            }
        }
        available
    }
}

#[async_trait]
impl ICounterAvailabilitySource for LocalCounterAvailability {
    async fn list_available(&self) -> AppResult<Vec<AvailableCounter>> {
        let records = self.records.list().await?;
        let available = Self::available_from(&records);
        log::debug!("可用计数器: {} 个", available.len());
        Ok(available)
    }
}
