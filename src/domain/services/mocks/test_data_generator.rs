use crate::models::{
    AvailableCounter, CounterDeviceConfig, LoggerRecord, MboxConfig, MboxCounterConfig, TypeConfig,
};

/// 测试数据生成器
pub struct TestDataGenerator;

impl TestDataGenerator {
    fn record(id: i64, name: &str, config: TypeConfig) -> LoggerRecord {
        LoggerRecord {
            id: Some(id),
            name: name.to_string(),
            autostart: false,
            enabled: false,
            db_user: None,
            db_password: None,
            table_name: None,
            query_template: None,
            config,
        }
    }

    /// 生成 mbox_counter 记录，设备名为 (device_id, name)
    pub fn counter_record(id: i64, name: &str, devices: &[(i64, &str)]) -> LoggerRecord {
        Self::record(
            id,
            name,
            TypeConfig::MboxCounter(MboxCounterConfig {
                devices: devices
                    .iter()
                    .map(|(device_id, device_name)| CounterDeviceConfig {
                        device_id: *device_id,
                        name: device_name.to_string(),
                        serial: 1000 + *device_id,
                        enabled: true,
                    })
                    .collect(),
                ..MboxCounterConfig::default()
            }),
        )
    }

    /// 生成 MBox 记录，`pair` 为外部计数器配对
    pub fn mbox_record(id: i64, name: &str, pair: Option<(i64, i64)>) -> LoggerRecord {
        let mut mbox = MboxConfig::default();
        mbox.port.port = format!("COM{}", id);
        if let Some((connection_id, device_id)) = pair {
            mbox.ext_counter = true;
            mbox.counter_connection_id = Some(connection_id);
            mbox.counter_device_id = Some(device_id);
        }
        Self::record(id, name, TypeConfig::Mbox(mbox))
    }

    /// 生成可用计数器条目
    pub fn available(connection_id: i64, device_id: i64) -> AvailableCounter {
        AvailableCounter {
            connection_id,
            connection_name: format!("Counters {}", connection_id),
            device_id,
            device_name: format!("Counter {}-{}", connection_id, device_id),
            serial: 1000 + device_id,
            state: Some(format!("conn-{}", rand::random::<u8>() % 3)),
        }
    }
}
