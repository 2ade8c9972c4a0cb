//! # 设备专属配置块
//!
//! 每种日志器类型对应一个配置块，字段与默认值与后端设置文件保持一致。
//! 所有结构体都使用 `#[serde(default)]`，缺失的字段在反序列化时取默认值。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::enums::{FlowControl, MissStrategy, ModbusValueEncoding, ParsedFieldKind, SerialParity};

/// 串口参数（所有串口类日志器共用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialPortSettings {
    /// 串口名称，例如 "COM3" 或 "/dev/ttyUSB0"
    pub port: String,
    pub baudrate: u32,
    pub databits: u8,
    pub parity: SerialParity,
    pub stopbits: f64,
    pub flowcontrol: FlowControl,
    /// 启动时自动连接
    pub autoconnect: bool,
    /// 读取超时（秒）
    pub timeout: f64,
}

impl Default for SerialPortSettings {
    fn default() -> Self {
        Self {
            port: String::new(),
            baudrate: 9600,
            databits: 8,
            parity: SerialParity::None,
            stopbits: 1.0,
            flowcontrol: FlowControl::None,
            autoconnect: true,
            timeout: 1.0,
        }
    }
}

/// Easy Serial 解析出的单个字段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ParsedFieldConfig {
    /// 分隔后片段的下标（从0开始）
    pub index: i64,
    /// 字段名，同时也是查询模板中的占位符名
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParsedFieldKind,
    /// 日期时间类字段的格式串
    pub format: Option<String>,
}

/// Easy Serial 解析器设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EasySerialParserSettings {
    pub preamble: Option<String>,
    pub terminator: String,
    pub separator: String,
    pub encoding: String,
    pub fields: Vec<ParsedFieldConfig>,
}

impl Default for EasySerialParserSettings {
    fn default() -> Self {
        Self {
            preamble: None,
            terminator: "\n".to_string(),
            separator: ";".to_string(),
            encoding: "utf-8".to_string(),
            fields: Vec::new(),
        }
    }
}

/// Easy Serial 配置块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EasySerialConfig {
    pub port: SerialPortSettings,
    pub parser: EasySerialParserSettings,
}

/// MBox 称重设备配置块
///
/// **外部计数器**: `ext_counter` 打开后，称重记录会与某个 mbox_counter
/// 连接下的计数器设备配对，计数器相关字段才会参与校验
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MboxConfig {
    pub port: SerialPortSettings,
    /// 设备地址
    pub mbox_id: i64,
    /// 皮重
    pub tare: f64,
    /// 批次号
    pub lot: String,
    pub treat_zero_as_error: bool,
    pub treat_duplicate_as_error: bool,
    pub error_label_zero: String,
    pub error_label_duplicate: String,
    pub encoding: String,

    // 外部计数器联动
    pub ext_counter: bool,
    pub counter_connection_id: Option<i64>,
    pub counter_device_id: Option<i64>,
    /// 计数器清零超时（秒）
    pub counter_clean_timeout: f64,
    /// 计数器漏包判定超时（秒）
    pub counter_miss_timeout: f64,
    pub miss_strategy: MissStrategy,
    pub miss_default: BTreeMap<String, serde_json::Value>,
    pub miss_insert_limit: i64,
    pub miss_error_label: String,
}

impl Default for MboxConfig {
    fn default() -> Self {
        Self {
            port: SerialPortSettings::default(),
            mbox_id: 1,
            tare: 0.0,
            lot: String::new(),
            treat_zero_as_error: true,
            treat_duplicate_as_error: true,
            error_label_zero: "no weight".to_string(),
            error_label_duplicate: "no weight".to_string(),
            encoding: "ascii".to_string(),
            ext_counter: false,
            counter_connection_id: None,
            counter_device_id: None,
            counter_clean_timeout: 6.0,
            counter_miss_timeout: 4.0,
            miss_strategy: MissStrategy::Last,
            miss_default: BTreeMap::new(),
            miss_insert_limit: 1,
            miss_error_label: "scales error".to_string(),
        }
    }
}

impl MboxConfig {
    /// 将外部计数器相关字段恢复为默认值
    ///
    /// 关闭 `ext_counter` 时调用，避免残留的旧值在下次打开时被误用
    pub fn reset_counter_fields(&mut self) {
        let defaults = MboxConfig::default();
        self.counter_connection_id = defaults.counter_connection_id;
        self.counter_device_id = defaults.counter_device_id;
        self.counter_clean_timeout = defaults.counter_clean_timeout;
        self.counter_miss_timeout = defaults.counter_miss_timeout;
        self.miss_strategy = defaults.miss_strategy;
        self.miss_default = defaults.miss_default;
        self.miss_insert_limit = defaults.miss_insert_limit;
        self.miss_error_label = defaults.miss_error_label;
    }

    /// 当前配对（连接, 设备），任一缺失时返回 None
    pub fn counter_pair(&self) -> Option<(i64, i64)> {
        match (self.counter_connection_id, self.counter_device_id) {
            (Some(connection_id), Some(device_id)) => Some((connection_id, device_id)),
            _ => None,
        }
    }
}

/// 计数器总线上的单个设备
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterDeviceConfig {
    pub device_id: i64,
    pub name: String,
    /// 总线地址（uint16）
    pub serial: i64,
    pub enabled: bool,
}

impl Default for CounterDeviceConfig {
    fn default() -> Self {
        Self {
            device_id: 1,
            name: String::new(),
            serial: 0,
            enabled: true,
        }
    }
}

/// MBox 计数器配置块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MboxCounterConfig {
    pub port: SerialPortSettings,
    /// 轮询周期（秒）
    pub poll_interval: f64,
    pub devices: Vec<CounterDeviceConfig>,
}

impl Default for MboxCounterConfig {
    fn default() -> Self {
        Self {
            port: SerialPortSettings::default(),
            poll_interval: 1.0,
            devices: Vec::new(),
        }
    }
}

/// Modbus 变量映射
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusVariableConfig {
    pub name: String,
    /// 起始寄存器地址
    pub address: i64,
    pub encoding: ModbusValueEncoding,
    /// y = k*x + b
    pub k: f64,
    pub b: f64,
    /// 读取失败时的回退值
    pub default: Option<f64>,
}

impl Default for ModbusVariableConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            address: 0,
            encoding: ModbusValueEncoding::U16,
            k: 1.0,
            b: 0.0,
            default: None,
        }
    }
}

/// Modbus 从站
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusSlaveConfig {
    pub slave_id: i64,
    pub slave_name: String,
    pub variables: Vec<ModbusVariableConfig>,
}

impl Default for ModbusSlaveConfig {
    fn default() -> Self {
        Self {
            slave_id: 1,
            slave_name: String::new(),
            variables: Vec::new(),
        }
    }
}

/// Modbus RTU 配置块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusRtuConfig {
    pub port: SerialPortSettings,
    pub poll_interval: f64,
    pub slaves: Vec<ModbusSlaveConfig>,
}

impl Default for ModbusRtuConfig {
    fn default() -> Self {
        Self {
            port: SerialPortSettings::default(),
            poll_interval: 1.0,
            slaves: Vec::new(),
        }
    }
}

/// Modbus TCP 终端地址
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusTcpHostSettings {
    /// IP 或主机名
    pub address: String,
    pub port: i64,
    pub autoconnect: bool,
    pub timeout: f64,
}

impl Default for ModbusTcpHostSettings {
    fn default() -> Self {
        Self {
            address: String::new(),
            port: 502,
            autoconnect: true,
            timeout: 1.0,
        }
    }
}

/// Modbus TCP 配置块
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModbusTcpConfig {
    pub host: ModbusTcpHostSettings,
    pub poll_interval: f64,
    pub slaves: Vec<ModbusSlaveConfig>,
}

impl Default for ModbusTcpConfig {
    fn default() -> Self {
        Self {
            host: ModbusTcpHostSettings::default(),
            poll_interval: 1.0,
            slaves: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mbox_defaults_match_backend() {
        let cfg = MboxConfig::default();
        assert_eq!(cfg.mbox_id, 1);
        assert_eq!(cfg.counter_clean_timeout, 6.0);
        assert_eq!(cfg.counter_miss_timeout, 4.0);
        assert_eq!(cfg.miss_error_label, "scales error");
        assert!(!cfg.ext_counter);
        assert_eq!(cfg.counter_pair(), None);
    }

    #[test]
    fn test_reset_counter_fields_restores_defaults() {
        let mut cfg = MboxConfig {
            ext_counter: true,
            counter_connection_id: Some(2),
            counter_device_id: Some(5),
            counter_clean_timeout: 0.3,
            miss_strategy: MissStrategy::Default,
            miss_insert_limit: 9,
            lot: "L-17".to_string(),
            ..MboxConfig::default()
        };
        cfg.reset_counter_fields();

        assert_eq!(cfg.counter_clean_timeout, 6.0);
        assert_eq!(cfg.counter_pair(), None);
        assert_eq!(cfg.miss_strategy, MissStrategy::Last);
        assert_eq!(cfg.miss_insert_limit, 1);
        // 非计数器字段不受影响
        assert_eq!(cfg.lot, "L-17");
        assert!(cfg.ext_counter);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg: EasySerialConfig = serde_json::from_value(serde_json::json!({
            "port": {"port": "COM4"},
            "parser": {"fields": [{"index": 2, "name": "weight", "type": "float"}]}
        }))
        .unwrap();

        assert_eq!(cfg.port.port, "COM4");
        assert_eq!(cfg.port.baudrate, 9600);
        assert_eq!(cfg.parser.separator, ";");
        assert_eq!(cfg.parser.fields[0].kind, ParsedFieldKind::Float);
        assert_eq!(cfg.parser.fields[0].format, None);
    }
}
