//! 规则表
//!
//! 公共规则对所有类型生效，类型规则通过注册表中的规则工厂挂到对应类型上。
//! 字段路径以类型标识为前缀，例如 `mbox.counter_device_id`、
//! `modbus_rtu.slaves[0].variables[1].address`。

use super::{Check, FieldRule, FieldValue, SiblingCondition};
use crate::models::{FormValues, ModbusSlaveConfig, TypeConfig, MissStrategy};

fn counter_device_id(v: &FormValues) -> Vec<(String, FieldValue)> {
    v.config
        .as_mbox()
        .map(|m| vec![("mbox.counter_device_id".to_string(), FieldValue::Int(m.counter_device_id))])
        .unwrap_or_default()
}

fn db_write_enabled(v: &FormValues) -> bool {
    v.enabled
}

fn ext_counter_enabled(v: &FormValues) -> bool {
    v.config.as_mbox().map_or(false, |m| m.ext_counter)
}

/// 数据库写入开关
pub const DB_WRITE_ENABLED: SiblingCondition = SiblingCondition {
    sibling: "enabled",
    holds: db_write_enabled,
};

/// MBox 外部计数器开关
pub const EXT_COUNTER_ENABLED: SiblingCondition = SiblingCondition {
    sibling: "mbox.ext_counter",
    holds: ext_counter_enabled,
};

fn text(path: &str, value: &str) -> Vec<(String, FieldValue)> {
    vec![(path.to_string(), FieldValue::Text(value.to_string()))]
}

/// 所有类型共用的规则
pub fn common_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("name", |v| text("name", &v.name))
            .check(Check::Required)
            .message("请输入名称"),
        FieldRule::new("db_user", |v| text("db_user", &v.db_user))
            .when(DB_WRITE_ENABLED)
            .check(Check::Required)
            .message("启用数据库写入时必须填写数据库用户"),
        FieldRule::new("db_password", |v| text("db_password", &v.db_password))
            .when(DB_WRITE_ENABLED)
            .check(Check::Required)
            .message("启用数据库写入时必须填写数据库密码"),
        FieldRule::new("table_name", |v| text("table_name", &v.table_name))
            .when(DB_WRITE_ENABLED)
            .check(Check::Required)
            .message("启用数据库写入时必须填写表名"),
        FieldRule::new("query_template", |v| text("query_template", &v.query_template))
            .check(Check::QueryTemplate),
    ]
}

/// 串口参数规则（所有串口类类型共用）
fn serial_port_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("port.port", |v| {
            v.config
                .serial_port()
                .map(|p| text(&format!("{}.port.port", v.logger_type()), &p.port))
                .unwrap_or_default()
        })
        .check(Check::Required)
        .message("请选择串口"),
        FieldRule::new("port.baudrate", |v| {
            v.config
                .serial_port()
                .map(|p| {
                    vec![(
                        format!("{}.port.baudrate", v.logger_type()),
                        FieldValue::Int(Some(p.baudrate as i64)),
                    )]
                })
                .unwrap_or_default()
        })
        .check(Check::PositiveInteger),
        FieldRule::new("port.timeout", |v| {
            v.config
                .serial_port()
                .map(|p| {
                    vec![(format!("{}.port.timeout", v.logger_type()), FieldValue::Float(p.timeout))]
                })
                .unwrap_or_default()
        })
        .check(Check::GreaterThan(0.0)),
    ]
}

fn poll_interval_rule() -> FieldRule {
    FieldRule::new("poll_interval", |v| {
        let interval = match &v.config {
            TypeConfig::MboxCounter(cfg) => cfg.poll_interval,
            TypeConfig::ModbusRtu(cfg) => cfg.poll_interval,
            TypeConfig::ModbusTcp(cfg) => cfg.poll_interval,
            _ => return Vec::new(),
        };
        vec![(format!("{}.poll_interval", v.logger_type()), FieldValue::Float(interval))]
    })
    .check(Check::GreaterThan(0.0))
}

/// Easy Serial 规则
pub fn easy_serial_rules() -> Vec<FieldRule> {
    fn fields(v: &FormValues) -> &[crate::models::ParsedFieldConfig] {
        v.config.as_easy_serial().map(|c| c.parser.fields.as_slice()).unwrap_or(&[])
    }

    let mut rules = serial_port_rules();
    rules.extend([
        FieldRule::new("easy_serial.parser.terminator", |v| {
            v.config
                .as_easy_serial()
                .map(|c| text("easy_serial.parser.terminator", &c.parser.terminator))
                .unwrap_or_default()
        })
        .check(Check::NotEmpty),
        FieldRule::new("easy_serial.parser.separator", |v| {
            v.config
                .as_easy_serial()
                .map(|c| text("easy_serial.parser.separator", &c.parser.separator))
                .unwrap_or_default()
        })
        .check(Check::NotEmpty),
        FieldRule::new("easy_serial.parser.fields[].name", |v| {
            fields(v)
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    (format!("easy_serial.parser.fields[{}].name", i), FieldValue::Text(f.name.clone()))
                })
                .collect()
        })
        .check(Check::Required)
        .message("请输入字段名"),
        FieldRule::new("easy_serial.parser.fields[].index", |v| {
            fields(v)
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    (format!("easy_serial.parser.fields[{}].index", i), FieldValue::Int(Some(f.index)))
                })
                .collect()
        })
        .check(Check::NonNegativeInteger),
        FieldRule::new("easy_serial.parser.fields[].format", |v| {
            fields(v)
                .iter()
                .enumerate()
                .filter(|(_, f)| f.kind.requires_format())
                .map(|(i, f)| {
                    (
                        format!("easy_serial.parser.fields[{}].format", i),
                        FieldValue::Text(f.format.clone().unwrap_or_default()),
                    )
                })
                .collect()
        })
        .check(Check::Required)
        .message("日期时间类字段必须填写格式"),
    ]);
    rules
}

/// MBox 规则（含外部计数器组）
pub fn mbox_rules() -> Vec<FieldRule> {
    fn mbox_float(v: &FormValues, field: &str, get: fn(&crate::models::MboxConfig) -> f64) -> Vec<(String, FieldValue)> {
        v.config
            .as_mbox()
            .map(|m| vec![(format!("mbox.{}", field), FieldValue::Float(get(m)))])
            .unwrap_or_default()
    }

    let mut rules = serial_port_rules();
    rules.extend([
        FieldRule::new("mbox.mbox_id", |v| {
            v.config
                .as_mbox()
                .map(|m| vec![("mbox.mbox_id".to_string(), FieldValue::Int(Some(m.mbox_id)))])
                .unwrap_or_default()
        })
        .check(Check::PositiveInteger),
        FieldRule::new("mbox.counter_connection_id", |v| {
            v.config
                .as_mbox()
                .map(|m| vec![("mbox.counter_connection_id".to_string(), FieldValue::Int(m.counter_connection_id))])
                .unwrap_or_default()
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::Required)
        .message("请选择计数器连接"),
        FieldRule::new("mbox.counter_device_id", counter_device_id)
            .when(EXT_COUNTER_ENABLED)
            .check(Check::Required)
            .message("请选择计数器设备"),
        FieldRule::new("mbox.counter_device_id", counter_device_id)
            .when(EXT_COUNTER_ENABLED)
            .check(Check::PositiveInteger),
        FieldRule::new("mbox.counter_clean_timeout", |v| {
            mbox_float(v, "counter_clean_timeout", |m| m.counter_clean_timeout)
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::AtLeast(0.1))
        .check(Check::MaxDecimals(2)),
        FieldRule::new("mbox.counter_miss_timeout", |v| {
            mbox_float(v, "counter_miss_timeout", |m| m.counter_miss_timeout)
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::AtLeast(0.1))
        .check(Check::MaxDecimals(2)),
        FieldRule::new("mbox.miss_strategy", |v| {
            v.config
                .as_mbox()
                .map(|m| text("mbox.miss_strategy", m.miss_strategy.as_str()))
                .unwrap_or_default()
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::OneOf(&MissStrategy::VALUES)),
        FieldRule::new("mbox.miss_insert_limit", |v| {
            v.config
                .as_mbox()
                .map(|m| vec![("mbox.miss_insert_limit".to_string(), FieldValue::Int(Some(m.miss_insert_limit)))])
                .unwrap_or_default()
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::PositiveInteger),
        FieldRule::new("mbox.miss_error_label", |v| {
            v.config
                .as_mbox()
                .map(|m| text("mbox.miss_error_label", &m.miss_error_label))
                .unwrap_or_default()
        })
        .when(EXT_COUNTER_ENABLED)
        .check(Check::Required),
    ]);
    rules
}

/// MBox 计数器规则
pub fn mbox_counter_rules() -> Vec<FieldRule> {
    fn devices(v: &FormValues) -> &[crate::models::CounterDeviceConfig] {
        v.config.as_mbox_counter().map(|c| c.devices.as_slice()).unwrap_or(&[])
    }

    let mut rules = serial_port_rules();
    rules.push(poll_interval_rule());
    rules.extend([
        FieldRule::new("mbox_counter.devices[].device_id", |v| {
            devices(v)
                .iter()
                .enumerate()
                .map(|(i, d)| (format!("mbox_counter.devices[{}].device_id", i), FieldValue::Int(Some(d.device_id))))
                .collect()
        })
        .check(Check::PositiveInteger),
        FieldRule::new("mbox_counter.devices[].name", |v| {
            devices(v)
                .iter()
                .enumerate()
                .map(|(i, d)| (format!("mbox_counter.devices[{}].name", i), FieldValue::Text(d.name.clone())))
                .collect()
        })
        .check(Check::Required)
        .message("请输入设备名称"),
        FieldRule::new("mbox_counter.devices[].serial", |v| {
            devices(v)
                .iter()
                .enumerate()
                .map(|(i, d)| (format!("mbox_counter.devices[{}].serial", i), FieldValue::Int(Some(d.serial))))
                .collect()
        })
        .check(Check::IntegerRange { min: 0, max: 65535 }),
    ]);
    rules
}

fn modbus_slaves(v: &FormValues) -> &[ModbusSlaveConfig] {
    match &v.config {
        TypeConfig::ModbusRtu(cfg) => &cfg.slaves,
        TypeConfig::ModbusTcp(cfg) => &cfg.slaves,
        _ => &[],
    }
}

fn modbus_slave_rules() -> Vec<FieldRule> {
    vec![
        FieldRule::new("slaves[].slave_id", |v| {
            let prefix = v.logger_type();
            modbus_slaves(v)
                .iter()
                .enumerate()
                .map(|(i, s)| (format!("{}.slaves[{}].slave_id", prefix, i), FieldValue::Int(Some(s.slave_id))))
                .collect()
        })
        .check(Check::IntegerRange { min: 1, max: 247 }),
        FieldRule::new("slaves[].variables[].name", |v| {
            let prefix = v.logger_type();
            modbus_slaves(v)
                .iter()
                .enumerate()
                .flat_map(|(i, s)| {
                    s.variables.iter().enumerate().map(move |(j, var)| {
                        (
                            format!("{}.slaves[{}].variables[{}].name", prefix, i, j),
                            FieldValue::Text(var.name.clone()),
                        )
                    })
                })
                .collect()
        })
        .check(Check::Required)
        .message("请输入变量名"),
        FieldRule::new("slaves[].variables[].address", |v| {
            let prefix = v.logger_type();
            modbus_slaves(v)
                .iter()
                .enumerate()
                .flat_map(|(i, s)| {
                    s.variables.iter().enumerate().map(move |(j, var)| {
                        (
                            format!("{}.slaves[{}].variables[{}].address", prefix, i, j),
                            FieldValue::Int(Some(var.address)),
                        )
                    })
                })
                .collect()
        })
        .check(Check::IntegerRange { min: 0, max: 65535 }),
    ]
}

/// Modbus RTU 规则
pub fn modbus_rtu_rules() -> Vec<FieldRule> {
    let mut rules = serial_port_rules();
    rules.push(poll_interval_rule());
    rules.extend(modbus_slave_rules());
    rules
}

/// Modbus TCP 规则
pub fn modbus_tcp_rules() -> Vec<FieldRule> {
    let mut rules = vec![
        FieldRule::new("modbus_tcp.host.address", |v| match &v.config {
            TypeConfig::ModbusTcp(cfg) => text("modbus_tcp.host.address", &cfg.host.address),
            _ => Vec::new(),
        })
        .check(Check::Required)
        .message("请输入主机地址"),
        FieldRule::new("modbus_tcp.host.port", |v| match &v.config {
            TypeConfig::ModbusTcp(cfg) => {
                vec![("modbus_tcp.host.port".to_string(), FieldValue::Int(Some(cfg.host.port)))]
            }
            _ => Vec::new(),
        })
        .check(Check::IntegerRange { min: 1, max: 65535 }),
        poll_interval_rule(),
    ];
    rules.extend(modbus_slave_rules());
    rules
}

#[cfg(test)]
mod tests {
    use super::super::{clear_dependent_errors, evaluate, validate_form};
    use super::*;
    use crate::domain::form_mapper::wire_to_session;
    use crate::domain::registry::{build_default_record, LoggerTypeRegistry};
    use crate::models::{LoggerType, ModbusVariableConfig, ParsedFieldConfig, ParsedFieldKind};

    fn defaults(t: LoggerType) -> FormValues {
        let (mut values, _) = wire_to_session(&build_default_record(t).unwrap());
        values.name = "Logger".to_string();
        if let Some(port) = values.config.serial_port_mut() {
            port.port = "COM1".to_string();
        }
        values
    }

    #[test]
    fn test_db_group_follows_enabled() {
        let mut values = defaults(LoggerType::EasySerial);
        let registry = LoggerTypeRegistry::global();
        assert!(validate_form(&values, registry).unwrap().is_empty());

        values.enabled = true;
        let errors = validate_form(&values, registry).unwrap();
        assert!(errors.contains_key("db_user"));
        assert!(errors.contains_key("db_password"));
        assert!(errors.contains_key("table_name"));

        values.db_user = "writer".to_string();
        values.db_password = "secret".to_string();
        values.table_name = "weights".to_string();
        assert!(validate_form(&values, registry).unwrap().is_empty());
    }

    #[test]
    fn test_ext_counter_group_only_when_enabled() {
        let mut values = defaults(LoggerType::Mbox);
        let registry = LoggerTypeRegistry::global();
        assert!(validate_form(&values, registry).unwrap().is_empty());

        let mbox = values.config.as_mbox_mut().unwrap();
        mbox.ext_counter = true;
        mbox.counter_clean_timeout = 0.155;
        mbox.counter_miss_timeout = 0.05;
        mbox.miss_insert_limit = 0;
        mbox.miss_error_label = " ".to_string();

        let errors = validate_form(&values, registry).unwrap();
        assert_eq!(errors.get("mbox.counter_connection_id").unwrap(), "请选择计数器连接");
        assert_eq!(errors.get("mbox.counter_device_id").unwrap(), "请选择计数器设备");
        assert!(errors.get("mbox.counter_clean_timeout").unwrap().contains("2 位小数"));
        assert!(errors.contains_key("mbox.counter_miss_timeout"));
        assert!(errors.contains_key("mbox.miss_insert_limit"));
        assert!(errors.contains_key("mbox.miss_error_label"));

        let mut cleared = errors.clone();
        clear_dependent_errors(&mut cleared, &mbox_rules(), "mbox.ext_counter");
        assert!(cleared.is_empty());
    }

    #[test]
    fn test_counter_device_messages() {
        let mut values = defaults(LoggerType::Mbox);
        let registry = LoggerTypeRegistry::global();
        let mbox = values.config.as_mbox_mut().unwrap();
        mbox.ext_counter = true;
        mbox.counter_connection_id = Some(1);
        mbox.counter_device_id = Some(0);

        let errors = validate_form(&values, registry).unwrap();
        assert_eq!(errors.get("mbox.counter_device_id").unwrap(), "必须为正整数");

        values.config.as_mbox_mut().unwrap().counter_device_id = Some(3);
        assert!(!validate_form(&values, registry).unwrap().contains_key("mbox.counter_device_id"));
    }

    #[test]
    fn test_easy_serial_row_rules() {
        let mut values = defaults(LoggerType::EasySerial);
        if let TypeConfig::EasySerial(cfg) = &mut values.config {
            cfg.parser.fields = vec![
                ParsedFieldConfig { index: 0, name: "weight".into(), kind: ParsedFieldKind::Float, format: None },
                ParsedFieldConfig { index: -1, name: "".into(), kind: ParsedFieldKind::Datetime, format: None },
            ];
            cfg.parser.separator = String::new();
        }

        let errors = evaluate(&values, &easy_serial_rules());
        assert!(errors.contains_key("easy_serial.parser.separator"));
        assert!(errors.contains_key("easy_serial.parser.fields[1].name"));
        assert!(errors.contains_key("easy_serial.parser.fields[1].index"));
        assert!(errors.contains_key("easy_serial.parser.fields[1].format"));
        assert!(!errors.keys().any(|k| k.starts_with("easy_serial.parser.fields[0]")));
    }

    #[test]
    fn test_modbus_rules_share_numeric_checks() {
        let mut values = defaults(LoggerType::ModbusTcp);
        if let TypeConfig::ModbusTcp(cfg) = &mut values.config {
            cfg.host.port = 70000;
            cfg.poll_interval = 0.0;
            cfg.slaves = vec![ModbusSlaveConfig {
                slave_id: 0,
                slave_name: "PLC".into(),
                variables: vec![ModbusVariableConfig { name: "flow".into(), address: -3, ..Default::default() }],
            }];
        }

        let errors = validate_form(&values, LoggerTypeRegistry::global()).unwrap();
        assert!(errors.contains_key("modbus_tcp.host.address"));
        assert!(errors.contains_key("modbus_tcp.host.port"));
        assert!(errors.contains_key("modbus_tcp.poll_interval"));
        assert!(errors.contains_key("modbus_tcp.slaves[0].slave_id"));
        assert!(errors.contains_key("modbus_tcp.slaves[0].variables[0].address"));
        assert!(!errors.contains_key("modbus_tcp.slaves[0].variables[0].name"));
    }

    #[test]
    fn test_invalid_query_template_reported() {
        let mut values = defaults(LoggerType::Mbox);
        values.query_template = "INSERT INTO t VALUES ({a)".to_string();
        let errors = validate_form(&values, LoggerTypeRegistry::global()).unwrap();
        assert!(errors.contains_key("query_template"));
    }
}
