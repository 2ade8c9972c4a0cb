//! 串口下拉选项
//!
//! 已保存的串口不在发现结果中时（被其他程序占用或设备已拔出），
//! 以禁用状态注入并标注"使用中"，避免编辑时丢失原有取值。

use crate::models::{PortOption, SerialPortInfo};

const IN_USE_LABEL: &str = "使用中";

/// 根据发现结果与已保存的串口生成选项列表
pub fn port_options(discovered: &[SerialPortInfo], saved_port: Option<&str>) -> Vec<PortOption> {
    let mut options: Vec<PortOption> = discovered
        .iter()
        .map(|info| PortOption {
            name: info.name.clone(),
            label: match info.description.as_deref() {
                Some(desc) if !desc.is_empty() && desc != info.name => format!("{} ({})", info.name, desc),
                _ => info.name.clone(),
            },
            disabled: false,
        })
        .collect();

    if let Some(saved) = saved_port.map(str::trim).filter(|p| !p.is_empty()) {
        if !options.iter().any(|o| o.name == saved) {
            options.insert(
                0,
                PortOption {
                    name: saved.to_string(),
                    label: format!("{} ({})", saved, IN_USE_LABEL),
                    disabled: true,
                },
            );
        }
    }

    options
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(name: &str, description: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_saved_port_missing_is_injected_disabled() {
        let options = port_options(&[port("COM1", Some("USB Serial"))], Some("COM7"));
        assert_eq!(options.len(), 2);
        assert_eq!(options[0].name, "COM7");
        assert!(options[0].disabled);
        assert_eq!(options[0].label, "COM7 (使用中)");
        assert_eq!(options[1].label, "COM1 (USB Serial)");
        assert!(!options[1].disabled);
    }

    #[test]
    fn test_saved_port_present_or_empty_not_injected() {
        let discovered = [port("COM1", None), port("COM2", Some("COM2"))];
        assert_eq!(port_options(&discovered, Some("COM2")).len(), 2);
        assert_eq!(port_options(&discovered, Some("")).len(), 2);
        assert_eq!(port_options(&discovered, None)[1].label, "COM2");
    }
}
