use super::*;
use crate::models::SerialPortInfo;

/// 串口发现接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ISerialPortDiscovery: Send + Sync {
    /// 列出主机上当前可用的串口
    async fn list_ports(&self) -> AppResult<Vec<SerialPortInfo>>;
}
