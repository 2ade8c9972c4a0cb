use super::*;
use crate::models::SerialPortInfo;

/// Mock串口发现
#[derive(Debug, Clone)]
pub struct MockSerialPortDiscovery {
    base: MockServiceBase,
    ports: Arc<Mutex<Vec<SerialPortInfo>>>,
}

impl MockSerialPortDiscovery {
    pub fn with_ports(names: &[&str]) -> Self {
        Self {
            base: MockServiceBase::with_default_config(),
            ports: Arc::new(Mutex::new(
                names
                    .iter()
                    .map(|name| SerialPortInfo { name: name.to_string(), description: None })
                    .collect(),
            )),
        }
    }
}

impl MockService for MockSerialPortDiscovery {
    fn mock_base(&self) -> &MockServiceBase {
        &self.base
    }
}

#[async_trait]
impl ISerialPortDiscovery for MockSerialPortDiscovery {
    async fn list_ports(&self) -> AppResult<Vec<SerialPortInfo>> {
        self.base.simulate_delay().await;
        let result = match self.base.take_injected_error("list_ports") {
            Some(error) => Err(error),
            None => Ok(lock(&self.ports).clone()),
        };
        let summary = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        self.base.record_call("list_ports", serde_json::Value::Null, &summary);
        result
    }
}
