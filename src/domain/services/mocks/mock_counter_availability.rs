use super::*;
use crate::models::AvailableCounter;

/// Mock可用计数器来源
///
/// 返回测试设置的固定列表，可选地为每次响应设置不同的延迟，
/// 用于模拟"先发出的请求后返回"
#[derive(Debug, Clone)]
pub struct MockCounterAvailabilitySource {
    base: MockServiceBase,
    entries: Arc<Mutex<Vec<AvailableCounter>>>,
    /// 按调用顺序依次使用的响应（为空时使用 entries）
    scripted: Arc<Mutex<Vec<(std::time::Duration, Vec<AvailableCounter>)>>>,
}

impl MockCounterAvailabilitySource {
    pub fn new(config: MockConfig) -> Self {
        Self {
            base: MockServiceBase::new(config),
            entries: Arc::new(Mutex::new(Vec::new())),
            scripted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_entries(entries: Vec<AvailableCounter>) -> Self {
        let source = Self::new(MockConfig::default());
        source.set_available(entries);
        source
    }

    /// 替换可用列表
    pub fn set_available(&self, entries: Vec<AvailableCounter>) {
        *lock(&self.entries) = entries;
    }

    /// 追加一个带延迟的脚本化响应
    pub fn push_scripted(&self, delay: std::time::Duration, entries: Vec<AvailableCounter>) {
        lock(&self.scripted).push((delay, entries));
    }
}

impl MockService for MockCounterAvailabilitySource {
    fn mock_base(&self) -> &MockServiceBase {
        &self.base
    }
}

#[async_trait]
impl ICounterAvailabilitySource for MockCounterAvailabilitySource {
    async fn list_available(&self) -> AppResult<Vec<AvailableCounter>> {
        self.base.simulate_delay().await;

        let scripted = {
            let mut queue = lock(&self.scripted);
            if queue.is_empty() { None } else { Some(queue.remove(0)) }
        };
        let error = self.base.take_injected_error("list_available");

        let result = match (error, scripted) {
            (Some(error), _) => Err(error),
            (None, Some((delay, entries))) => {
                tokio::time::sleep(delay).await;
                Ok(entries)
            }
            (None, None) => Ok(lock(&self.entries).clone()),
        };

        let summary = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        self.base.record_call("list_available", serde_json::Value::Null, &summary);
        result
    }
}
