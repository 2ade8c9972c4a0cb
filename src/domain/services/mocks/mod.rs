//! Mock服务实现
//!
//! 用于集成测试的Mock协作者：内存记录存储、可配置的可用计数器列表、
//! 可取消的解析器测试、固定的串口列表以及记录通知的通知器

pub mod mock_record_store;
pub mod mock_counter_availability;
pub mod mock_parser_tester;
pub mod mock_serial_port_discovery;
pub mod mock_notifier;
pub mod test_data_generator;

// 重新导出所有Mock实现
pub use mock_counter_availability::*;
pub use mock_notifier::*;
pub use mock_parser_tester::*;
pub use mock_record_store::*;
pub use mock_serial_port_discovery::*;
pub use test_data_generator::*;

use super::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::utils::error::AppError;

/// Mock配置
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// 是否启用延迟模拟
    pub enable_delay_simulation: bool,

    /// 基础延迟时间（毫秒）
    pub base_delay_ms: u64,

    /// 随机延迟范围（毫秒）
    pub random_delay_range_ms: u64,

    /// 错误注入概率（0.0-1.0）
    pub error_injection_probability: f64,

    /// 是否记录调用历史
    pub record_call_history: bool,

    /// 最大调用历史记录数
    pub max_call_history: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            enable_delay_simulation: false,
            base_delay_ms: 10,
            random_delay_range_ms: 50,
            error_injection_probability: 0.0,
            record_call_history: true,
            max_call_history: 1000,
        }
    }
}

/// 调用记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRecord {
    /// 调用ID
    pub call_id: String,

    /// 方法名
    pub method_name: String,

    /// 参数（序列化为JSON）
    pub parameters: serde_json::Value,

    /// 调用时间
    pub timestamp: DateTime<Utc>,

    /// 是否成功
    pub success: bool,

    /// 错误信息（如果失败）
    pub error_message: Option<String>,
}

/// 获取互斥锁，锁中毒时继续使用内部数据
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock服务基础实现
///
/// 负责延迟模拟、错误注入和调用历史
#[derive(Debug, Clone)]
pub struct MockServiceBase {
    config: MockConfig,
    call_history: Arc<Mutex<Vec<CallRecord>>>,
    /// 下一次调用固定返回的错误
    fail_next: Arc<Mutex<Option<AppError>>>,
}

impl MockServiceBase {
    pub fn new(config: MockConfig) -> Self {
        Self {
            config,
            call_history: Arc::new(Mutex::new(Vec::new())),
            fail_next: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_default_config() -> Self {
        Self::new(MockConfig::default())
    }

    pub fn get_mock_config(&self) -> &MockConfig {
        &self.config
    }

    pub fn get_call_history(&self) -> Vec<CallRecord> {
        lock(&self.call_history).clone()
    }

    pub fn clear_call_history(&self) {
        lock(&self.call_history).clear();
    }

    /// 某个方法被调用的次数
    pub fn call_count(&self, method_name: &str) -> usize {
        lock(&self.call_history)
            .iter()
            .filter(|r| r.method_name == method_name)
            .count()
    }

    /// 让下一次调用返回指定错误
    pub fn fail_next_with(&self, error: AppError) {
        *lock(&self.fail_next) = Some(error);
    }

    /// 记录方法调用
    pub fn record_call(&self, method_name: &str, parameters: serde_json::Value, result: &Result<(), String>) {
        if !self.config.record_call_history {
            return;
        }

        let mut history = lock(&self.call_history);
        history.push(CallRecord {
            call_id: uuid::Uuid::new_v4().to_string(),
            method_name: method_name.to_string(),
            parameters,
            timestamp: Utc::now(),
            success: result.is_ok(),
            error_message: result.as_ref().err().cloned(),
        });

        // 限制历史记录数量
        if history.len() > self.config.max_call_history {
            history.remove(0);
        }
    }

    /// 模拟延迟
    pub async fn simulate_delay(&self) {
        if self.config.enable_delay_simulation {
            let base_delay = self.config.base_delay_ms;
            let random_range = self.config.random_delay_range_ms;

            let delay = if random_range > 0 {
                base_delay + (rand::random::<u64>() % random_range)
            } else {
                base_delay
            };

            tokio::time::sleep(tokio::time::Duration::from_millis(delay)).await;
        }
    }

    /// 取出本次调用应返回的错误（固定错误优先，其次按概率注入）
    pub fn take_injected_error(&self, method_name: &str) -> Option<AppError> {
        if let Some(error) = lock(&self.fail_next).take() {
            return Some(error);
        }

        let probability = self.config.error_injection_probability;
        let inject = if probability <= 0.0 {
            false
        } else if probability >= 1.0 {
            true
        } else {
            rand::random::<f64>() < probability
        };
        inject.then(|| AppError::MockError(format!("{} 注入的错误", method_name)))
    }
}

/// Mock服务通用能力
pub trait MockService {
    fn mock_base(&self) -> &MockServiceBase;

    fn get_call_history(&self) -> Vec<CallRecord> {
        self.mock_base().get_call_history()
    }

    fn call_count(&self, method_name: &str) -> usize {
        self.mock_base().call_count(method_name)
    }

    fn fail_next_with(&self, error: AppError) {
        self.mock_base().fail_next_with(error);
    }
}
