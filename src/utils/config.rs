use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::models::enums::LoggerType;
use crate::utils::error::{AppError, AppResult};

/// 环境变量前缀，例如 `LOGGER_EDITOR__EDITOR__DRAFT_DEBOUNCE_MS=300`
const ENV_PREFIX: &str = "LOGGER_EDITOR";

/// 应用程序主配置结构
/// 包含编辑器运行所需的所有配置信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// 应用程序基本设置
    pub app_settings: AppSettings,
    /// 编辑会话配置
    pub editor: EditorConfig,
    /// 日志配置
    pub logging_config: LoggingConfig,
    /// 记录存储配置
    pub persistence: PersistenceConfig,
}

/// 应用程序基本设置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    /// 应用程序名称
    pub app_name: String,
    /// 应用程序版本
    pub app_version: String,
    /// 运行环境 (development, testing, production)
    pub environment: String,
}

/// 编辑会话配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    /// 草稿写入的静默期（毫秒）
    pub draft_debounce_ms: u64,
    /// 新建会话与草稿种子使用的日志器类型
    pub default_logger_type: LoggerType,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// 日志级别 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 是否启用控制台输出
    pub console_output: bool,
}

/// 记录存储配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// 日志器记录所在的JSON设置文件
    pub records_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_settings: AppSettings::default(),
            editor: EditorConfig::default(),
            logging_config: LoggingConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            app_name: "LoggerEditor".to_string(),
            app_version: "0.1.0".to_string(),
            environment: "development".to_string(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            draft_debounce_ms: 500,
            default_logger_type: LoggerType::EasySerial,
        }
    }
}

impl EditorConfig {
    /// 草稿防抖时长
    pub fn draft_debounce(&self) -> Duration {
        Duration::from_millis(self.draft_debounce_ms)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            console_output: true,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            records_path: PathBuf::from("data/settings.json"),
        }
    }
}

/// 配置管理器
/// 负责按 默认值 → 配置文件 → 环境变量 的顺序叠加配置
pub struct ConfigManager {
    config: AppConfig,
    config_file_path: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建新的配置管理器
    pub fn new(config_file_path: Option<PathBuf>) -> Self {
        Self {
            config: AppConfig::default(),
            config_file_path,
        }
    }

    /// 加载配置（文件不存在时只使用默认值和环境变量）
    pub fn load(&mut self) -> AppResult<()> {
        let defaults = config::Config::try_from(&AppConfig::default())?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = &self.config_file_path {
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        self.config = builder
            .build()?
            .try_deserialize()
            .map_err(|e| AppError::configuration_error(format!("解析配置失败: {}", e)))?;

        Ok(())
    }

    /// 获取配置的只读引用
    pub fn get_config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取配置的可变引用
    pub fn get_config_mut(&mut self) -> &mut AppConfig {
        &mut self.config
    }

    /// 验证配置的有效性
    pub fn validate_config(&self) -> AppResult<()> {
        if self.config.editor.draft_debounce_ms == 0 {
            return Err(AppError::configuration_error("草稿防抖时间不能为0"));
        }

        if self.config.persistence.records_path.as_os_str().is_empty() {
            return Err(AppError::configuration_error("记录文件路径不能为空"));
        }

        if self.config.editor.draft_debounce_ms > 5_000 {
            crate::log_config_warning!(
                "草稿防抖时间 {}ms 过长，关闭编辑器时可能丢失较多输入",
                self.config.editor.draft_debounce_ms
            );
        }

        let valid_environments = ["development", "testing", "production"];
        if !valid_environments.contains(&self.config.app_settings.environment.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的环境配置: {}，有效值: {:?}",
                self.config.app_settings.environment, valid_environments
            )));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging_config.log_level.as_str()) {
            return Err(AppError::configuration_error(format!(
                "无效的日志级别: {}，有效值: {:?}",
                self.config.logging_config.log_level, valid_log_levels
            )));
        }

        Ok(())
    }

    /// 重置为默认配置
    pub fn reset_to_default(&mut self) {
        self.config = AppConfig::default();
    }
}

/// 加载并校验应用配置
///
/// 未指定路径时使用 `config/logger_editor.json`，文件不存在时只使用默认值和环境变量
pub fn load_app_config(config_path: Option<&Path>) -> AppResult<AppConfig> {
    let config_path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("config/logger_editor.json"));
    let mut config_manager = ConfigManager::new(Some(config_path));

    config_manager.load()?;
    config_manager.validate_config()?;
    Ok(config_manager.get_config().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    /// 测试默认配置
    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.app_settings.app_name, "LoggerEditor");
        assert_eq!(config.editor.draft_debounce_ms, 500);
        assert_eq!(config.editor.default_logger_type, LoggerType::EasySerial);
        assert_eq!(config.editor.draft_debounce(), Duration::from_millis(500));
        assert_eq!(config.logging_config.log_level, "info");
    }

    /// 测试配置文件覆盖默认值，未出现的字段保持默认
    #[test]
    fn test_load_overrides_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("editor.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"editor": {{"draft_debounce_ms": 250, "default_logger_type": "mbox"}}}}"#
        )
        .unwrap();

        let mut manager = ConfigManager::new(Some(path));
        manager.load().unwrap();

        let config = manager.get_config();
        assert_eq!(config.editor.draft_debounce_ms, 250);
        assert_eq!(config.editor.default_logger_type, LoggerType::Mbox);
        assert_eq!(config.persistence.records_path, PathBuf::from("data/settings.json"));
        assert!(manager.validate_config().is_ok());
    }

    /// 测试缺失的配置文件不会报错
    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let mut manager = ConfigManager::new(Some(PathBuf::from("/nonexistent/editor.json")));
        manager.load().unwrap();
        assert_eq!(manager.get_config().editor, EditorConfig::default());
    }

    /// 测试配置校验
    #[test]
    fn test_validate_config_rejects_bad_values() {
        let mut manager = ConfigManager::new(None);
        manager.get_config_mut().editor.draft_debounce_ms = 0;
        let err = manager.validate_config().unwrap_err();
        assert_eq!(err.error_code(), "CONFIGURATION_ERROR");

        manager.reset_to_default();
        manager.get_config_mut().logging_config.log_level = "verbose".to_string();
        assert!(manager.validate_config().is_err());
    }

    /// 测试加载入口会执行校验
    #[test]
    fn test_load_app_config_validates() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("good.json");
        std::fs::write(&good, r#"{"persistence": {"records_path": "/tmp/records.json"}}"#).unwrap();
        let config = load_app_config(Some(&good)).unwrap();
        assert_eq!(config.persistence.records_path, PathBuf::from("/tmp/records.json"));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"editor": {"draft_debounce_ms": 0}}"#).unwrap();
        assert_eq!(load_app_config(Some(&bad)).unwrap_err().error_code(), "CONFIGURATION_ERROR");
    }
}
