// 应用程序主入口
//
// 加载分层配置并初始化日志，打开JSON记录存储，输出已保存的日志器概览

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use logger_editor_lib::domain::services::{BaseService, ICounterAvailabilitySource, IRecordStore};
use logger_editor_lib::logging::{init_logging, mask_secret};
use logger_editor_lib::utils::load_app_config;
use logger_editor_lib::{JsonRecordStore, LocalCounterAvailability, LoggerTypeRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = load_app_config(config_path.as_deref()).context("加载配置失败")?;
    init_logging(&config.logging_config).context("初始化日志失败")?;

    log::info!(
        "{} v{} ({})",
        config.app_settings.app_name,
        config.app_settings.app_version,
        config.app_settings.environment
    );

    let mut store = JsonRecordStore::from_config(&config.persistence);
    store.initialize().await.context("打开记录存储失败")?;
    let store = Arc::new(store);

    let registry = LoggerTypeRegistry::global();
    let records = store.list().await?;
    println!("设置文件: {}", store.path().display());
    println!("已保存的日志器: {}", records.len());
    for record in &records {
        let label = registry
            .descriptor(record.logger_type())
            .map(|d| d.label)
            .unwrap_or("未知类型");
        let db = match (&record.db_user, record.enabled) {
            (Some(user), true) => format!("写库: {}@{}", mask_secret(user), record.table_name.as_deref().unwrap_or("-")),
            _ => "不写库".to_string(),
        };
        println!(
            "  #{:<4} {:<24} {:<16} {}{}",
            record.id.unwrap_or_default(),
            record.name,
            label,
            db,
            if record.autostart { " [自动启动]" } else { "" }
        );
    }

    let counters = LocalCounterAvailability::new(store.clone()).list_available().await?;
    println!("可用计数器设备: {}", counters.len());
    for counter in &counters {
        println!(
            "  {} / {} (serial {})",
            counter.connection_name, counter.device_name, counter.serial
        );
    }

    Ok(())
}
