// ==========================================
// 实验室试剂库 - 配置层
// ==========================================
// 职责: 应用配置文件 + 导入配置（config_kv 表）
// ==========================================

pub mod app_config;
pub mod config_manager;
pub mod error;
pub mod import_config_trait;

// 重导出核心配置类型
pub use app_config::{AppConfig, LogFormat};
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use import_config_trait::{ImportConfigReader, ImportSettings};
