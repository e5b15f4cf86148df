// ==========================================
// 实验室试剂库 - 应用配置文件
// ==========================================
// 存储: app_config.json（缺失字段使用默认值）
// 覆写: 环境变量 REAGENT_DB_PATH 优先于文件中的 db_path
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "reagent-db";
pub const CONFIG_FILE_NAME: &str = "app_config.json";
pub const DB_PATH_ENV: &str = "REAGENT_DB_PATH";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub db_path: String,
    pub upload_folder: PathBuf,
    pub export_folder: PathBuf,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        let base = default_data_dir();
        Self {
            db_path: base.join("reagent.db").to_string_lossy().to_string(),
            upload_folder: base.join("uploads"),
            export_folder: base.join("exports"),
            log_format: LogFormat::default(),
        }
    }
}

impl AppConfig {
    /// 读取配置文件
    ///
    /// # 参数
    /// - path: 显式路径；None 时使用用户配置目录下的 app_config.json
    ///
    /// # 返回
    /// - 文件不存在时返回默认配置（同样应用环境变量覆写）
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
            serde_json::from_str::<AppConfig>(&content)?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 写入配置文件（自动创建父目录）
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |e: std::io::Error| ConfigError::FileWriteError {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(write_err)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(write_err)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                self.db_path = trimmed.to_string();
            }
        }
    }
}

/// 默认数据目录: 用户数据目录/reagent-db（取不到时回退到当前目录）
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
}

pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(".").join(APP_DIR_NAME))
        .join(CONFIG_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "log_format": "json" }"#).unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.upload_folder, AppConfig::default().upload_folder);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE_NAME);
        let config = AppConfig {
            db_path: dir.path().join("lab.db").to_string_lossy().to_string(),
            upload_folder: dir.path().join("up"),
            export_folder: dir.path().join("out"),
            log_format: LogFormat::Pretty,
        };

        config.save(&path).unwrap();
        let loaded = AppConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded.upload_folder, config.upload_folder);
        assert_eq!(loaded.export_folder, config.export_folder);
    }

    #[test]
    fn test_invalid_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            AppConfig::load(Some(&path)),
            Err(ConfigError::ParseError(_))
        ));
    }
}
