// ==========================================
// 实验室试剂库 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {message}")]
    FileReadError { path: String, message: String },

    #[error("Failed to write config file {path}: {message}")]
    FileWriteError { path: String, message: String },

    #[error("Invalid config file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Config database error: {0}")]
    DatabaseError(String),

    #[error("Config lock failed: {0}")]
    LockError(String),

    #[error("Invalid config value (key: {key}, value: {value})")]
    InvalidValue { key: String, value: String },

    #[error("Unknown config key: {0}")]
    UnknownKey(String),
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::DatabaseError(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
