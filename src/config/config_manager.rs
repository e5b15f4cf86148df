// ==========================================
// 实验室试剂库 - 配置管理器
// ==========================================
// 职责: 导入相关配置的查询与覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::{ImportConfigReader, ImportSettings};
use crate::db::{apply_position_uniqueness, configure_sqlite_connection};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let conn_guard = conn
                .lock()
                .map_err(|e| ConfigError::LockError(e.to_string()))?;
            configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global 配置（已知键会先校验取值格式）
    ///
    /// 说明：import.unique_positions 会同时建/删唯一索引，见 set_unique_positions
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        match config_keys::kind_of(key) {
            Some(config_keys::ValueKind::Bool) => {
                let enabled = parse_bool(key, value)?;
                if key == config_keys::UNIQUE_POSITIONS {
                    return self.set_unique_positions(enabled);
                }
            }
            Some(config_keys::ValueKind::Count) => {
                parse_count(key, value)?;
            }
            None => return Err(ConfigError::UnknownKey(key.to_string())),
        }

        let conn = self.get_conn()?;
        upsert_global(&conn, key, value)?;
        Ok(())
    }

    /// 开启/关闭位置唯一约束并保存配置
    ///
    /// 说明：
    /// - 建/删索引与写 config_kv 在同一事务内
    /// - 已有重复位置时建索引失败，配置保持原值
    pub fn set_unique_positions(&self, enabled: bool) -> ConfigResult<()> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        apply_position_uniqueness(&tx, enabled)?;
        upsert_global(
            &tx,
            config_keys::UNIQUE_POSITIONS,
            if enabled { "true" } else { "false" },
        )?;
        tx.commit()?;

        info!(enabled, "位置唯一约束配置已更新");
        Ok(())
    }

    /// 列出全部 global 配置（按 key 排序）
    pub fn list_global_configs(&self) -> ConfigResult<Vec<(String, String)>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut configs = Vec::new();
        for row in rows {
            configs.push(row?);
        }
        Ok(configs)
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> ConfigResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    pub fn validate_orf_references(&self) -> ConfigResult<bool> {
        let raw = self.get_config_or_default(config_keys::VALIDATE_ORF_REFERENCES, "false")?;
        parse_bool(config_keys::VALIDATE_ORF_REFERENCES, &raw)
    }

    pub fn error_display_limit(&self) -> ConfigResult<usize> {
        let raw = self.get_config_or_default(config_keys::ERROR_DISPLAY_LIMIT, "10")?;
        parse_count(config_keys::ERROR_DISPLAY_LIMIT, &raw)
    }

    pub fn unique_positions(&self) -> ConfigResult<bool> {
        let raw = self.get_config_or_default(config_keys::UNIQUE_POSITIONS, "false")?;
        parse_bool(config_keys::UNIQUE_POSITIONS, &raw)
    }

    /// 当前生效的导入配置快照
    pub fn import_settings(&self) -> ConfigResult<ImportSettings> {
        Ok(ImportSettings {
            validate_orf_references: self.validate_orf_references()?,
            error_display_limit: self.error_display_limit()?,
            unique_positions: self.unique_positions()?,
        })
    }
}

fn upsert_global(conn: &Connection, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        r#"
        INSERT OR REPLACE INTO config_kv (scope_id, key, value, updated_at)
        VALUES ('global', ?1, ?2, datetime('now'))
        "#,
        params![key, value],
    )?;
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_count(key: &str, value: &str) -> ConfigResult<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_validate_orf_references(&self) -> ConfigResult<bool> {
        self.validate_orf_references()
    }

    async fn get_error_display_limit(&self) -> ConfigResult<usize> {
        self.error_display_limit()
    }
}

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const VALIDATE_ORF_REFERENCES: &str = "import.validate_orf_references";
    pub const ERROR_DISPLAY_LIMIT: &str = "import.error_display_limit";
    pub const UNIQUE_POSITIONS: &str = "import.unique_positions";

    pub const ALL: [&str; 3] = [VALIDATE_ORF_REFERENCES, ERROR_DISPLAY_LIMIT, UNIQUE_POSITIONS];

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ValueKind {
        Bool,
        Count,
    }

    pub fn kind_of(key: &str) -> Option<ValueKind> {
        match key {
            VALIDATE_ORF_REFERENCES | UNIQUE_POSITIONS => Some(ValueKind::Bool),
            ERROR_DISPLAY_LIMIT => Some(ValueKind::Count),
            _ => None,
        }
    }
}
