// ==========================================
// 实验室试剂库 - SQLite 连接初始化与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 幂等建表（七张试剂表 + config_kv + schema_version）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 位置唯一索引名（可选约束，见 apply_position_uniqueness）
const ENTRY_POSITION_UNIQUE_INDEX: &str = "ux_orf_position_slot";
const YEAST_POSITION_UNIQUE_INDEX: &str = "ux_yeast_orf_position_slot";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys / busy_timeout 需要“每个连接”单独配置
/// - 试剂表之间是软引用（不声明 FOREIGN KEY）
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 初始化数据库 schema（幂等）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS freezer (
            freezer_id TEXT PRIMARY KEY,
            freezer_location TEXT,
            freezer_condition TEXT,
            freezer_date TEXT
        );

        CREATE TABLE IF NOT EXISTS organisms (
            organism_id TEXT PRIMARY KEY,
            organism_name TEXT,
            organism_genus TEXT,
            organism_species TEXT,
            organism_strain TEXT
        );

        CREATE TABLE IF NOT EXISTS plasmid (
            plasmid_id TEXT PRIMARY KEY,
            plasmid_name TEXT,
            plasmid_type TEXT,
            plasmid_express_organism TEXT,
            plasmid_description TEXT
        );

        CREATE TABLE IF NOT EXISTS orf_sequence (
            orf_id TEXT PRIMARY KEY,
            orf_name TEXT,
            orf_annotation TEXT,
            orf_sequence TEXT,
            orf_with_stop INTEGER,
            orf_open INTEGER,
            orf_organism_id TEXT,
            orf_length_bp INTEGER,
            orf_entrez_id TEXT,
            orf_ensembl_id TEXT,
            orf_uniprot_id TEXT,
            orf_ref_url TEXT
        );

        CREATE TABLE IF NOT EXISTS orf_position (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            orf_id TEXT,
            plate TEXT,
            well TEXT,
            freezer_id TEXT,
            plasmid_id TEXT,
            orf_create_date TEXT
        );

        CREATE TABLE IF NOT EXISTS yeast_orf_position (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            orf_id TEXT,
            plate TEXT,
            well TEXT,
            position_type TEXT DEFAULT 'AD'
        );

        CREATE TABLE IF NOT EXISTS orf_sources (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            orf_id TEXT,
            source_name TEXT,
            source_details TEXT,
            source_url TEXT,
            submission_date TEXT,
            submitter TEXT,
            notes TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_orf_position_orf ON orf_position(orf_id);
        CREATE INDEX IF NOT EXISTS idx_yeast_orf_position_orf ON yeast_orf_position(orf_id);
        CREATE INDEX IF NOT EXISTS idx_orf_sources_orf ON orf_sources(orf_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 开启/关闭位置唯一约束
///
/// 说明：
/// - 开启后同一 (orf_id, plate, well[, position_type]) 重复插入会失败（只影响该行该子实体）
/// - 已有重复数据时开启会返回 UNIQUE 错误，需先清理数据
pub fn apply_position_uniqueness(conn: &Connection, enabled: bool) -> rusqlite::Result<()> {
    if enabled {
        conn.execute_batch(&format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {ENTRY_POSITION_UNIQUE_INDEX} \
                ON orf_position(orf_id, plate, well);
             CREATE UNIQUE INDEX IF NOT EXISTS {YEAST_POSITION_UNIQUE_INDEX} \
                ON yeast_orf_position(orf_id, plate, well, position_type);"
        ))
    } else {
        conn.execute_batch(&format!(
            "DROP INDEX IF EXISTS {ENTRY_POSITION_UNIQUE_INDEX};
             DROP INDEX IF EXISTS {YEAST_POSITION_UNIQUE_INDEX};"
        ))
    }
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_position_uniqueness_toggle() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        apply_position_uniqueness(&conn, true).unwrap();

        conn.execute(
            "INSERT INTO orf_position (orf_id, plate, well) VALUES ('ORF001', 'P1', 'A1')",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO orf_position (orf_id, plate, well) VALUES ('ORF001', 'P1', 'A1')",
            [],
        );
        assert!(dup.is_err());

        apply_position_uniqueness(&conn, false).unwrap();
        conn.execute(
            "INSERT INTO orf_position (orf_id, plate, well) VALUES ('ORF001', 'P1', 'A1')",
            [],
        )
        .unwrap();
    }
}
