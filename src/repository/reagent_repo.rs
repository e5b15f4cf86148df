// ==========================================
// 实验室试剂库 - 试剂数据仓储
// ==========================================
// 职责: 七张试剂表的写入（事务内）与查询（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import::WriteIntent;
use crate::domain::reagent::{
    EntryPosition, Freezer, Organism, OrfSequence, Plasmid, SourceAttribution, YeastPosition,
};
use crate::domain::types::{PositionType, ReagentTable};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ReagentRepository
// ==========================================
pub struct ReagentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReagentRepository {
    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 共享底层连接（ConfigManager 复用同一连接）
    pub fn shared_connection(&self) -> Arc<Mutex<Connection>> {
        Arc::clone(&self.conn)
    }

    /// 获取数据库连接
    pub fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 事务内写入
    // ==========================================

    /// 在事务中执行一条写入意图
    ///
    /// 说明：
    /// - SQLite 的约束失败只回滚当前语句，事务保持可用
    /// - 调用方决定单条失败是否升级为整批回滚
    pub fn apply_intent_tx(tx: &Transaction, intent: &WriteIntent) -> RepositoryResult<()> {
        match intent {
            WriteIntent::UpsertOrganism(o) => Self::upsert_organism_tx(tx, o),
            WriteIntent::UpsertFreezer(f) => Self::upsert_freezer_tx(tx, f),
            WriteIntent::UpsertPlasmid(p) => Self::upsert_plasmid_tx(tx, p),
            WriteIntent::UpsertOrfSequence(s) => Self::upsert_orf_sequence_tx(tx, s),
            WriteIntent::InsertEntryPosition(p) => Self::insert_entry_position_tx(tx, p),
            WriteIntent::InsertYeastPosition(p) => Self::insert_yeast_position_tx(tx, p),
            WriteIntent::InsertSource(s) => Self::insert_source_tx(tx, s),
        }
    }

    fn upsert_organism_tx(tx: &Transaction, organism: &Organism) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR REPLACE INTO organisms (
                organism_id, organism_name, organism_genus, organism_species, organism_strain
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                organism.organism_id,
                organism.name,
                organism.genus,
                organism.species,
                organism.strain,
            ],
        )?;
        Ok(())
    }

    fn upsert_freezer_tx(tx: &Transaction, freezer: &Freezer) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR REPLACE INTO freezer (
                freezer_id, freezer_location, freezer_condition, freezer_date
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                freezer.freezer_id,
                freezer.location,
                freezer.condition,
                freezer.date,
            ],
        )?;
        Ok(())
    }

    fn upsert_plasmid_tx(tx: &Transaction, plasmid: &Plasmid) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR REPLACE INTO plasmid (
                plasmid_id, plasmid_name, plasmid_type, plasmid_express_organism, plasmid_description
            ) VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                plasmid.plasmid_id,
                plasmid.name,
                plasmid.plasmid_type,
                plasmid.expression_host,
                plasmid.description,
            ],
        )?;
        Ok(())
    }

    fn upsert_orf_sequence_tx(tx: &Transaction, orf: &OrfSequence) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT OR REPLACE INTO orf_sequence (
                orf_id, orf_name, orf_annotation, orf_sequence, orf_with_stop, orf_open,
                orf_organism_id, orf_length_bp, orf_entrez_id, orf_ensembl_id,
                orf_uniprot_id, orf_ref_url
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                orf.orf_id,
                orf.name,
                orf.annotation,
                orf.sequence,
                orf.with_stop,
                orf.open,
                orf.organism_id,
                orf.length_bp,
                orf.entrez_id,
                orf.ensembl_id,
                orf.uniprot_id,
                orf.ref_url,
            ],
        )?;
        Ok(())
    }

    fn insert_entry_position_tx(tx: &Transaction, pos: &EntryPosition) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO orf_position (
                orf_id, plate, well, freezer_id, plasmid_id, orf_create_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                pos.orf_id,
                pos.plate,
                pos.well,
                pos.freezer_id,
                pos.plasmid_id,
                pos.create_date,
            ],
        )?;
        Ok(())
    }

    fn insert_yeast_position_tx(tx: &Transaction, pos: &YeastPosition) -> RepositoryResult<()> {
        tx.execute(
            "INSERT INTO yeast_orf_position (orf_id, plate, well, position_type) VALUES (?1, ?2, ?3, ?4)",
            params![pos.orf_id, pos.plate, pos.well, pos.position_type.as_str()],
        )?;
        Ok(())
    }

    fn insert_source_tx(tx: &Transaction, source: &SourceAttribution) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO orf_sources (
                orf_id, source_name, source_details, source_url, submission_date, submitter, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                source.orf_id,
                source.source_name,
                source.source_details,
                source.source_url,
                source.submission_date,
                source.submitter,
                source.notes,
            ],
        )?;
        Ok(())
    }

    /// 事务内检查 ORF 是否存在（同批次先写入的序列可见）
    pub fn orf_exists_tx(tx: &Transaction, orf_id: &str) -> RepositoryResult<bool> {
        let found = tx
            .query_row(
                "SELECT 1 FROM orf_sequence WHERE orf_id = ?1 LIMIT 1",
                params![orf_id],
                |_row| Ok(true),
            )
            .optional()?;
        Ok(found.unwrap_or(false))
    }

    // ==========================================
    // 查询
    // ==========================================

    /// 统计表记录数
    pub fn count_rows(&self, table: ReagentTable) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.table_name());
        let count: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count)
    }

    /// 按 orf_id 查询 ORF 序列
    pub fn find_orf_sequence(&self, orf_id: &str) -> RepositoryResult<Option<OrfSequence>> {
        let conn = self.get_conn()?;
        let orf = conn
            .query_row(
                r#"
                SELECT orf_id, orf_name, orf_annotation, orf_sequence, orf_with_stop, orf_open,
                       orf_organism_id, orf_length_bp, orf_entrez_id, orf_ensembl_id,
                       orf_uniprot_id, orf_ref_url
                FROM orf_sequence WHERE orf_id = ?1
                "#,
                params![orf_id],
                |row| {
                    Ok(OrfSequence {
                        orf_id: row.get(0)?,
                        name: text_or_empty(row.get(1)?),
                        annotation: text_or_empty(row.get(2)?),
                        sequence: text_or_empty(row.get(3)?),
                        with_stop: row.get::<_, Option<i64>>(4)?.unwrap_or(0),
                        open: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                        organism_id: text_or_empty(row.get(6)?),
                        length_bp: row.get::<_, Option<i64>>(7)?.unwrap_or(0),
                        entrez_id: text_or_empty(row.get(8)?),
                        ensembl_id: text_or_empty(row.get(9)?),
                        uniprot_id: text_or_empty(row.get(10)?),
                        ref_url: text_or_empty(row.get(11)?),
                    })
                },
            )
            .optional()?;
        Ok(orf)
    }

    /// 查询某 ORF 的全部入门载体位置（按插入顺序）
    pub fn list_entry_positions(&self, orf_id: &str) -> RepositoryResult<Vec<EntryPosition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT orf_id, plate, well, freezer_id, plasmid_id, orf_create_date
            FROM orf_position WHERE orf_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![orf_id], |row| {
            Ok(EntryPosition {
                orf_id: row.get(0)?,
                plate: text_or_empty(row.get(1)?),
                well: text_or_empty(row.get(2)?),
                freezer_id: text_or_empty(row.get(3)?),
                plasmid_id: text_or_empty(row.get(4)?),
                create_date: text_or_empty(row.get(5)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 查询某 ORF 的全部酵母位置
    pub fn list_yeast_positions(&self, orf_id: &str) -> RepositoryResult<Vec<YeastPosition>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT orf_id, plate, well, position_type FROM yeast_orf_position WHERE orf_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![orf_id], |row| {
            let raw_type: Option<String> = row.get(3)?;
            Ok(YeastPosition {
                orf_id: row.get(0)?,
                plate: text_or_empty(row.get(1)?),
                well: text_or_empty(row.get(2)?),
                // 历史数据无 position_type 时按列默认值 AD 处理
                position_type: raw_type
                    .as_deref()
                    .and_then(PositionType::parse)
                    .unwrap_or(PositionType::Ad),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 查询某 ORF 的来源记录（历史，按插入顺序）
    pub fn list_sources(&self, orf_id: &str) -> RepositoryResult<Vec<SourceAttribution>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT orf_id, source_name, source_details, source_url, submission_date, submitter, notes
            FROM orf_sources WHERE orf_id = ?1 ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![orf_id], |row| {
            Ok(SourceAttribution {
                orf_id: row.get(0)?,
                source_name: text_or_empty(row.get(1)?),
                source_details: text_or_empty(row.get(2)?),
                source_url: text_or_empty(row.get(3)?),
                submission_date: text_or_empty(row.get(4)?),
                submitter: text_or_empty(row.get(5)?),
                notes: text_or_empty(row.get(6)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 按导出列读取整张表，单元格统一转为字符串（NULL → 空串）
    pub fn dump_table(&self, table: ReagentTable) -> RepositoryResult<Vec<Vec<String>>> {
        let conn = self.get_conn()?;
        let columns = table.columns();
        let sql = format!(
            "SELECT {} FROM {} ORDER BY rowid",
            columns.join(", "),
            table.table_name()
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| {
            let mut cells = Vec::with_capacity(columns.len());
            for idx in 0..columns.len() {
                cells.push(value_to_string(row.get_ref(idx)?));
            }
            Ok(cells)
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn text_or_empty(value: Option<String>) -> String {
    value.unwrap_or_default()
}

fn value_to_string(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned(),
        ValueRef::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn test_repo() -> ReagentRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ReagentRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn orf(orf_id: &str, name: &str) -> OrfSequence {
        OrfSequence {
            orf_id: orf_id.to_string(),
            name: name.to_string(),
            annotation: String::new(),
            sequence: "ATGAAA".to_string(),
            with_stop: 1,
            open: 0,
            organism_id: String::new(),
            length_bp: 6,
            entrez_id: String::new(),
            ensembl_id: String::new(),
            uniprot_id: String::new(),
            ref_url: String::new(),
        }
    }

    #[test]
    fn test_upsert_orf_sequence_overwrites() {
        let repo = test_repo();
        {
            let conn = repo.get_conn().unwrap();
            let tx = conn.unchecked_transaction().unwrap();
            ReagentRepository::apply_intent_tx(&tx, &WriteIntent::UpsertOrfSequence(orf("ORF001", "first")))
                .unwrap();
            ReagentRepository::apply_intent_tx(&tx, &WriteIntent::UpsertOrfSequence(orf("ORF001", "second")))
                .unwrap();
            assert!(ReagentRepository::orf_exists_tx(&tx, "ORF001").unwrap());
            assert!(!ReagentRepository::orf_exists_tx(&tx, "ORF404").unwrap());
            tx.commit().unwrap();
        }

        assert_eq!(repo.count_rows(ReagentTable::OrfSequence).unwrap(), 1);
        let stored = repo.find_orf_sequence("ORF001").unwrap().unwrap();
        assert_eq!(stored.name, "second");
        assert_eq!(stored.with_stop, 1);
    }

    #[test]
    fn test_yeast_positions_round_trip_type() {
        let repo = test_repo();
        {
            let conn = repo.get_conn().unwrap();
            let tx = conn.unchecked_transaction().unwrap();
            for position_type in [PositionType::Ad, PositionType::Db] {
                let intent = WriteIntent::InsertYeastPosition(YeastPosition {
                    orf_id: "ORF001".to_string(),
                    plate: "Y1".to_string(),
                    well: "B2".to_string(),
                    position_type,
                });
                ReagentRepository::apply_intent_tx(&tx, &intent).unwrap();
            }
            tx.commit().unwrap();
        }

        let positions = repo.list_yeast_positions("ORF001").unwrap();
        assert_eq!(positions.len(), 2);
        assert_eq!(positions[0].position_type, PositionType::Ad);
        assert_eq!(positions[1].position_type, PositionType::Db);
    }

    #[test]
    fn test_dump_table_renders_null_as_empty() {
        let repo = test_repo();
        {
            let conn = repo.get_conn().unwrap();
            conn.execute(
                "INSERT INTO orf_position (orf_id, plate, well) VALUES ('ORF001', 'P1', 'A1')",
                [],
            )
            .unwrap();
        }

        let rows = repo.dump_table(ReagentTable::OrfPosition).unwrap();
        assert_eq!(rows, vec![vec!["ORF001", "P1", "A1", "", "", ""]]);
    }
}
