// ==========================================
// 实验室试剂库 - 行处理器
// ==========================================
// 职责: 规范化后的行 → 写入意图（WriteIntent）或 跳过/行级错误
// 说明:
// - 不访问数据库，只产出意图；落库由 TransactionalWriter 负责
// - 哨兵行（Required / 占位主键 / 误入的表头）静默跳过，不计错误
// - 每行返回显式结果，行级问题不会中断后续行
// ==========================================

use crate::domain::import::WriteIntent;
use crate::domain::reagent::{
    EntryPosition, Freezer, Organism, OrfSequence, Plasmid, SourceAttribution, YeastPosition,
};
use crate::domain::types::{ImportType, PositionType};
use crate::importer::data_cleaner::{
    coerce_bool, coerce_int, coerce_position_type, normalize_id, parse_flag, parse_position,
};
use crate::importer::error::RowError;
use crate::importer::import_profile::ImportProfile;
use crate::importer::raw_row::RawRow;
use tracing::debug;

// ==========================================
// 行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 哨兵行，静默跳过
    Skipped { row_number: usize },
    /// 已处理（可能同时带有意图与错误，统一导入的子实体互相独立）
    Processed(ProcessedRow),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRow {
    pub row_number: usize,
    pub intents: Vec<WriteIntent>,
    pub errors: Vec<RowError>,
}

impl ProcessedRow {
    fn new(row_number: usize) -> Self {
        Self {
            row_number,
            intents: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn from_result(row_number: usize, result: Result<WriteIntent, RowError>) -> Self {
        let mut processed = Self::new(row_number);
        match result {
            Ok(intent) => processed.intents.push(intent),
            Err(e) => processed.errors.push(e),
        }
        processed
    }
}

// ==========================================
// RowProcessor
// ==========================================
pub struct RowProcessor<'a> {
    profile: &'a ImportProfile,
    today: String, // 日期类默认值（YYYY-MM-DD）
}

impl<'a> RowProcessor<'a> {
    /// 创建行处理器
    ///
    /// # 参数
    /// - profile: 导入类型描述
    /// - today: 当天日期，用于 CurrentDate 默认值
    pub fn new(profile: &'a ImportProfile, today: impl Into<String>) -> Self {
        Self {
            profile,
            today: today.into(),
        }
    }

    pub fn process_rows(&self, rows: &[RawRow]) -> Vec<RowOutcome> {
        rows.iter().map(|row| self.process_row(row)).collect()
    }

    pub fn process_row(&self, row: &RawRow) -> RowOutcome {
        let row_number = row.row_number();

        if let Some(key) = row.get(self.profile.key_field()) {
            if self.profile.is_sentinel(key) {
                debug!(row = row_number, key = %key, "跳过示例/占位行");
                return RowOutcome::Skipped { row_number };
            }
        }

        let processed = match self.profile.import_type() {
            ImportType::Organism => ProcessedRow::from_result(row_number, self.organism(row)),
            ImportType::Plasmid => ProcessedRow::from_result(row_number, self.plasmid(row)),
            ImportType::Freezer => ProcessedRow::from_result(row_number, self.freezer(row)),
            ImportType::OrfSequence => {
                ProcessedRow::from_result(row_number, self.orf_sequence(row))
            }
            ImportType::OrfPosition => {
                ProcessedRow::from_result(row_number, self.entry_position(row))
            }
            ImportType::YeastOrfPosition => {
                ProcessedRow::from_result(row_number, self.yeast_position(row))
            }
            ImportType::OrfSources => ProcessedRow::from_result(row_number, self.source(row)),
            ImportType::UnifiedPosition => self.unified(row),
        };

        RowOutcome::Processed(processed)
    }

    // ==========================================
    // 取值辅助
    // ==========================================

    /// 文本值，缺失时按列的默认规则补齐
    fn text(&self, row: &RawRow, field: &str) -> String {
        match row.get(field) {
            Some(v) => v.to_string(),
            None => self.profile.default_rule(field).fallback(&self.today),
        }
    }

    fn flag(&self, row: &RawRow, field: &str) -> i64 {
        row.get(field).map(coerce_bool).unwrap_or(0)
    }

    fn int(&self, row: &RawRow, field: &str) -> i64 {
        row.get(field).map(coerce_int).unwrap_or(0)
    }

    fn external_id(&self, row: &RawRow, field: &str) -> String {
        row.get(field).map(normalize_id).unwrap_or_default()
    }

    /// 本类型全部必填值齐全，否则返回一条列出缺失字段的错误
    fn check_required(&self, row: &RawRow) -> Result<(), RowError> {
        let missing = row.missing_fields(&self.profile.required_columns());
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RowError::MissingRequired {
                row: row.row_number(),
                fields: missing,
            })
        }
    }

    // ==========================================
    // 单实体类型
    // ==========================================

    fn organism(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        Ok(WriteIntent::UpsertOrganism(self.build_organism(row)?))
    }

    fn plasmid(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        Ok(WriteIntent::UpsertPlasmid(self.build_plasmid(row)?))
    }

    fn freezer(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        Ok(WriteIntent::UpsertFreezer(self.build_freezer(row)?))
    }

    fn orf_sequence(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        let orf_id = row.get_required("orf_id")?;
        Ok(WriteIntent::UpsertOrfSequence(
            self.build_orf_sequence(row, orf_id, "orf_organism_id")?,
        ))
    }

    fn entry_position(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        Ok(WriteIntent::InsertEntryPosition(EntryPosition {
            orf_id: row.get_required("orf_id")?,
            plate: row.get_required("plate")?,
            well: row.get_required("well")?,
            freezer_id: self.text(row, "freezer_id"),
            plasmid_id: self.text(row, "plasmid_id"),
            create_date: self.text(row, "orf_create_date"),
        }))
    }

    fn yeast_position(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        Ok(WriteIntent::InsertYeastPosition(YeastPosition {
            orf_id: row.get_required("orf_id")?,
            plate: row.get_required("plate")?,
            well: row.get_required("well")?,
            position_type: coerce_position_type(row.get("position_type"), row.row_number()),
        }))
    }

    fn source(&self, row: &RawRow) -> Result<WriteIntent, RowError> {
        self.check_required(row)?;
        let orf_id = row.get_required("orf_id")?;
        Ok(WriteIntent::InsertSource(self.build_source(row, orf_id)?))
    }

    // ==========================================
    // 实体构建（单实体类型与统一导入共用）
    // ==========================================

    fn build_organism(&self, row: &RawRow) -> Result<Organism, RowError> {
        Ok(Organism {
            organism_id: row.get_required("organism_id")?,
            name: row.get_required("organism_name")?,
            genus: self.text(row, "organism_genus"),
            species: self.text(row, "organism_species"),
            strain: self.text(row, "organism_strain"),
        })
    }

    fn build_plasmid(&self, row: &RawRow) -> Result<Plasmid, RowError> {
        Ok(Plasmid {
            plasmid_id: row.get_required("plasmid_id")?,
            name: row.get_required("plasmid_name")?,
            plasmid_type: self.text(row, "plasmid_type"),
            expression_host: self.text(row, "plasmid_express_organism"),
            description: self.text(row, "plasmid_description"),
        })
    }

    fn build_freezer(&self, row: &RawRow) -> Result<Freezer, RowError> {
        Ok(Freezer {
            freezer_id: row.get_required("freezer_id")?,
            location: row.get_required("freezer_location")?,
            condition: self.text(row, "freezer_condition"),
            date: self.text(row, "freezer_date"),
        })
    }

    fn build_orf_sequence(
        &self,
        row: &RawRow,
        orf_id: String,
        organism_field: &str,
    ) -> Result<OrfSequence, RowError> {
        Ok(OrfSequence {
            orf_id,
            name: row.get_required("orf_name")?,
            annotation: self.text(row, "orf_annotation"),
            sequence: row.get_required("orf_sequence")?,
            with_stop: self.flag(row, "orf_with_stop"),
            open: self.flag(row, "orf_open"),
            organism_id: self.text(row, organism_field),
            length_bp: self.int(row, "orf_length_bp"),
            entrez_id: self.external_id(row, "orf_entrez_id"),
            ensembl_id: self.text(row, "orf_ensembl_id"),
            uniprot_id: self.text(row, "orf_uniprot_id"),
            ref_url: self.text(row, "orf_ref_url"),
        })
    }

    fn build_source(&self, row: &RawRow, orf_id: String) -> Result<SourceAttribution, RowError> {
        Ok(SourceAttribution {
            orf_id,
            source_name: row.get_required("source_name")?,
            source_details: self.text(row, "source_details"),
            source_url: self.text(row, "source_url"),
            submission_date: self.text(row, "submission_date"),
            submitter: self.text(row, "submitter"),
            notes: self.text(row, "notes"),
        })
    }

    // ==========================================
    // 统一导入（一行拆分为多个子实体）
    // ==========================================

    /// 统一导入行
    ///
    /// 说明：
    /// - 物种/冰箱/质粒：对应 id 与名称（冰箱为位置）都有值时 upsert，与 ORF 必填项无关
    /// - 缺少 orf_id / orf_name / source_name 时，ORF 相关写入（序列/位置/来源）整体跳过并记一条错误
    /// - 没有任何位置的行照常写入序列与来源
    fn unified(&self, row: &RawRow) -> ProcessedRow {
        let row_number = row.row_number();
        let mut processed = ProcessedRow::new(row_number);

        if row.has("organism_id") && row.has("organism_name") {
            if let Ok(organism) = self.build_organism(row) {
                processed.intents.push(WriteIntent::UpsertOrganism(organism));
            }
        }
        if row.has("freezer_id") && row.has("freezer_location") {
            if let Ok(freezer) = self.build_freezer(row) {
                processed.intents.push(WriteIntent::UpsertFreezer(freezer));
            }
        }
        if row.has("plasmid_id") && row.has("plasmid_name") {
            if let Ok(plasmid) = self.build_plasmid(row) {
                processed.intents.push(WriteIntent::UpsertPlasmid(plasmid));
            }
        }

        if let Err(e) = self.check_required(row) {
            processed.errors.push(e);
            return processed;
        }
        let orf_id = self.text(row, "orf_id");

        if row.has("orf_sequence") {
            // 序列的物种优先取 orf_organism_id，其次同一行的 organism_id
            let organism_field = if row.has("orf_organism_id") {
                "orf_organism_id"
            } else {
                "organism_id"
            };
            match self.build_orf_sequence(row, orf_id.clone(), organism_field) {
                Ok(orf) => processed.intents.push(WriteIntent::UpsertOrfSequence(orf)),
                Err(e) => processed.errors.push(e),
            }
        }

        match self.position_slot(row, "entry_position") {
            Ok(Some((plate, well))) => {
                processed
                    .intents
                    .push(WriteIntent::InsertEntryPosition(EntryPosition {
                        orf_id: orf_id.clone(),
                        plate,
                        well,
                        freezer_id: self.text(row, "freezer_id"),
                        plasmid_id: self.text(row, "plasmid_id"),
                        create_date: self.text(row, "orf_create_date"),
                    }));
            }
            Ok(None) => {}
            Err(e) => processed.errors.push(e),
        }

        for (field, position_type) in [
            ("yeast_ad_position", PositionType::Ad),
            ("yeast_db_position", PositionType::Db),
        ] {
            match self.position_slot(row, field) {
                Ok(Some((plate, well))) => {
                    processed
                        .intents
                        .push(WriteIntent::InsertYeastPosition(YeastPosition {
                            orf_id: orf_id.clone(),
                            plate,
                            well,
                            position_type,
                        }));
                }
                Ok(None) => {}
                Err(e) => processed.errors.push(e),
            }
        }

        match self.build_source(row, orf_id) {
            Ok(source) => processed.intents.push(WriteIntent::InsertSource(source)),
            Err(e) => processed.errors.push(e),
        }

        processed
    }

    /// 解析一个位置槽位
    ///
    /// # 返回
    /// - Ok(None): 单元格为空或标记为否
    /// - Ok(Some((plate, well))): 组合位置串，或标记为是时取本行 plate/well 列
    /// - Err: 标记为是但本行 plate/well 缺失
    fn position_slot(&self, row: &RawRow, field: &str) -> Result<Option<(String, String)>, RowError> {
        let Some(value) = row.get(field) else {
            return Ok(None);
        };

        match parse_flag(value) {
            Some(false) => Ok(None),
            Some(true) => {
                let missing = row.missing_fields(&["plate", "well"]);
                if !missing.is_empty() {
                    return Err(RowError::MissingRequired {
                        row: row.row_number(),
                        fields: missing,
                    });
                }
                Ok(Some((self.text(row, "plate"), self.text(row, "well"))))
            }
            None => Ok(parse_position(value)),
        }
    }
}
