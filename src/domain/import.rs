// ==========================================
// 实验室试剂库 - 导入领域对象
// ==========================================
// WriteIntent: 行处理器产出的单条写入意图
// ImportCounts: 按类别统计的写入数量
// ImportReport: 批次导入结果（可 JSON 序列化）
// ==========================================

use crate::domain::reagent::{
    EntryPosition, Freezer, Organism, OrfSequence, Plasmid, SourceAttribution, YeastPosition,
};
use crate::domain::types::PositionType;
use serde::{Deserialize, Serialize};

// ==========================================
// WriteIntent - 写入意图
// ==========================================
// 前四类为 upsert（按主键覆盖），后三类为追加插入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteIntent {
    UpsertOrganism(Organism),
    UpsertFreezer(Freezer),
    UpsertPlasmid(Plasmid),
    UpsertOrfSequence(OrfSequence),
    InsertEntryPosition(EntryPosition),
    InsertYeastPosition(YeastPosition),
    InsertSource(SourceAttribution),
}

impl WriteIntent {
    pub fn category(&self) -> ImportCategory {
        match self {
            WriteIntent::UpsertOrganism(_) => ImportCategory::Organisms,
            WriteIntent::UpsertFreezer(_) => ImportCategory::Freezers,
            WriteIntent::UpsertPlasmid(_) => ImportCategory::Plasmids,
            WriteIntent::UpsertOrfSequence(_) => ImportCategory::Sequences,
            WriteIntent::InsertEntryPosition(_) => ImportCategory::EntryPositions,
            WriteIntent::InsertYeastPosition(p) => match p.position_type {
                PositionType::Ad => ImportCategory::AdPositions,
                PositionType::Db => ImportCategory::DbPositions,
            },
            WriteIntent::InsertSource(_) => ImportCategory::Sources,
        }
    }

    /// 依赖 ORF 的追加写入返回其 orf_id（用于可选的存在性校验）
    pub fn referenced_orf_id(&self) -> Option<&str> {
        match self {
            WriteIntent::InsertEntryPosition(p) => Some(&p.orf_id),
            WriteIntent::InsertYeastPosition(p) => Some(&p.orf_id),
            WriteIntent::InsertSource(s) => Some(&s.orf_id),
            _ => None,
        }
    }
}

// ==========================================
// ImportCategory - 统计类别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportCategory {
    Organisms,
    Freezers,
    Plasmids,
    Sequences,
    EntryPositions,
    AdPositions,
    DbPositions,
    Sources,
}

impl ImportCategory {
    /// 错误信息中使用的子实体名称
    pub fn label(&self) -> &'static str {
        match self {
            ImportCategory::Organisms => "Organism",
            ImportCategory::Freezers => "Freezer",
            ImportCategory::Plasmids => "Plasmid",
            ImportCategory::Sequences => "Sequence",
            ImportCategory::EntryPositions => "Entry position",
            ImportCategory::AdPositions => "Yeast AD position",
            ImportCategory::DbPositions => "Yeast DB position",
            ImportCategory::Sources => "Source information",
        }
    }
}

// ==========================================
// ImportCounts - 分类计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportCounts {
    pub organisms: usize,
    pub freezers: usize,
    pub plasmids: usize,
    pub sequences: usize,
    pub entry_positions: usize,
    pub ad_positions: usize,
    pub db_positions: usize,
    pub sources: usize,
}

impl ImportCounts {
    pub fn record(&mut self, category: ImportCategory) {
        *self.slot_mut(category) += 1;
    }

    pub fn get(&self, category: ImportCategory) -> usize {
        match category {
            ImportCategory::Organisms => self.organisms,
            ImportCategory::Freezers => self.freezers,
            ImportCategory::Plasmids => self.plasmids,
            ImportCategory::Sequences => self.sequences,
            ImportCategory::EntryPositions => self.entry_positions,
            ImportCategory::AdPositions => self.ad_positions,
            ImportCategory::DbPositions => self.db_positions,
            ImportCategory::Sources => self.sources,
        }
    }

    pub fn total(&self) -> usize {
        self.organisms
            + self.freezers
            + self.plasmids
            + self.sequences
            + self.entry_positions
            + self.ad_positions
            + self.db_positions
            + self.sources
    }

    fn slot_mut(&mut self, category: ImportCategory) -> &mut usize {
        match category {
            ImportCategory::Organisms => &mut self.organisms,
            ImportCategory::Freezers => &mut self.freezers,
            ImportCategory::Plasmids => &mut self.plasmids,
            ImportCategory::Sequences => &mut self.sequences,
            ImportCategory::EntryPositions => &mut self.entry_positions,
            ImportCategory::AdPositions => &mut self.ad_positions,
            ImportCategory::DbPositions => &mut self.db_positions,
            ImportCategory::Sources => &mut self.sources,
        }
    }
}

// ==========================================
// ImportReport - 批次导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub batch_id: String,
    pub import_type: String,
    pub success: bool,
    pub committed: bool,
    pub dry_run: bool,
    pub message: String,
    pub counts: ImportCounts,
    pub errors: Vec<String>, // 完整错误列表；message 中只展示前若干条
    pub rows_total: usize,
    pub rows_skipped: usize, // 示例/占位行（静默跳过，不计为错误）
}

impl ImportReport {
    /// 批次级失败（未处理任何行）
    pub fn failure(batch_id: &str, import_type: &str, message: impl Into<String>) -> Self {
        Self {
            batch_id: batch_id.to_string(),
            import_type: import_type.to_string(),
            success: false,
            committed: false,
            dry_run: false,
            message: message.into(),
            counts: ImportCounts::default(),
            errors: Vec::new(),
            rows_total: 0,
            rows_skipped: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_record_and_total() {
        let mut counts = ImportCounts::default();
        counts.record(ImportCategory::Sequences);
        counts.record(ImportCategory::Sequences);
        counts.record(ImportCategory::DbPositions);

        assert_eq!(counts.get(ImportCategory::Sequences), 2);
        assert_eq!(counts.db_positions, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_yeast_intent_category_follows_position_type() {
        let intent = WriteIntent::InsertYeastPosition(YeastPosition {
            orf_id: "ORF001".to_string(),
            plate: "Y1".to_string(),
            well: "A1".to_string(),
            position_type: PositionType::Db,
        });
        assert_eq!(intent.category(), ImportCategory::DbPositions);
        assert_eq!(intent.referenced_orf_id(), Some("ORF001"));
    }
}
