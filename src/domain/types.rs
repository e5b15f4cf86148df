// ==========================================
// 实验室试剂库 - 领域类型定义
// ==========================================
// 职责: 导入类型 / 酵母位置类型 / 数据表枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ==========================================
// 导入类型 (Import Type)
// ==========================================
// 序列化格式: snake_case（与上传表单 import_type 字段一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    Organism,
    Plasmid,
    Freezer,
    OrfSequence,
    OrfPosition,
    YeastOrfPosition,
    OrfSources,
    UnifiedPosition,
}

impl ImportType {
    /// 全部导入类型（模板生成/帮助信息使用）
    pub const ALL: [ImportType; 8] = [
        ImportType::Organism,
        ImportType::Plasmid,
        ImportType::Freezer,
        ImportType::OrfSequence,
        ImportType::OrfPosition,
        ImportType::YeastOrfPosition,
        ImportType::OrfSources,
        ImportType::UnifiedPosition,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportType::Organism => "organism",
            ImportType::Plasmid => "plasmid",
            ImportType::Freezer => "freezer",
            ImportType::OrfSequence => "orf_sequence",
            ImportType::OrfPosition => "orf_position",
            ImportType::YeastOrfPosition => "yeast_orf_position",
            ImportType::OrfSources => "orf_sources",
            ImportType::UnifiedPosition => "unified_position",
        }
    }

    /// 是否为多实体（统一）导入
    pub fn is_unified(&self) -> bool {
        matches!(self, ImportType::UnifiedPosition)
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 导入类型解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown import type: {0}")]
pub struct UnknownImportType(pub String);

impl FromStr for ImportType {
    type Err = UnknownImportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        match normalized.as_str() {
            "organism" => Ok(ImportType::Organism),
            "plasmid" => Ok(ImportType::Plasmid),
            "freezer" => Ok(ImportType::Freezer),
            "orf_sequence" => Ok(ImportType::OrfSequence),
            "orf_position" => Ok(ImportType::OrfPosition),
            "yeast_orf_position" => Ok(ImportType::YeastOrfPosition),
            "orf_sources" => Ok(ImportType::OrfSources),
            // 统一导入的简写
            "unified_position" | "unified" => Ok(ImportType::UnifiedPosition),
            _ => Err(UnknownImportType(s.to_string())),
        }
    }
}

// ==========================================
// 酵母双杂交位置类型 (AD / DB)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PositionType {
    #[serde(rename = "AD")]
    Ad, // 激活域融合
    #[serde(rename = "DB")]
    Db, // DNA 结合域融合
}

impl PositionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionType::Ad => "AD",
            PositionType::Db => "DB",
        }
    }

    /// 严格解析（大小写不敏感），无法识别返回 None
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "AD" => Some(PositionType::Ad),
            "DB" => Some(PositionType::Db),
            _ => None,
        }
    }
}

impl fmt::Display for PositionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 数据表 (Reagent Table)
// ==========================================
// 用途: 计数 / 导出 时按表枚举，列顺序与导出 CSV 表头一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReagentTable {
    Freezer,
    Organisms,
    Plasmid,
    OrfSequence,
    OrfPosition,
    YeastOrfPosition,
    OrfSources,
}

impl ReagentTable {
    pub const ALL: [ReagentTable; 7] = [
        ReagentTable::Freezer,
        ReagentTable::Organisms,
        ReagentTable::Plasmid,
        ReagentTable::OrfSequence,
        ReagentTable::OrfPosition,
        ReagentTable::YeastOrfPosition,
        ReagentTable::OrfSources,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            ReagentTable::Freezer => "freezer",
            ReagentTable::Organisms => "organisms",
            ReagentTable::Plasmid => "plasmid",
            ReagentTable::OrfSequence => "orf_sequence",
            ReagentTable::OrfPosition => "orf_position",
            ReagentTable::YeastOrfPosition => "yeast_orf_position",
            ReagentTable::OrfSources => "orf_sources",
        }
    }

    /// Excel 导出的工作表名
    pub fn sheet_name(&self) -> &'static str {
        match self {
            ReagentTable::Freezer => "Freezers",
            ReagentTable::Organisms => "Organisms",
            ReagentTable::Plasmid => "Plasmids",
            ReagentTable::OrfSequence => "ORF Sequences",
            ReagentTable::OrfPosition => "ORF Positions",
            ReagentTable::YeastOrfPosition => "Yeast Positions",
            ReagentTable::OrfSources => "ORF Sources",
        }
    }

    /// 导出列（自增 id 列不导出）
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            ReagentTable::Freezer => &[
                "freezer_id",
                "freezer_location",
                "freezer_condition",
                "freezer_date",
            ],
            ReagentTable::Organisms => &[
                "organism_id",
                "organism_name",
                "organism_genus",
                "organism_species",
                "organism_strain",
            ],
            ReagentTable::Plasmid => &[
                "plasmid_id",
                "plasmid_name",
                "plasmid_type",
                "plasmid_express_organism",
                "plasmid_description",
            ],
            ReagentTable::OrfSequence => &[
                "orf_id",
                "orf_name",
                "orf_annotation",
                "orf_sequence",
                "orf_with_stop",
                "orf_open",
                "orf_organism_id",
                "orf_length_bp",
                "orf_entrez_id",
                "orf_ensembl_id",
                "orf_uniprot_id",
                "orf_ref_url",
            ],
            ReagentTable::OrfPosition => &[
                "orf_id",
                "plate",
                "well",
                "freezer_id",
                "plasmid_id",
                "orf_create_date",
            ],
            ReagentTable::YeastOrfPosition => &["orf_id", "plate", "well", "position_type"],
            ReagentTable::OrfSources => &[
                "orf_id",
                "source_name",
                "source_details",
                "source_url",
                "submission_date",
                "submitter",
                "notes",
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_type_round_trip_names() {
        for t in ImportType::ALL {
            assert_eq!(t.as_str().parse::<ImportType>().unwrap(), t);
        }
    }

    #[test]
    fn test_import_type_parse_is_lenient_on_case() {
        assert_eq!(" ORF_Sequence ".parse::<ImportType>().unwrap(), ImportType::OrfSequence);
        assert_eq!("unified".parse::<ImportType>().unwrap(), ImportType::UnifiedPosition);
        assert!("orf".parse::<ImportType>().is_err());
    }

    #[test]
    fn test_position_type_parse() {
        assert_eq!(PositionType::parse("ad"), Some(PositionType::Ad));
        assert_eq!(PositionType::parse(" DB "), Some(PositionType::Db));
        assert_eq!(PositionType::parse("bait"), None);
    }
}
