// ==========================================
// 实验室试剂库 - 试剂实体
// ==========================================
// 主键均由调用方/表格提供，系统不生成主键
// 软引用（organism_id / orf_id / freezer_id / plasmid_id）写入时不强制校验
// ==========================================

use crate::domain::types::PositionType;
use serde::{Deserialize, Serialize};

// ==========================================
// Organism - 物种（upsert）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organism {
    pub organism_id: String,
    pub name: String,
    pub genus: String,
    pub species: String,
    pub strain: String,
}

// ==========================================
// Plasmid - 质粒（upsert）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plasmid {
    pub plasmid_id: String,
    pub name: String,
    pub plasmid_type: String,
    pub expression_host: String,
    pub description: String,
}

// ==========================================
// Freezer - 冰箱（upsert）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freezer {
    pub freezer_id: String,
    pub location: String,
    pub condition: String, // 保存温度/介质
    pub date: String,      // YYYY-MM-DD
}

// ==========================================
// OrfSequence - ORF 序列（upsert）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrfSequence {
    pub orf_id: String,
    pub name: String,
    pub annotation: String,
    pub sequence: String,
    pub with_stop: i64, // 0/1
    pub open: i64,      // 0/1
    pub organism_id: String,
    pub length_bp: i64,

    // 外部交叉引用
    pub entrez_id: String,
    pub ensembl_id: String,
    pub uniprot_id: String,
    pub ref_url: String,
}

// ==========================================
// EntryPosition - 入门载体存放位置（追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPosition {
    pub orf_id: String,
    pub plate: String,
    pub well: String,
    pub freezer_id: String,
    pub plasmid_id: String,
    pub create_date: String,
}

// ==========================================
// YeastPosition - 酵母双杂交位置（追加）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YeastPosition {
    pub orf_id: String,
    pub plate: String,
    pub well: String,
    pub position_type: PositionType,
}

// ==========================================
// SourceAttribution - 来源记录（追加，保留历史）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAttribution {
    pub orf_id: String,
    pub source_name: String,
    pub source_details: String,
    pub source_url: String,
    pub submission_date: String,
    pub submitter: String,
    pub notes: String,
}
