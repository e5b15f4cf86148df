// ==========================================
// 实验室试剂库 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入结果对象
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod reagent;
pub mod types;

// 重导出核心类型
pub use import::{ImportCategory, ImportCounts, ImportReport, WriteIntent};
pub use reagent::{
    EntryPosition, Freezer, Organism, OrfSequence, Plasmid, SourceAttribution, YeastPosition,
};
pub use types::{ImportType, PositionType, ReagentTable, UnknownImportType};
