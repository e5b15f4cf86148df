// ==========================================
// 实验室试剂库 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: ORF/质粒/物种/冻存位置的表格导入、导出与模板
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "en");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格数据
pub mod importer;

// 导出层 - CSV / Excel
pub mod exporter;

// 配置层 - 应用配置与导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    EntryPosition, Freezer, ImportCounts, ImportReport, ImportType, Organism, OrfSequence,
    Plasmid, PositionType, SourceAttribution, YeastPosition,
};

pub use api::{ImportApi, ImportApiResponse};
pub use config::AppConfig;
pub use importer::{ImportOptions, ReagentImporter, ReagentImporterImpl};
pub use repository::ReagentRepository;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "Reagent DB";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
