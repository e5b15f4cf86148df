// ==========================================
// 实验室试剂库 - 导入层
// ==========================================
// 职责: 表格数据（CSV/Excel）导入试剂库
// 流程: 文件解析 → 列名规范化 → 行处理 → 事务化写入
// ==========================================

// 模块声明
pub mod column_normalizer;
pub mod data_cleaner;
pub mod error;
pub mod file_parser;
pub mod import_profile;
pub mod raw_row;
pub mod reagent_importer;
pub mod row_processor;
pub mod template;
pub mod transactional_writer;

// 重导出核心类型
pub use column_normalizer::{normalize_key, ColumnNormalizer};
pub use data_cleaner::{coerce_bool, coerce_int, normalize_id, parse_position};
pub use error::{ImportError, ImportResult, RowError};
pub use file_parser::{is_supported_file, CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use import_profile::{DefaultRule, ImportProfile, ImportProfiles};
pub use raw_row::{RawRow, RawTable};
pub use reagent_importer::{build_report, ImportOptions, ReagentImporter, ReagentImporterImpl};
pub use row_processor::{RowOutcome, RowProcessor};
pub use template::{build_template, ImportTemplate};
pub use transactional_writer::{CommitPolicy, TransactionalWriter, WriteOptions, WriteSummary};
