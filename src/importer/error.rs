// ==========================================
// 实验室试剂库 - 导入模块错误类型
// ==========================================
// ImportError: 批次级（文件/表头/导入类型），直接失败，不处理任何行
// RowError: 行级（可恢复），累积到结果的 errors 列表
// 工具: thiserror 派生宏
// ==========================================

use crate::domain::types::UnknownImportType;
use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型（批次级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (only .csv/.xlsx/.xls)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse Excel file: {0}")]
    ExcelParseError(String),

    #[error("Failed to parse CSV file: {0}")]
    CsvParseError(String),

    #[error("File has no readable header row")]
    EmptyHeader,

    #[error("Failed to write file: {0}")]
    FileWriteError(String),

    // ===== 表头/类型错误 =====
    #[error(transparent)]
    UnknownImportType(#[from] UnknownImportType),

    #[error("Missing required column(s) for {import_type}: {}", .columns.join(", "))]
    MissingRequiredColumns {
        import_type: String,
        columns: Vec<String>,
    },

    // ===== 配置错误 =====
    #[error("Failed to read config (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 数据库错误 =====
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ===== 通用错误 =====
    #[error("Internal error: {0}")]
    InternalError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::DatabaseError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for ImportError {
    fn from(err: rust_xlsxwriter::XlsxError) -> Self {
        ImportError::FileWriteError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

// ==========================================
// RowError - 行级错误
// ==========================================
// 行号为表格行号（表头为第 1 行）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("Row {row}: Missing required value(s): {}", .fields.join(", "))]
    MissingRequired { row: usize, fields: Vec<String> },

    #[error("Row {row}: Unknown ORF ID '{orf_id}'")]
    UnknownOrf { row: usize, orf_id: String },

    #[error("Row {row}: {entity} error: {message}")]
    Write {
        row: usize,
        entity: String,
        message: String,
    },
}
