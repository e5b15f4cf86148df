// ==========================================
// 实验室试剂库 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户可读的错误消息
// ==========================================

use crate::config::ConfigError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("File type not allowed. Please upload CSV or XLSX files.")]
    UnsupportedFileType(String),

    #[error("Not found: {0}")]
    NotFound(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Database connection failed: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 文件/配置错误
    // ==========================================
    #[error("Error processing file: {0}")]
    ImportError(String),

    #[error("Error exporting data: {0}")]
    ExportError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("File system error: {0}")]
    Io(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("lock poisoned: {}", msg))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(ext) => ApiError::UnsupportedFileType(ext),
            ImportError::UnknownImportType(e) => ApiError::InvalidInput(e.to_string()),
            ImportError::DatabaseError(msg) => ApiError::DatabaseError(msg),
            other => ApiError::ImportError(other.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::DatabaseError(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::Io(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::UnknownImportType;

    #[test]
    fn test_import_error_mapping() {
        let err: ApiError = ImportError::UnsupportedFormat("txt".to_string()).into();
        assert!(matches!(err, ApiError::UnsupportedFileType(_)));

        let err: ApiError = ImportError::from(UnknownImportType("antibody".to_string())).into();
        assert_eq!(err.to_string(), "Invalid input: Unknown import type: antibody");
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::UniqueConstraintViolation("orf_position".into()).into();
        assert!(matches!(err, ApiError::DatabaseError(_)));
    }
}
