// ==========================================
// 实验室试剂库 - API 层
// ==========================================
// 职责: 提供导入/导出业务接口，供命令行或上层服务调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod upload;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ExportApiResponse, ImportApi, ImportApiResponse, TemplateApiResponse};
pub use upload::UploadGuard;
