// ==========================================
// 实验室试剂库 - 导入/导出 API
// ==========================================
// 职责: 上传暂存 → 导入 → 清理；数据导出；模板生成
// 说明: 导入接口总是返回结构化响应（success + message），不向调用方抛错
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::upload::UploadGuard;
use crate::config::{AppConfig, ConfigManager};
use crate::db::{apply_position_uniqueness, init_schema, open_sqlite_connection};
use crate::domain::import::{ImportCounts, ImportReport};
use crate::domain::types::ImportType;
use crate::exporter::export_all;
use crate::i18n::t_with_args;
use crate::importer::{
    build_template, is_supported_file, ImportOptions, ReagentImporter, ReagentImporterImpl,
};
use crate::repository::ReagentRepository;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use uuid::Uuid;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    pub success: bool,
    pub message: String,
    pub batch_id: String,
    pub import_type: String,
    /// 按类别的写入数量（dry_run 时为"将会写入"的数量）
    pub counts: ImportCounts,
    /// 完整的逐行错误列表
    pub errors: Vec<String>,
    pub rows_total: usize,
    pub rows_skipped: usize,
    pub dry_run: bool,
    pub committed: bool,
}

impl From<ImportReport> for ImportApiResponse {
    fn from(report: ImportReport) -> Self {
        Self {
            success: report.success,
            message: report.message,
            batch_id: report.batch_id,
            import_type: report.import_type,
            counts: report.counts,
            errors: report.errors,
            rows_total: report.rows_total,
            rows_skipped: report.rows_skipped,
            dry_run: report.dry_run,
            committed: report.committed,
        }
    }
}

impl ImportApiResponse {
    fn rejected(import_type: &str, message: String) -> Self {
        ImportReport::failure(&Uuid::new_v4().to_string(), import_type, message).into()
    }
}

/// 导出API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportApiResponse {
    pub success: bool,
    pub message: String,
    pub export_dir: String,
    pub files: Vec<String>,
}

/// 模板API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateApiResponse {
    pub success: bool,
    pub message: String,
    pub csv_path: String,
    pub xlsx_path: String,
}

/// 导入API
pub struct ImportApi {
    upload_folder: PathBuf,
    export_folder: PathBuf,
    importer: ReagentImporterImpl<ConfigManager>,
}

impl ImportApi {
    /// 创建 ImportApi 实例
    ///
    /// 说明：
    /// - 打开（必要时创建）数据库并幂等建表
    /// - 按配置项 import.unique_positions 开启/关闭位置唯一约束
    /// - 唯一约束无法生效时只记录 warn，不阻止启动
    pub fn new(config: &AppConfig) -> ApiResult<Self> {
        if let Some(parent) = Path::new(&config.db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = open_sqlite_connection(&config.db_path)?;
        init_schema(&conn)?;
        let shared = Arc::new(Mutex::new(conn));

        let config_manager = ConfigManager::from_connection(shared.clone())?;
        let unique_positions = match config_manager.unique_positions() {
            Ok(enabled) => enabled,
            Err(e) => {
                warn!(error = %e, "位置唯一约束配置无效，按关闭处理");
                false
            }
        };
        let unique_positions = {
            let guard = shared
                .lock()
                .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
            match apply_position_uniqueness(&guard, unique_positions) {
                Ok(()) => unique_positions,
                Err(e) => {
                    warn!(error = %e, "无法开启位置唯一约束（已有重复位置），本次不启用");
                    false
                }
            }
        };

        let repo = ReagentRepository::from_connection(shared);
        info!(db_path = %config.db_path, unique_positions, "ImportApi 初始化完成");

        Ok(Self {
            upload_folder: config.upload_folder.clone(),
            export_folder: config.export_folder.clone(),
            importer: ReagentImporterImpl::new(repo, config_manager),
        })
    }

    pub fn repository(&self) -> &ReagentRepository {
        self.importer.repository()
    }

    /// 暂存上传文件（复制到 upload_folder，文件名为 UUID）
    ///
    /// # 返回
    /// - Ok(UploadGuard): 暂存文件守卫，Drop 时删除文件
    /// - Err: 文件类型不支持、源文件不存在、复制失败
    pub fn stage_upload(&self, source: &Path) -> ApiResult<UploadGuard> {
        if !is_supported_file(source) {
            let ext = source
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_string();
            return Err(ApiError::UnsupportedFileType(ext));
        }
        if !source.exists() {
            return Err(ApiError::NotFound(source.display().to_string()));
        }

        std::fs::create_dir_all(&self.upload_folder)?;
        let ext = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("csv")
            .to_lowercase();
        let staged = self
            .upload_folder
            .join(format!("{}.{}", Uuid::new_v4(), ext));

        std::fs::copy(source, &staged)?;
        Ok(UploadGuard::new(staged))
    }

    /// 导入已暂存的上传文件，结束后删除该文件
    pub async fn import_upload(
        &self,
        upload: UploadGuard,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportApiResponse {
        if let Err(e) = import_type.parse::<ImportType>() {
            warn!(error = %e, "导入类型无效，未处理文件");
            return ImportApiResponse::rejected(import_type, e.to_string());
        }

        let report = self
            .importer
            .import_file(upload.path(), import_type, options)
            .await;
        drop(upload);
        report.into()
    }

    /// 暂存并导入（保存上传 → 处理 → 删除）
    pub async fn import_file(
        &self,
        source: &Path,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportApiResponse {
        match self.stage_upload(source) {
            Ok(upload) => self.import_upload(upload, import_type, options).await,
            Err(e) => {
                warn!(error = %e, "上传文件暂存失败");
                ImportApiResponse::rejected(import_type, e.to_string())
            }
        }
    }

    /// 导出全部数据到 export_folder
    pub fn export_data(&self) -> ApiResult<ExportApiResponse> {
        let summary = export_all(self.repository(), &self.export_folder)?;
        let export_dir = summary.export_dir.display().to_string();

        Ok(ExportApiResponse {
            success: true,
            message: t_with_args("export.success", &[("dir", &export_dir)]),
            export_dir,
            files: summary
                .files
                .iter()
                .map(|f| f.display().to_string())
                .collect(),
        })
    }

    /// 生成导入模板（CSV + XLSX）到 export_folder
    pub fn generate_template(&self, import_type: &str) -> ApiResult<TemplateApiResponse> {
        let parsed = import_type
            .parse::<ImportType>()
            .map_err(|e| ApiError::InvalidInput(e.to_string()))?;
        let profile = self
            .importer
            .profiles()
            .profile(parsed)
            .ok_or_else(|| ApiError::InternalError(format!("no import profile for {}", parsed)))?;

        let today = Local::now().format("%Y-%m-%d").to_string();
        let (csv_path, xlsx_path) =
            build_template(profile, &today).write_both(&self.export_folder, parsed.as_str())?;
        let csv_path = csv_path.display().to_string();

        Ok(TemplateApiResponse {
            success: true,
            message: t_with_args("template.success", &[("path", &csv_path)]),
            csv_path,
            xlsx_path: xlsx_path.display().to_string(),
        })
    }
}
