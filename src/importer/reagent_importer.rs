// ==========================================
// 实验室试剂库 - 试剂数据导入器
// ==========================================
// 职责: 整合导入流程，从表格到数据库
// 流程: 解析 → 表头规范化 → 必填列检查 → 行处理 → 事务化写入 → 结果汇总
// 说明: 调用方总是得到结构化的 ImportReport，批次级错误也不会以 Err 形式抛出
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::import::{ImportCounts, ImportReport};
use crate::domain::types::ImportType;
use crate::i18n::t_with_args;
use crate::importer::column_normalizer::ColumnNormalizer;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use crate::importer::import_profile::ImportProfiles;
use crate::importer::raw_row::RawTable;
use crate::importer::row_processor::RowProcessor;
use crate::importer::transactional_writer::{
    CommitPolicy, TransactionalWriter, WriteOptions, WriteSummary,
};
use crate::repository::ReagentRepository;
use async_trait::async_trait;
use chrono::Local;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// ImportOptions - 单次导入选项
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportOptions {
    pub dry_run: bool,
    /// None 时使用配置项 import.validate_orf_references
    pub validate_orf_references: Option<bool>,
}

// ==========================================
// ReagentImporter Trait
// ==========================================
#[async_trait]
pub trait ReagentImporter: Send + Sync {
    /// 从文件导入（.csv / .xlsx / .xls）
    ///
    /// # 参数
    /// - file_path: 上传文件路径
    /// - import_type: 导入类型字符串（如 "orf_sequence"）
    /// - options: 导入选项
    ///
    /// # 返回
    /// - ImportReport: 成功/失败、分类计数、逐行错误
    async fn import_file(
        &self,
        file_path: &Path,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportReport;

    /// 从已解析的表格导入
    async fn import_table(
        &self,
        table: RawTable,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportReport;
}

// ==========================================
// ReagentImporterImpl
// ==========================================
pub struct ReagentImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 数据访问层
    repo: ReagentRepository,

    // 配置读取器
    config: C,

    // 导入类型描述表（同义词/必填列/默认规则）
    profiles: ImportProfiles,

    file_parser: Box<dyn FileParser>,
}

impl<C> ReagentImporterImpl<C>
where
    C: ImportConfigReader,
{
    /// 使用标准描述表与通用文件解析器创建导入器
    pub fn new(repo: ReagentRepository, config: C) -> Self {
        Self::with_components(
            repo,
            config,
            ImportProfiles::standard(),
            Box::new(UniversalFileParser),
        )
    }

    pub fn with_components(
        repo: ReagentRepository,
        config: C,
        profiles: ImportProfiles,
        file_parser: Box<dyn FileParser>,
    ) -> Self {
        Self {
            repo,
            config,
            profiles,
            file_parser,
        }
    }

    pub fn profiles(&self) -> &ImportProfiles {
        &self.profiles
    }

    pub fn repository(&self) -> &ReagentRepository {
        &self.repo
    }

    async fn resolve_write_options(&self, options: ImportOptions) -> ImportResult<WriteOptions> {
        let validate_orf_references = match options.validate_orf_references {
            Some(v) => v,
            None => self
                .config
                .get_validate_orf_references()
                .await
                .map_err(|e| ImportError::ConfigReadError {
                    key: "import.validate_orf_references".to_string(),
                    message: e.to_string(),
                })?,
        };

        Ok(WriteOptions {
            dry_run: options.dry_run,
            validate_orf_references,
        })
    }

    async fn error_display_limit(&self) -> usize {
        match self.config.get_error_display_limit().await {
            Ok(limit) => limit,
            Err(e) => {
                warn!(error = %e, "读取错误展示上限失败，使用默认值 10");
                10
            }
        }
    }

    /// 同步执行批次：规范化 → 必填列检查 → 行处理 → 写入
    fn run_batch(
        &self,
        mut table: RawTable,
        import_type: ImportType,
        write_options: WriteOptions,
    ) -> ImportResult<WriteSummary> {
        let profile = self.profiles.profile(import_type).ok_or_else(|| {
            ImportError::InternalError(format!("no import profile for {}", import_type))
        })?;

        ColumnNormalizer::new(profile).normalize_table(&mut table);

        let missing: Vec<String> = profile
            .required_columns()
            .into_iter()
            .filter(|col| !table.has_column(col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MissingRequiredColumns {
                import_type: import_type.to_string(),
                columns: missing,
            });
        }

        let rows = table.rows();
        debug!(rows = rows.len(), "表头检查通过，开始行处理");

        let today = Local::now().format("%Y-%m-%d").to_string();
        let outcomes = RowProcessor::new(profile, today).process_rows(&rows);

        TransactionalWriter::new(
            &self.repo,
            CommitPolicy::for_import_type(import_type),
            write_options,
        )
        .write(&outcomes)
    }
}

#[async_trait]
impl<C> ReagentImporter for ReagentImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path, options))]
    async fn import_file(
        &self,
        file_path: &Path,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportReport {
        info!(file_path = %file_path.display(), "开始解析导入文件");

        match self.file_parser.parse_to_table(file_path) {
            Ok(table) => {
                info!(
                    columns = table.headers.len(),
                    rows = table.records.len(),
                    "文件解析完成"
                );
                self.import_table(table, import_type, options).await
            }
            Err(e) => {
                error!(error = %e, "文件解析失败");
                let batch_id = Uuid::new_v4().to_string();
                ImportReport::failure(
                    &batch_id,
                    import_type,
                    t_with_args("import.file_error", &[("error", &e.to_string())]),
                )
            }
        }
    }

    #[instrument(skip(self, table, options), fields(batch_id))]
    async fn import_table(
        &self,
        table: RawTable,
        import_type: &str,
        options: ImportOptions,
    ) -> ImportReport {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, import_type = %import_type, dry_run = options.dry_run, "开始导入");

        let parsed_type = match import_type.parse::<ImportType>() {
            Ok(t) => t,
            Err(e) => {
                warn!(error = %e, "导入类型无效");
                return ImportReport::failure(&batch_id, import_type, ImportError::from(e).to_string());
            }
        };

        let write_options = match self.resolve_write_options(options).await {
            Ok(o) => o,
            Err(e) => {
                error!(error = %e, "读取导入配置失败");
                return ImportReport::failure(&batch_id, parsed_type.as_str(), e.to_string());
            }
        };
        let limit = self.error_display_limit().await;

        let report = match self.run_batch(table, parsed_type, write_options) {
            Ok(summary) => build_report(&batch_id, parsed_type, options.dry_run, summary, limit),
            Err(e @ ImportError::MissingRequiredColumns { .. }) => {
                warn!(error = %e, "缺少必填列，未处理任何行");
                ImportReport::failure(&batch_id, parsed_type.as_str(), e.to_string())
            }
            Err(e) => {
                error!(error = %e, "导入失败");
                ImportReport::failure(
                    &batch_id,
                    parsed_type.as_str(),
                    t_with_args("import.failed", &[("error", &e.to_string())]),
                )
            }
        };

        info!(
            batch_id = %batch_id,
            success = report.success,
            committed = report.committed,
            written = report.counts.total(),
            errors = report.errors.len(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "导入完成"
        );
        report
    }
}

// ==========================================
// 结果汇总
// ==========================================

/// 根据写入汇总生成批次结果
///
/// 说明：
/// - 单实体类型: 无致命写入错误即成功；致命错误时消息为 "Database error: ..."
/// - 统一导入: 至少一条写入成功即成功
/// - 消息中最多展示 limit 条错误，完整列表保留在 errors 中
pub fn build_report(
    batch_id: &str,
    import_type: ImportType,
    dry_run: bool,
    summary: WriteSummary,
    limit: usize,
) -> ImportReport {
    let written = summary.counts.total();

    let (success, mut lines) = if let Some(fatal) = &summary.fatal {
        (false, vec![t_with_args("import.failed", &[("error", fatal)])])
    } else if import_type.is_unified() {
        if written > 0 {
            (true, unified_summary_lines(&summary.counts))
        } else {
            (false, vec![t_with_args("import.nothing_written", &[])])
        }
    } else {
        (
            true,
            vec![t_with_args(
                "import.success",
                &[
                    ("count", &written.to_string()),
                    ("import_type", import_type.as_str()),
                ],
            )],
        )
    };

    if dry_run {
        lines.insert(0, t_with_args("import.dry_run", &[]));
    }
    lines.extend(error_summary_lines(&summary.errors, limit));

    ImportReport {
        batch_id: batch_id.to_string(),
        import_type: import_type.as_str().to_string(),
        success,
        committed: summary.committed,
        dry_run,
        message: lines.join("\n"),
        counts: summary.counts,
        errors: summary.errors,
        rows_total: summary.rows_total,
        rows_skipped: summary.rows_skipped,
    }
}

fn unified_summary_lines(counts: &ImportCounts) -> Vec<String> {
    let mut lines = vec![t_with_args(
        "import.unified_summary",
        &[
            ("sequences", &counts.sequences.to_string()),
            ("entry_positions", &counts.entry_positions.to_string()),
            ("ad_positions", &counts.ad_positions.to_string()),
            ("db_positions", &counts.db_positions.to_string()),
            ("sources", &counts.sources.to_string()),
        ],
    )];

    if counts.organisms + counts.freezers + counts.plasmids > 0 {
        lines.push(t_with_args(
            "import.reference_summary",
            &[
                ("organisms", &counts.organisms.to_string()),
                ("freezers", &counts.freezers.to_string()),
                ("plasmids", &counts.plasmids.to_string()),
            ],
        ));
    }
    lines
}

fn error_summary_lines(errors: &[String], limit: usize) -> Vec<String> {
    if errors.is_empty() {
        return Vec::new();
    }

    let mut lines = vec![t_with_args(
        "import.errors_header",
        &[("count", &errors.len().to_string())],
    )];
    lines.extend(errors.iter().take(limit).map(|e| format!("  {}", e)));
    if errors.len() > limit {
        lines.push(t_with_args(
            "import.errors_more",
            &[("count", &(errors.len() - limit).to_string())],
        ));
    }
    lines
}
