// ==========================================
// 实验室试剂库 - 数据导出
// ==========================================
// 输出: 每张表一个 CSV + 一个汇总工作簿 reagent_database_export.xlsx
// 说明: 工作簿中 ORF 序列超过 100 字符时截断并追加 "..."（CSV 保留全文）
// ==========================================

use crate::domain::types::ReagentTable;
use crate::repository::{ReagentRepository, RepositoryError};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const WORKBOOK_FILE_NAME: &str = "reagent_database_export.xlsx";
pub const SEQUENCE_PREVIEW_CHARS: usize = 100;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to build workbook: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),
}

pub type ExportResult<T> = Result<T, ExportError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub export_dir: PathBuf,
    pub files: Vec<PathBuf>,
    pub row_counts: Vec<(ReagentTable, usize)>,
}

/// 导出全部表
///
/// # 参数
/// - repo: 试剂库仓储
/// - export_dir: 输出目录（不存在则创建，同名文件覆盖）
pub fn export_all(repo: &ReagentRepository, export_dir: &Path) -> ExportResult<ExportSummary> {
    std::fs::create_dir_all(export_dir).map_err(|e| ExportError::Write {
        path: export_dir.display().to_string(),
        message: e.to_string(),
    })?;

    let mut files = Vec::with_capacity(ReagentTable::ALL.len() + 1);
    let mut row_counts = Vec::with_capacity(ReagentTable::ALL.len());
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for table in ReagentTable::ALL {
        let rows = repo.dump_table(table)?;
        debug!(table = table.table_name(), rows = rows.len(), "读取表数据");

        let csv_path = export_dir.join(format!("{}.csv", table.table_name()));
        write_table_csv(&csv_path, table.columns(), &rows)?;
        files.push(csv_path);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.sheet_name())?;
        for (col, header) in table.columns().iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        let sequence_col = table.columns().iter().position(|c| *c == "orf_sequence");
        for (row_idx, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let cell = if Some(col) == sequence_col {
                    sequence_preview(value)
                } else {
                    value.clone()
                };
                worksheet.write_string((row_idx + 1) as u32, col as u16, cell)?;
            }
        }

        row_counts.push((table, rows.len()));
    }

    let workbook_path = export_dir.join(WORKBOOK_FILE_NAME);
    workbook.save(&workbook_path)?;
    files.push(workbook_path);

    info!(export_dir = %export_dir.display(), files = files.len(), "数据导出完成");

    Ok(ExportSummary {
        export_dir: export_dir.to_path_buf(),
        files,
        row_counts,
    })
}

fn write_table_csv(path: &Path, headers: &[&str], rows: &[Vec<String>]) -> ExportResult<()> {
    let write_err = |e: csv::Error| ExportError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(headers).map_err(write_err)?;
    for row in rows {
        writer.write_record(row).map_err(write_err)?;
    }
    writer.flush().map_err(|e| ExportError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// 工作簿中的序列预览
pub fn sequence_preview(sequence: &str) -> String {
    if sequence.chars().count() > SEQUENCE_PREVIEW_CHARS {
        let head: String = sequence.chars().take(SEQUENCE_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        sequence.to_string()
    }
}
