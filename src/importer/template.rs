// ==========================================
// 实验室试剂库 - 导入模板生成
// ==========================================
// 表头: 导入类型的规范列（必填列在前）
// 第 1 行: 示例值（主键为占位 ID，如 ORF999）
// 第 2 行: 必填列填 "Required"，其余留空
// 说明: 两行都是哨兵行，模板原样回导不会写入任何数据
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_profile::{DefaultRule, ImportProfile, REQUIRED_MARKER};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportTemplate {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// 生成模板内容
///
/// # 参数
/// - profile: 导入类型描述（与导入流程共用）
/// - today: 日期列的示例值
pub fn build_template(profile: &ImportProfile, today: &str) -> ImportTemplate {
    let mut columns: Vec<_> = profile.columns().iter().collect();
    columns.sort_by_key(|c| !c.required);

    let headers = columns.iter().map(|c| c.name.to_string()).collect();

    let example = columns
        .iter()
        .map(|c| {
            if c.name == profile.key_field() {
                profile.placeholder().to_string()
            } else if c.example.is_empty() && c.default == DefaultRule::CurrentDate {
                today.to_string()
            } else {
                c.example.to_string()
            }
        })
        .collect();

    let markers = columns
        .iter()
        .map(|c| {
            if c.required {
                REQUIRED_MARKER.to_string()
            } else {
                String::new()
            }
        })
        .collect();

    ImportTemplate {
        headers,
        rows: vec![example, markers],
    }
}

impl ImportTemplate {
    pub fn write_csv(&self, path: &Path) -> ImportResult<()> {
        let write_err = |e: csv::Error| ImportError::FileWriteError(e.to_string());

        let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
        writer.write_record(&self.headers).map_err(write_err)?;
        for row in &self.rows {
            writer.write_record(row).map_err(write_err)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_xlsx(&self, path: &Path) -> ImportResult<()> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        let bold = Format::new().set_bold();

        for (col, header) in self.headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, header, &bold)?;
        }
        for (row_idx, row) in self.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col as u16, value)?;
            }
        }

        workbook.save(path)?;
        Ok(())
    }

    /// 在目录下写出 {import_type}_template.csv 与 .xlsx
    ///
    /// # 返回
    /// - (csv 路径, xlsx 路径)
    pub fn write_both(&self, dir: &Path, import_type: &str) -> ImportResult<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let csv_path = dir.join(format!("{}_template.csv", import_type));
        let xlsx_path = dir.join(format!("{}_template.xlsx", import_type));

        self.write_csv(&csv_path)?;
        self.write_xlsx(&xlsx_path)?;

        info!(csv = %csv_path.display(), xlsx = %xlsx_path.display(), "模板已生成");
        Ok((csv_path, xlsx_path))
    }
}
