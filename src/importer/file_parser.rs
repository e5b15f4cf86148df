// ==========================================
// 实验室试剂库 - 文件解析器实现
// ==========================================
// 支持: CSV (.csv) / Excel (.xlsx/.xls，第一个工作表)
// 输出: RawTable（有序表头 + 数据行，保留表格行号，完全空白行丢弃）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::raw_row::RawTable;
use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDate;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
pub trait FileParser: Send + Sync {
    /// 解析文件为 RawTable
    ///
    /// # 返回
    /// - Ok(RawTable): 表头与数据行
    /// - Err: 文件不存在、格式不支持、解析失败、无表头
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|v| v.trim().is_empty())
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if is_blank(&headers) {
            return Err(ImportError::EmptyHeader);
        }

        let mut table = RawTable::new(headers);
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            // 行号取记录起始的物理行（表头为第 1 行）
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);
            let cells: Vec<String> = record.iter().map(|v| v.to_string()).collect();

            if is_blank(&cells) {
                continue;
            }
            table.push_record(row_number, cells);
        }

        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))??;

        // 工作表可能不从 A1 开始
        let first_row = range.start().map(|(r, _)| r as usize).unwrap_or(0);

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptyHeader)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();
        if is_blank(&headers) {
            return Err(ImportError::EmptyHeader);
        }

        let mut table = RawTable::new(headers);
        for (idx, data_row) in rows.enumerate() {
            let cells: Vec<String> = data_row.iter().map(cell_to_string).collect();
            if is_blank(&cells) {
                continue;
            }
            table.push_record(first_row + idx + 2, cells);
        }

        Ok(table)
    }
}

/// 单元格转文本
///
/// 说明：日期单元格按 %Y-%m-%d 输出（Excel 内部存储为序列号）
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        Data::DateTimeIso(iso) => iso
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| iso.clone()),
        other => other.to_string(),
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_table(file_path),
            "xlsx" | "xls" => ExcelParser.parse_to_table(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// 扩展名是否为支持的上传格式
pub fn is_supported_file(path: &Path) -> bool {
    matches!(extension_of(path).as_str(), "csv" | "xlsx" | "xls")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_csv_parser_valid_file() {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(temp_file, "orf_id,orf_name,orf_sequence").unwrap();
        writeln!(temp_file, "ORF001,TP53,ATGGAG").unwrap();
        writeln!(temp_file, "ORF002,BRCA1,ATGGAT").unwrap();

        let table = CsvParser.parse_to_table(temp_file.path()).unwrap();

        assert_eq!(table.headers, vec!["orf_id", "orf_name", "orf_sequence"]);
        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[0].row_number, 2);
        assert_eq!(table.records[1].cells[1], "BRCA1");
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_blank_rows_keeps_row_numbers() {
        let mut temp_file = Builder::new().suffix(".CSV").tempfile().unwrap();
        writeln!(temp_file, "orf_id,plate").unwrap();
        writeln!(temp_file, "ORF001,P1").unwrap();
        writeln!(temp_file, ",").unwrap();
        writeln!(temp_file, "ORF002,P2").unwrap();

        let table = CsvParser.parse_to_table(temp_file.path()).unwrap();

        assert_eq!(table.records.len(), 2);
        assert_eq!(table.records[1].row_number, 4);
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalFileParser.parse_to_table(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "txt"));
    }

    #[test]
    fn test_cell_to_string_formats_iso_dates() {
        assert_eq!(
            cell_to_string(&Data::DateTimeIso("2024-05-01T00:00:00".to_string())),
            "2024-05-01"
        );
        assert_eq!(
            cell_to_string(&Data::DateTimeIso("12:30:00".to_string())),
            "12:30:00"
        );
        assert_eq!(cell_to_string(&Data::String("P1-A1".to_string())), "P1-A1");
        assert_eq!(cell_to_string(&Data::Int(42)), "42");
    }

    #[test]
    fn test_excel_parser_converts_date_cells() {
        let temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        let date_format = rust_xlsxwriter::Format::new().set_num_format("yyyy-mm-dd");
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2024, 5, 1).unwrap();
        sheet.write_string(0, 0, "freezer_id").unwrap();
        sheet.write_string(0, 1, "freezer_date").unwrap();
        sheet.write_string(1, 0, "FRZ001").unwrap();
        sheet
            .write_datetime_with_format(1, 1, &date, &date_format)
            .unwrap();
        workbook.save(temp_file.path()).unwrap();

        let table = ExcelParser.parse_to_table(temp_file.path()).unwrap();

        assert_eq!(table.records.len(), 1);
        assert_eq!(table.records[0].cells, vec!["FRZ001", "2024-05-01"]);
    }

    #[test]
    fn test_is_supported_file() {
        assert!(is_supported_file(Path::new("upload.XLSX")));
        assert!(is_supported_file(Path::new("upload.csv")));
        assert!(!is_supported_file(Path::new("upload.json")));
    }
}
