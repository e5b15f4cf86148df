// ==========================================
// 实验室试剂库 - 原始表格数据结构
// ==========================================
// RawTable: 文件解析结果（有序表头 + 数据行，保留表格行号）
// RawRow: 单行视图（字段名 → 可选值），替代零散的空值/NaN 判断
// ==========================================

use crate::importer::error::RowError;
use std::collections::HashMap;

// ==========================================
// RawTable
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

/// 一条数据行（单元格顺序与表头一致）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub row_number: usize, // 表格行号（表头为第 1 行）
    pub cells: Vec<String>,
}

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            records: Vec::new(),
        }
    }

    pub fn push_record(&mut self, row_number: usize, cells: Vec<String>) {
        self.records.push(RawRecord { row_number, cells });
    }

    /// 表头中是否存在该列（精确匹配，用于必填列检查）
    pub fn has_column(&self, name: &str) -> bool {
        self.headers.iter().any(|h| h == name)
    }

    /// 构建行视图
    ///
    /// 说明：
    /// - 同名列只取第一次出现的列
    /// - 行短于表头时缺失单元格视为空
    pub fn rows(&self) -> Vec<RawRow> {
        self.records
            .iter()
            .map(|record| {
                let mut cells = HashMap::with_capacity(self.headers.len());
                for (idx, header) in self.headers.iter().enumerate() {
                    if cells.contains_key(header) {
                        continue;
                    }
                    let value = record.cells.get(idx).and_then(|v| clean_cell(v));
                    cells.insert(header.clone(), value);
                }
                RawRow {
                    row_number: record.row_number,
                    cells,
                }
            })
            .collect()
    }
}

/// 单元格清洗：TRIM，空串与 "nan" 视为缺失
fn clean_cell(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ==========================================
// RawRow
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    row_number: usize,
    cells: HashMap<String, Option<String>>,
}

impl RawRow {
    /// 直接由 (字段, 值) 构建（测试与程序化调用使用）
    pub fn from_pairs<K, V>(row_number: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
    {
        let cells = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), clean_cell(v.as_ref())))
            .collect();
        Self { row_number, cells }
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    /// 取非空值
    pub fn get(&self, field: &str) -> Option<&str> {
        self.cells.get(field).and_then(|v| v.as_deref())
    }

    /// 字段存在且非空
    pub fn has(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// 取值，缺失时返回默认值
    pub fn get_optional(&self, field: &str, default: &str) -> String {
        self.get(field).unwrap_or(default).to_string()
    }

    /// 取必填值，缺失时返回行级错误
    pub fn get_required(&self, field: &str) -> Result<String, RowError> {
        self.get(field)
            .map(str::to_string)
            .ok_or_else(|| RowError::MissingRequired {
                row: self.row_number,
                fields: vec![field.to_string()],
            })
    }

    /// 列出缺失的必填字段（保持传入顺序）
    pub fn missing_fields(&self, fields: &[&str]) -> Vec<String> {
        fields
            .iter()
            .filter(|f| !self.has(f))
            .map(|f| f.to_string())
            .collect()
    }
}
