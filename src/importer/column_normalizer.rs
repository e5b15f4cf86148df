// ==========================================
// 实验室试剂库 - 列名规范化器
// ==========================================
// 职责: 表头别名 → 规范列名（按导入类型的同义词表）
// 规则:
// - 匹配键 = 去掉 '#' 后 TRIM + 小写，空白/连字符转下划线
// - 只做精确匹配，不做模糊匹配
// - 输出与输入一一对应，未匹配的表头原样保留
// ==========================================

use crate::importer::import_profile::ImportProfile;
use crate::importer::raw_row::RawTable;
use std::collections::HashSet;
use tracing::{debug, warn};

/// 表头匹配键
pub fn normalize_key(header: &str) -> String {
    let stripped: String = header.chars().filter(|c| *c != '#').collect();
    stripped
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

pub struct ColumnNormalizer<'a> {
    profile: &'a ImportProfile,
}

impl<'a> ColumnNormalizer<'a> {
    pub fn new(profile: &'a ImportProfile) -> Self {
        Self { profile }
    }

    /// 重写表头
    ///
    /// 说明：
    /// - 本身就是规范列名（大小写/空白差异）的表头优先占用该列名
    /// - 别名映射到的规范列名已被占用时，该表头保持原样（同名列只取第一列）
    pub fn normalize_headers(&self, headers: &[String]) -> Vec<String> {
        let mut claimed: HashSet<&'static str> = HashSet::new();
        let mut resolved: Vec<Option<&'static str>> = vec![None; headers.len()];

        // 第一轮：直接命中规范列名
        for (idx, header) in headers.iter().enumerate() {
            if let Some(canonical) = self.profile.canonical_for(header) {
                if normalize_key(header) == canonical && claimed.insert(canonical) {
                    resolved[idx] = Some(canonical);
                }
            }
        }

        // 第二轮：别名
        for (idx, header) in headers.iter().enumerate() {
            if resolved[idx].is_some() {
                continue;
            }
            let Some(canonical) = self.profile.canonical_for(header) else {
                continue;
            };
            if claimed.insert(canonical) {
                resolved[idx] = Some(canonical);
            } else {
                warn!(
                    header = %header,
                    canonical = canonical,
                    "规范列名已被占用，表头保持原样"
                );
            }
        }

        headers
            .iter()
            .zip(resolved)
            .map(|(header, canonical)| match canonical {
                Some(canonical) => {
                    if header != canonical {
                        debug!(from = %header, to = canonical, "表头重命名");
                    }
                    canonical.to_string()
                }
                None => header.clone(),
            })
            .collect()
    }

    /// 原地重写 RawTable 的表头
    pub fn normalize_table(&self, table: &mut RawTable) {
        table.headers = self.normalize_headers(&table.headers);
    }
}
