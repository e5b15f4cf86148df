// ==========================================
// 实验室试剂库 - 数据清洗/类型转换
// ==========================================
// 职责: 布尔/整数/外部 ID 标准化，位置串解析，AD/DB 类型识别
// 规则: 无法解析的值替换为默认值，不报错
// ==========================================

use crate::domain::types::PositionType;
use tracing::warn;

/// 位置串的分隔符（按优先级）
const POSITION_SEPARATORS: [char; 4] = ['-', ':', '_', ' '];

/// 布尔转换（0/1）
///
/// # 规则
/// - {1, true, yes, y, t}（大小写不敏感）→ 1
/// - 数值串：非零 → 1，零 → 0
/// - 其余（含 {0, false, no, n, f} 与无法解析的值）→ 0
pub fn coerce_bool(value: &str) -> i64 {
    let v = value.trim().to_lowercase();
    match v.as_str() {
        "1" | "true" | "yes" | "y" | "t" => 1,
        "0" | "false" | "no" | "n" | "f" | "" => 0,
        other => match other.parse::<f64>() {
            Ok(n) if n.is_finite() && n != 0.0 => 1,
            _ => 0,
        },
    }
}

/// 严格的是/否标记识别（无法识别返回 None，由调用方按其他格式解析）
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "t" => Some(true),
        "0" | "false" | "no" | "n" | "f" => Some(false),
        _ => None,
    }
}

/// 整数转换，失败为 0（"16.0" 这类整值浮点串按整数接受）
pub fn coerce_int(value: &str) -> i64 {
    let v = value.trim();
    if let Ok(n) = v.parse::<i64>() {
        return n;
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f.fract() == 0.0 && fits_i64(f) => f as i64,
        _ => 0,
    }
}

/// 外部 ID 标准化（表格软件把数字 ID 存成 "12345.0"）
///
/// 数值串经 float → int → string 去掉小数部分；非数值原样保留
pub fn normalize_id(value: &str) -> String {
    let v = value.trim();
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && fits_i64(f) => (f.trunc() as i64).to_string(),
        _ => v.to_string(),
    }
}

fn fits_i64(f: f64) -> bool {
    f >= i64::MIN as f64 && f <= i64::MAX as f64
}

/// 解析位置串为 (plate, well)
///
/// # 规则
/// 1. 空串 → None（该槽位不产生位置记录）
/// 2. 依次尝试分隔符 '-' ':' '_' ' '，在第一次出现处切分
/// 3. 无分隔符时在第一个数字处切分（数字不能在首位）："B5" → ("B", "5")
/// 4. 仍无法解析时整串作为 plate，well 为空
pub fn parse_position(value: &str) -> Option<(String, String)> {
    let v = value.trim();
    if v.is_empty() {
        return None;
    }

    for sep in POSITION_SEPARATORS {
        if let Some((plate, well)) = v.split_once(sep) {
            return Some((plate.trim().to_string(), well.trim().to_string()));
        }
    }

    match v.char_indices().find(|(_, c)| c.is_ascii_digit()) {
        Some((idx, _)) if idx > 0 => Some((v[..idx].to_string(), v[idx..].to_string())),
        _ => Some((v.to_string(), String::new())),
    }
}

/// AD/DB 识别，缺失或无法识别时回退为 AD
pub fn coerce_position_type(value: Option<&str>, row_number: usize) -> PositionType {
    match value {
        None => PositionType::Ad,
        Some(raw) => PositionType::parse(raw).unwrap_or_else(|| {
            warn!(row = row_number, value = %raw, "无法识别的 position_type，按 AD 处理");
            PositionType::Ad
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_bool_table() {
        assert_eq!(coerce_bool("Yes"), 1);
        assert_eq!(coerce_bool(" T "), 1);
        assert_eq!(coerce_bool("1"), 1);
        assert_eq!(coerce_bool("1.0"), 1);
        assert_eq!(coerce_bool("-3"), 1);
        assert_eq!(coerce_bool("0"), 0);
        assert_eq!(coerce_bool("No"), 0);
        assert_eq!(coerce_bool("maybe"), 0);
        assert_eq!(coerce_bool("NaN"), 0);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag("n"), Some(false));
        assert_eq!(parse_flag("Plate1-A1"), None);
    }

    #[test]
    fn test_coerce_int() {
        assert_eq!(coerce_int("16"), 16);
        assert_eq!(coerce_int("16.0"), 16);
        assert_eq!(coerce_int("16.5"), 0);
        assert_eq!(coerce_int("abc"), 0);
        assert_eq!(coerce_int(""), 0);
    }

    #[test]
    fn test_normalize_id() {
        assert_eq!(normalize_id("12345.0"), "12345");
        assert_eq!(normalize_id("12345"), "12345");
        assert_eq!(normalize_id("ENSG00000141510"), "ENSG00000141510");
        assert_eq!(normalize_id("P04637"), "P04637");
    }

    #[test]
    fn test_parse_position_separators() {
        let pos = |p: &str, w: &str| Some((p.to_string(), w.to_string()));

        assert_eq!(parse_position("Plate1-A1"), pos("Plate1", "A1"));
        assert_eq!(parse_position("Plate4:D7"), pos("Plate4", "D7"));
        assert_eq!(parse_position("P2_H12"), pos("P2", "H12"));
        assert_eq!(parse_position("P3 C4"), pos("P3", "C4"));
        assert_eq!(parse_position(""), None);
        assert_eq!(parse_position("   "), None);
    }

    #[test]
    fn test_parse_position_digit_fallback() {
        let pos = |p: &str, w: &str| Some((p.to_string(), w.to_string()));

        assert_eq!(parse_position("B5"), pos("B", "5"));
        assert_eq!(parse_position("Plate12"), pos("Plate", "12"));
        // 分隔符优先于数字切分
        assert_eq!(parse_position("P4A-7"), pos("P4A", "7"));
        // 首字符为数字且无分隔符：整串作为 plate
        assert_eq!(parse_position("12"), pos("12", ""));
        assert_eq!(parse_position("Freezer"), pos("Freezer", ""));
    }

    #[test]
    fn test_coerce_position_type() {
        assert_eq!(coerce_position_type(Some("db"), 2), PositionType::Db);
        assert_eq!(coerce_position_type(Some("bait"), 2), PositionType::Ad);
        assert_eq!(coerce_position_type(None, 2), PositionType::Ad);
    }
}
