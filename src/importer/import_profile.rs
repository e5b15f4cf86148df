// ==========================================
// 实验室试剂库 - 导入类型描述表
// ==========================================
// 职责: 每种导入类型的列定义（必填/可选/默认规则/模板示例）、
//       表头同义词、主键与占位符
// 说明: 启动时构建一次，以引用传入列名规范化器/行处理器/模板生成器，
//       三者共用同一份声明
// ==========================================

use crate::domain::types::ImportType;
use crate::importer::column_normalizer::normalize_key;
use std::collections::HashMap;

/// 必填单元格的模板标记，同时是哨兵值
pub const REQUIRED_MARKER: &str = "Required";

/// 模板示例行使用的占位主键（导入时视为哨兵）
pub const PLACEHOLDER_IDS: [&str; 4] = ["ORF999", "PLS999", "ORG999", "FRZ999"];

// ==========================================
// DefaultRule - 可选列缺失时的默认规则
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultRule {
    Empty,        // ''
    CurrentDate,  // 导入当天 YYYY-MM-DD
    Boolean,      // 0/1，缺失为 0
    Integer,      // 缺失或无法解析为 0
    PositionType, // AD/DB，缺失或无法识别为 AD
}

impl DefaultRule {
    /// 缺失时的文本默认值
    pub fn fallback(&self, today: &str) -> String {
        match self {
            DefaultRule::Empty => String::new(),
            DefaultRule::CurrentDate => today.to_string(),
            DefaultRule::Boolean | DefaultRule::Integer => "0".to_string(),
            DefaultRule::PositionType => "AD".to_string(),
        }
    }
}

// ==========================================
// ColumnSpec - 单列声明
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub required: bool,
    pub default: DefaultRule,
    pub example: &'static str, // 模板示例值；CurrentDate 列在模板中替换为当天
}

// ==========================================
// ImportProfile - 单个导入类型的描述
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportProfile {
    import_type: ImportType,
    key_field: &'static str,
    placeholder: &'static str,
    columns: Vec<ColumnSpec>,
    synonyms: HashMap<String, &'static str>, // normalize_key(别名) → 规范列名
}

impl ImportProfile {
    fn builder(import_type: ImportType, key_field: &'static str, placeholder: &'static str) -> Self {
        Self {
            import_type,
            key_field,
            placeholder,
            columns: Vec::new(),
            synonyms: HashMap::new(),
        }
    }

    fn required(mut self, name: &'static str, example: &'static str) -> Self {
        self.columns.push(ColumnSpec {
            name,
            required: true,
            default: DefaultRule::Empty,
            example,
        });
        self
    }

    fn optional(mut self, name: &'static str, default: DefaultRule, example: &'static str) -> Self {
        self.columns.push(ColumnSpec {
            name,
            required: false,
            default,
            example,
        });
        self
    }

    fn synonym(mut self, alternate: &str, canonical: &'static str) -> Self {
        self.synonyms.insert(normalize_key(alternate), canonical);
        self
    }

    /// 收尾：规范列名映射到自身，并挂载共享别名中属于本类型的条目
    fn build(mut self) -> Self {
        let names: Vec<&'static str> = self.columns.iter().map(|c| c.name).collect();
        for name in &names {
            self.synonyms.insert(normalize_key(name), *name);
        }
        for &(alternate, canonical) in SHARED_SYNONYMS {
            if names.contains(&canonical) {
                self.synonyms
                    .entry(normalize_key(alternate))
                    .or_insert(canonical);
            }
        }
        self
    }

    pub fn import_type(&self) -> ImportType {
        self.import_type
    }

    pub fn key_field(&self) -> &'static str {
        self.key_field
    }

    pub fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn required_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.required)
            .map(|c| c.name)
            .collect()
    }

    /// 可选列的默认规则（未声明的列按空串处理）
    pub fn default_rule(&self, name: &str) -> DefaultRule {
        self.column(name)
            .map(|c| c.default)
            .unwrap_or(DefaultRule::Empty)
    }

    /// 表头 → 规范列名（精确匹配规范化后的键）
    pub fn canonical_for(&self, header: &str) -> Option<&'static str> {
        self.synonyms.get(&normalize_key(header)).copied()
    }

    /// 主键值是否为哨兵（模板 Required 行 / 占位主键 / 误入数据区的表头）
    pub fn is_sentinel(&self, key_value: &str) -> bool {
        let value = key_value.trim();
        value.eq_ignore_ascii_case(REQUIRED_MARKER)
            || PLACEHOLDER_IDS.contains(&value)
            || value.eq_ignore_ascii_case(self.key_field)
    }
}

// 按规范列名挂载：只有包含该规范列的导入类型才接受对应别名
const SHARED_SYNONYMS: &[(&str, &str)] = &[
    ("orf", "orf_id"),
    ("gene_id", "orf_id"),
    ("clone_id", "orf_id"),
    ("gene_name", "orf_name"),
    ("gene_symbol", "orf_name"),
    ("symbol", "orf_name"),
    ("sequence", "orf_sequence"),
    ("seq", "orf_sequence"),
    ("dna_sequence", "orf_sequence"),
    ("annotation", "orf_annotation"),
    ("with_stop", "orf_with_stop"),
    ("has_stop", "orf_with_stop"),
    ("stop_codon", "orf_with_stop"),
    ("open", "orf_open"),
    ("length", "orf_length_bp"),
    ("length_bp", "orf_length_bp"),
    ("bp", "orf_length_bp"),
    ("entrez_id", "orf_entrez_id"),
    ("entrez", "orf_entrez_id"),
    ("entrez_gene_id", "orf_entrez_id"),
    ("ensembl_id", "orf_ensembl_id"),
    ("ensembl", "orf_ensembl_id"),
    ("uniprot_id", "orf_uniprot_id"),
    ("uniprot", "orf_uniprot_id"),
    ("ref_url", "orf_ref_url"),
    ("reference_url", "orf_ref_url"),
    ("genus", "organism_genus"),
    ("species", "organism_species"),
    ("strain", "organism_strain"),
    ("location", "freezer_location"),
    ("condition", "freezer_condition"),
    ("storage_condition", "freezer_condition"),
    ("freezer", "freezer_id"),
    ("plasmid", "plasmid_id"),
    ("expression_host", "plasmid_express_organism"),
    ("express_organism", "plasmid_express_organism"),
    ("host", "plasmid_express_organism"),
    ("plate_id", "plate"),
    ("plate_name", "plate"),
    ("plate_number", "plate"),
    ("well_id", "well"),
    ("well_position", "well"),
    ("create_date", "orf_create_date"),
    ("date_created", "orf_create_date"),
    ("entry", "entry_position"),
    ("entry_pos", "entry_position"),
    ("is_entry", "entry_position"),
    ("ad_position", "yeast_ad_position"),
    ("yeast_ad", "yeast_ad_position"),
    ("is_ad", "yeast_ad_position"),
    ("db_position", "yeast_db_position"),
    ("yeast_db", "yeast_db_position"),
    ("is_db", "yeast_db_position"),
    ("fusion_type", "position_type"),
    ("source", "source_name"),
    ("source_detail", "source_details"),
    ("submitted_by", "submitter"),
    ("date_submitted", "submission_date"),
    ("note", "notes"),
    ("comments", "notes"),
];

// ==========================================
// ImportProfiles - 全部导入类型的描述表
// ==========================================
#[derive(Debug, Clone)]
pub struct ImportProfiles {
    profiles: HashMap<ImportType, ImportProfile>,
}

impl Default for ImportProfiles {
    fn default() -> Self {
        Self::standard()
    }
}

impl ImportProfiles {
    /// 标准描述表
    pub fn standard() -> Self {
        let profiles = [
            organism_profile(),
            plasmid_profile(),
            freezer_profile(),
            orf_sequence_profile(),
            orf_position_profile(),
            yeast_orf_position_profile(),
            orf_sources_profile(),
            unified_position_profile(),
        ]
        .into_iter()
        .map(|p| (p.import_type(), p))
        .collect();

        Self { profiles }
    }

    pub fn profile(&self, import_type: ImportType) -> Option<&ImportProfile> {
        self.profiles.get(&import_type)
    }
}

fn organism_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::Organism, "organism_id", "ORG999")
        .required("organism_id", "ORG999")
        .required("organism_name", "Example Organism")
        .optional("organism_genus", DefaultRule::Empty, "Example")
        .optional("organism_species", DefaultRule::Empty, "organism")
        .optional("organism_strain", DefaultRule::Empty, "XYZ")
        .synonym("name", "organism_name")
        .synonym("organism", "organism_name")
        .build()
}

fn plasmid_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::Plasmid, "plasmid_id", "PLS999")
        .required("plasmid_id", "PLS999")
        .required("plasmid_name", "pExample")
        .optional("plasmid_type", DefaultRule::Empty, "Expression")
        .optional("plasmid_express_organism", DefaultRule::Empty, "E. coli")
        .optional("plasmid_description", DefaultRule::Empty, "Example plasmid description")
        .synonym("name", "plasmid_name")
        .synonym("type", "plasmid_type")
        .synonym("description", "plasmid_description")
        .build()
}

fn freezer_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::Freezer, "freezer_id", "FRZ999")
        .required("freezer_id", "FRZ999")
        .required("freezer_location", "Example Location")
        .optional("freezer_condition", DefaultRule::Empty, "-80°C")
        .optional("freezer_date", DefaultRule::CurrentDate, "")
        .synonym("date", "freezer_date")
        .build()
}

fn orf_sequence_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::OrfSequence, "orf_id", "ORF999")
        .required("orf_id", "ORF999")
        .required("orf_name", "Example Gene")
        .required("orf_sequence", "ATGCTAGCTAGCTAGC")
        .optional("orf_annotation", DefaultRule::Empty, "Example Annotation")
        .optional("orf_with_stop", DefaultRule::Boolean, "1")
        .optional("orf_open", DefaultRule::Boolean, "1")
        .optional("orf_organism_id", DefaultRule::Empty, "ORG001")
        .optional("orf_length_bp", DefaultRule::Integer, "16")
        .optional("orf_entrez_id", DefaultRule::Empty, "12345")
        .optional("orf_ensembl_id", DefaultRule::Empty, "ENSG00000000000")
        .optional("orf_uniprot_id", DefaultRule::Empty, "P12345")
        .optional("orf_ref_url", DefaultRule::Empty, "https://example.com/gene")
        .synonym("name", "orf_name")
        .synonym("organism_id", "orf_organism_id")
        .build()
}

fn orf_position_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::OrfPosition, "orf_id", "ORF999")
        .required("orf_id", "ORF999")
        .required("plate", "P01")
        .required("well", "A01")
        .optional("freezer_id", DefaultRule::Empty, "FRZ001")
        .optional("plasmid_id", DefaultRule::Empty, "PLS001")
        .optional("orf_create_date", DefaultRule::CurrentDate, "")
        .build()
}

fn yeast_orf_position_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::YeastOrfPosition, "orf_id", "ORF999")
        .required("orf_id", "ORF999")
        .required("plate", "Y01")
        .required("well", "B02")
        .optional("position_type", DefaultRule::PositionType, "AD")
        .synonym("type", "position_type")
        .build()
}

fn orf_sources_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::OrfSources, "orf_id", "ORF999")
        .required("orf_id", "ORF999")
        .required("source_name", "Example Collection")
        .optional("source_details", DefaultRule::Empty, "Example clone set, batch 1")
        .optional("source_url", DefaultRule::Empty, "https://example.com/collection")
        .optional("submission_date", DefaultRule::CurrentDate, "")
        .optional("submitter", DefaultRule::Empty, "Example Submitter")
        .optional("notes", DefaultRule::Empty, "")
        .build()
}

fn unified_position_profile() -> ImportProfile {
    ImportProfile::builder(ImportType::UnifiedPosition, "orf_id", "ORF999")
        .required("orf_id", "ORF999")
        .required("orf_name", "Example Gene")
        .required("source_name", "Example Collection")
        // ORF 序列
        .optional("orf_sequence", DefaultRule::Empty, "ATGCTAGCTAGCTAGC")
        .optional("orf_annotation", DefaultRule::Empty, "Example Annotation")
        .optional("orf_with_stop", DefaultRule::Boolean, "1")
        .optional("orf_open", DefaultRule::Boolean, "0")
        .optional("orf_organism_id", DefaultRule::Empty, "")
        .optional("orf_length_bp", DefaultRule::Integer, "16")
        .optional("orf_entrez_id", DefaultRule::Empty, "12345")
        .optional("orf_ensembl_id", DefaultRule::Empty, "ENSG00000000000")
        .optional("orf_uniprot_id", DefaultRule::Empty, "P12345")
        .optional("orf_ref_url", DefaultRule::Empty, "https://example.com/gene")
        // 物种
        .optional("organism_id", DefaultRule::Empty, "ORG001")
        .optional("organism_name", DefaultRule::Empty, "Example Organism")
        .optional("organism_genus", DefaultRule::Empty, "Example")
        .optional("organism_species", DefaultRule::Empty, "organism")
        .optional("organism_strain", DefaultRule::Empty, "XYZ")
        // 冰箱
        .optional("freezer_id", DefaultRule::Empty, "FRZ001")
        .optional("freezer_location", DefaultRule::Empty, "Example Location")
        .optional("freezer_condition", DefaultRule::Empty, "-80°C")
        .optional("freezer_date", DefaultRule::CurrentDate, "")
        // 质粒
        .optional("plasmid_id", DefaultRule::Empty, "PLS001")
        .optional("plasmid_name", DefaultRule::Empty, "pExample")
        .optional("plasmid_type", DefaultRule::Empty, "Entry")
        .optional("plasmid_express_organism", DefaultRule::Empty, "E. coli")
        .optional("plasmid_description", DefaultRule::Empty, "")
        // 位置（组合串 Plate1-A1，或 yes/no 标记配合 plate/well 列）
        .optional("plate", DefaultRule::Empty, "P01")
        .optional("well", DefaultRule::Empty, "A01")
        .optional("entry_position", DefaultRule::Empty, "yes")
        .optional("yeast_ad_position", DefaultRule::Empty, "Y01-B02")
        .optional("yeast_db_position", DefaultRule::Empty, "")
        .optional("orf_create_date", DefaultRule::CurrentDate, "")
        // 来源
        .optional("source_details", DefaultRule::Empty, "Example clone set, batch 1")
        .optional("source_url", DefaultRule::Empty, "https://example.com/collection")
        .optional("submission_date", DefaultRule::CurrentDate, "")
        .optional("submitter", DefaultRule::Empty, "Example Submitter")
        .optional("notes", DefaultRule::Empty, "")
        .synonym("name", "orf_name")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_import_type_has_a_profile() {
        let profiles = ImportProfiles::standard();
        for t in ImportType::ALL {
            let profile = profiles.profile(t).unwrap();
            assert_eq!(profile.import_type(), t);
            assert!(profile.required_columns().contains(&profile.key_field()));
        }
    }

    #[test]
    fn test_synonyms_are_scoped_per_import_type() {
        let profiles = ImportProfiles::standard();
        let plasmid = profiles.profile(ImportType::Plasmid).unwrap();
        let orf = profiles.profile(ImportType::OrfSequence).unwrap();

        assert_eq!(plasmid.canonical_for("Name"), Some("plasmid_name"));
        assert_eq!(orf.canonical_for(" name "), Some("orf_name"));
        assert_eq!(orf.canonical_for("Gene ID"), Some("orf_id"));
        assert_eq!(orf.canonical_for("sequence"), Some("orf_sequence"));
        // 质粒类型没有 orf_sequence 列，不接受其别名
        assert_eq!(plasmid.canonical_for("sequence"), None);
    }

    #[test]
    fn test_unified_position_flag_synonyms() {
        let profiles = ImportProfiles::standard();
        let unified = profiles.profile(ImportType::UnifiedPosition).unwrap();

        assert_eq!(unified.canonical_for("is_ad"), Some("yeast_ad_position"));
        assert_eq!(unified.canonical_for("IS-DB"), Some("yeast_db_position"));
        assert_eq!(unified.required_columns(), vec!["orf_id", "orf_name", "source_name"]);
    }

    #[test]
    fn test_sentinel_values() {
        let profiles = ImportProfiles::standard();
        let orf = profiles.profile(ImportType::OrfSequence).unwrap();

        assert!(orf.is_sentinel("Required"));
        assert!(orf.is_sentinel("ORF999"));
        assert!(orf.is_sentinel("orf_id"));
        assert!(!orf.is_sentinel("ORF001"));
    }

    #[test]
    fn test_default_rules() {
        let profiles = ImportProfiles::standard();
        let freezer = profiles.profile(ImportType::Freezer).unwrap();

        assert_eq!(freezer.default_rule("freezer_date"), DefaultRule::CurrentDate);
        assert_eq!(freezer.default_rule("freezer_condition"), DefaultRule::Empty);
        assert_eq!(DefaultRule::CurrentDate.fallback("2024-05-01"), "2024-05-01");
        assert_eq!(DefaultRule::PositionType.fallback("2024-05-01"), "AD");
    }
}
