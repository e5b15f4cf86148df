// ==========================================
// 实验室试剂库 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（config_kv 表）、ImportSettings（内存值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 位置/来源写入前是否校验 ORF 已存在
    ///
    /// # 默认值
    /// - false
    async fn get_validate_orf_references(&self) -> ConfigResult<bool>;

    /// 结果消息中展示的错误条数上限（完整列表仍在 errors 中）
    ///
    /// # 默认值
    /// - 10
    async fn get_error_display_limit(&self) -> ConfigResult<usize>;
}

// ==========================================
// ImportSettings - 固定值配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSettings {
    pub validate_orf_references: bool,
    pub error_display_limit: usize,
    /// 建库时是否开启位置唯一约束
    pub unique_positions: bool,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            validate_orf_references: false,
            error_display_limit: 10,
            unique_positions: false,
        }
    }
}

#[async_trait]
impl ImportConfigReader for ImportSettings {
    async fn get_validate_orf_references(&self) -> ConfigResult<bool> {
        Ok(self.validate_orf_references)
    }

    async fn get_error_display_limit(&self) -> ConfigResult<usize> {
        Ok(self.error_display_limit)
    }
}
