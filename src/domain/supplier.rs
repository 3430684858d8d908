// ==========================================
// 供应商报价引擎 - 供应商领域模型
// ==========================================
// 职责: 供应商实体 + 供应商身份规则（可插拔）
// 生命周期: 首次出现时创建，仅允许刷新显示名称，核心层从不删除
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// Supplier - 供应商
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_key: String,    // 供应商键（业务编码或规范化名称）
    pub display_name: String,    // 显示名称
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    pub fn new(supplier_key: String, display_name: String) -> Self {
        let now = Utc::now();
        Self {
            supplier_key,
            display_name,
            created_at: now,
            updated_at: now,
        }
    }

    /// 刷新显示名称
    ///
    /// # 返回
    /// - true: 名称发生变化（需要落库）
    /// - false: 名称为空或未变化
    pub fn refresh_display_name(&mut self, display_name: &str) -> bool {
        let trimmed = display_name.trim();
        if trimmed.is_empty() || trimmed == self.display_name {
            return false;
        }
        self.display_name = trimmed.to_string();
        self.updated_at = Utc::now();
        true
    }
}

// ==========================================
// SupplierKeyRule - 供应商身份规则
// ==========================================
// BUSINESS_CODE: 使用供应商编码列
// NORMALIZED_NAME: 使用规范化后的供应商名称（TRIM + 合并空白 + 小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplierKeyRule {
    BusinessCode,
    #[default]
    NormalizedName,
}

impl SupplierKeyRule {
    /// 根据规则派生供应商键
    ///
    /// # 参数
    /// - code: 供应商编码（可能为空）
    /// - name: 供应商名称（可能为空）
    ///
    /// # 返回
    /// - Some(key): 派生成功
    /// - None: 规则所需字段为空
    pub fn derive_key(&self, code: Option<&str>, name: Option<&str>) -> Option<String> {
        match self {
            SupplierKeyRule::BusinessCode => code
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            SupplierKeyRule::NormalizedName => name.and_then(normalize_supplier_name),
        }
    }

    /// 派生显示名称（名称优先，缺失时回退到编码）
    pub fn derive_display_name(&self, code: Option<&str>, name: Option<&str>) -> Option<String> {
        name.map(str::trim)
            .filter(|n| !n.is_empty())
            .or_else(|| code.map(str::trim).filter(|c| !c.is_empty()))
            .map(str::to_string)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierKeyRule::BusinessCode => "BUSINESS_CODE",
            SupplierKeyRule::NormalizedName => "NORMALIZED_NAME",
        }
    }
}

impl fmt::Display for SupplierKeyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SupplierKeyRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BUSINESS_CODE" => Ok(SupplierKeyRule::BusinessCode),
            "NORMALIZED_NAME" => Ok(SupplierKeyRule::NormalizedName),
            other => Err(format!("未知的供应商键规则: {}", other)),
        }
    }
}

/// 规范化供应商名称: TRIM + 合并连续空白 + 小写
pub fn normalize_supplier_name(name: &str) -> Option<String> {
    let normalized = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
