// ==========================================
// 供应商报价引擎 - 报价领域模型
// ==========================================
// 职责: Offer 实体 / 导入中间行 / 条码规则
// 红线: 每个 (supplier_key, barcode) 至多一条当前报价
// ==========================================

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// 条码格式（8-14 位数字）
pub const BARCODE_PATTERN: &str = r"^[0-9]{8,14}$";

static BARCODE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(BARCODE_PATTERN).unwrap_or_else(|e| panic!("条码正则无效: {}", e))
});

/// 校验条码格式
pub fn is_valid_barcode(barcode: &str) -> bool {
    BARCODE_RE.is_match(barcode)
}

// ==========================================
// Offer - 供应商当前报价
// ==========================================
// offer_id 为 None 表示尚未落库（新报价）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub offer_id: Option<i64>,
    pub supplier_key: String,            // 供应商键（FK → supplier）
    pub barcode: String,                 // 条码 / 商品标识
    pub external_code: Option<String>,   // 外部商品编码
    pub product_name: Option<String>,    // 商品名称
    pub price_with_vat: f64,             // 含税单价（缺失为 0）
    pub quantity: i64,                   // 可供数量（缺失为 0）
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Offer {
    /// 由已校验的导入行构造新报价
    pub fn from_row(supplier_key: &str, barcode: &str, row: &RawOfferRow) -> Self {
        let now = Utc::now();
        Self {
            offer_id: None,
            supplier_key: supplier_key.to_string(),
            barcode: barcode.to_string(),
            external_code: row.external_code.clone(),
            product_name: row.product_name.clone(),
            price_with_vat: row.price_or_default(),
            quantity: row.quantity_or_default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// 与导入行逐字段比较（精确相等，不做容差）
    pub fn differs_from(&self, row: &RawOfferRow) -> bool {
        self.external_code != row.external_code
            || self.product_name != row.product_name
            || self.price_with_vat != row.price_or_default()
            || self.quantity != row.quantity_or_default()
    }

    /// 用导入行覆盖可变字段
    pub fn apply_row(&mut self, row: &RawOfferRow) {
        self.external_code = row.external_code.clone();
        self.product_name = row.product_name.clone();
        self.price_with_vat = row.price_or_default();
        self.quantity = row.quantity_or_default();
        self.updated_at = Utc::now();
    }

    pub fn is_persisted(&self) -> bool {
        self.offer_id.is_some()
    }
}

// ==========================================
// CatalogOffer - 目录读取视图（报价 + 供应商显示名）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogOffer {
    pub offer: Offer,
    pub supplier_name: String,
}

// ==========================================
// RawOfferRow - 导入中间结构体
// ==========================================
// 用途: 文件解析 → 字段映射 → 此结构 → Consolidator
// 说明: 字段已 TRIM，空串已转为 None；数值解析失败已回退为 None
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOfferRow {
    pub row_number: usize,                 // 原始文件行号（表头为第 1 行）
    pub supplier_key: Option<String>,      // 已按规则派生的供应商键
    pub supplier_name: Option<String>,     // 供应商显示名称
    pub barcode: Option<String>,
    pub external_code: Option<String>,
    pub product_name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
}

impl RawOfferRow {
    pub fn price_or_default(&self) -> f64 {
        self.price.filter(|p| p.is_finite()).unwrap_or(0.0)
    }

    pub fn quantity_or_default(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(price: Option<f64>, quantity: Option<i64>) -> RawOfferRow {
        RawOfferRow {
            row_number: 2,
            supplier_key: Some("alpha".to_string()),
            supplier_name: Some("Alpha".to_string()),
            barcode: Some("4606068663735".to_string()),
            external_code: Some("A-1".to_string()),
            product_name: Some("Milk".to_string()),
            price,
            quantity,
        }
    }

    #[test]
    fn test_barcode_pattern() {
        assert!(is_valid_barcode("12345678"));
        assert!(is_valid_barcode("12345678901234"));
        assert!(!is_valid_barcode("1234567"));
        assert!(!is_valid_barcode("123456789012345"));
        assert!(!is_valid_barcode("abc"));
        assert!(!is_valid_barcode("1234 5678"));
        assert!(!is_valid_barcode(""));
    }

    #[test]
    fn test_missing_numbers_default_to_zero() {
        let offer = Offer::from_row("alpha", "4606068663735", &row(None, None));
        assert_eq!(offer.price_with_vat, 0.0);
        assert_eq!(offer.quantity, 0);
        assert!(!offer.is_persisted());
    }

    #[test]
    fn test_non_finite_price_defaults_to_zero() {
        assert_eq!(row(Some(f64::NAN), Some(1)).price_or_default(), 0.0);
    }

    #[test]
    fn test_differs_from_exact_comparison() {
        let offer = Offer::from_row("alpha", "4606068663735", &row(Some(10.5), Some(3)));
        assert!(!offer.differs_from(&row(Some(10.5), Some(3))));
        assert!(offer.differs_from(&row(Some(10.500001), Some(3))));
        assert!(offer.differs_from(&row(Some(10.5), Some(4))));

        let mut renamed = row(Some(10.5), Some(3));
        renamed.product_name = None;
        assert!(offer.differs_from(&renamed));
    }
}
