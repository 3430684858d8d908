// ==========================================
// 供应商报价引擎 - 配货方案领域模型
// ==========================================
// 职责: 需求行 / 配货方案 / 方案行
// 生命周期: 每次分析临时生成，不落库
// ==========================================

use serde::{Deserialize, Serialize};

/// 需求行（商品标识 + 数量）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FulfillmentRequest {
    pub row_number: Option<usize>, // 来源文件行号（非文件来源为 None）
    pub product_id: String,
    pub quantity: i64,
}

impl FulfillmentRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        Self {
            row_number: None,
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// 方案状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanStatus {
    Fulfilled,          // 全部满足
    PartiallyFulfilled, // 部分满足（存在缺口）
    NotFound,           // 目录中无此商品
    NoStock,            // 有报价但均无库存
    InvalidRequest,     // 需求行格式错误
}

impl PlanStatus {
    pub fn requires_manual_processing(&self) -> bool {
        !matches!(self, PlanStatus::Fulfilled)
    }
}

/// 方案行（单个供应商的采购量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub supplier_key: String,
    pub supplier_name: String,
    pub price: f64,
    pub quantity_taken: i64,
    pub supplier_available_quantity: i64,
}

impl LineItem {
    pub fn cost(&self) -> f64 {
        self.quantity_taken as f64 * self.price
    }
}

// ==========================================
// FulfillmentPlan - 配货方案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FulfillmentPlan {
    pub row_number: Option<usize>,    // 来源需求行号
    pub product_id: String,
    pub requested_quantity: i64,
    pub product_name: Option<String>,
    pub product_name_suspect: bool,   // 商品名与供应商名相同（源数据缺陷）
    pub line_items: Vec<LineItem>,    // 按价格升序
    pub total_cost: Option<f64>,      // 未采购任何数量时为 None
    pub shortfall: i64,
    pub status: PlanStatus,
    pub requires_manual_processing: bool,
    pub message: String,
}

impl FulfillmentPlan {
    /// 构造需人工处理、无方案行的结果
    pub fn manual(request: &FulfillmentRequest, status: PlanStatus, message: String) -> Self {
        Self {
            row_number: request.row_number,
            product_id: request.product_id.trim().to_string(),
            requested_quantity: request.quantity,
            product_name: None,
            product_name_suspect: false,
            line_items: Vec::new(),
            total_cost: None,
            shortfall: request.quantity.max(0),
            status,
            requires_manual_processing: status.requires_manual_processing(),
            message,
        }
    }

    pub fn taken_quantity(&self) -> i64 {
        self.line_items.iter().map(|l| l.quantity_taken).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_plan() {
        let request = FulfillmentRequest::new("abc", 5);
        let plan = FulfillmentPlan::manual(&request, PlanStatus::InvalidRequest, "x".to_string());
        assert!(plan.requires_manual_processing);
        assert!(plan.total_cost.is_none());
        assert_eq!(plan.shortfall, 5);
        assert_eq!(plan.taken_quantity(), 0);
    }

    #[test]
    fn test_manual_plan_keeps_row_and_trims_product_id() {
        let request = FulfillmentRequest {
            row_number: Some(7),
            product_id: " 12345678 ".to_string(),
            quantity: 1,
        };
        let plan = FulfillmentPlan::manual(&request, PlanStatus::NotFound, "x".to_string());
        assert_eq!(plan.product_id, "12345678");
        assert_eq!(plan.row_number, Some(7));
    }

    #[test]
    fn test_only_fulfilled_is_automatic() {
        assert!(!PlanStatus::Fulfilled.requires_manual_processing());
        assert!(PlanStatus::PartiallyFulfilled.requires_manual_processing());
        assert!(PlanStatus::NotFound.requires_manual_processing());
        assert!(PlanStatus::NoStock.requires_manual_processing());
    }
}
