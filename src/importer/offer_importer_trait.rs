// ==========================================
// 供应商报价引擎 - 导入 Trait
// ==========================================
// 职责: 定义报价导入与需求分析接口（不包含实现）
// ==========================================

use crate::domain::consolidation::ConsolidationReport;
use crate::domain::fulfillment::{FulfillmentPlan, FulfillmentRequest};
use crate::domain::offer::RawOfferRow;
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;

/// 文件解析后的单行（列名 → 文本值）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRow {
    pub row_number: usize, // 表头为第 1 行
    pub cells: HashMap<String, String>,
}

impl ParsedRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }
}

/// 文件解析结果（表头 + 非空数据行）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<ParsedRow>,
}

/// 报价文件列映射（值为文件中的实际列名）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferColumns {
    pub supplier_code: Option<String>,
    pub supplier_name: Option<String>,
    pub barcode: String,
    pub external_code: Option<String>,
    pub product_name: Option<String>,
    pub price: Option<String>,
    pub quantity: Option<String>,
}

/// 需求文件列映射
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestColumns {
    pub barcode: String,
    pub quantity: String,
}

// ==========================================
// OfferImporter Trait
// ==========================================
// 实现者: OfferImporterImpl
#[async_trait]
pub trait OfferImporter: Send + Sync {
    /// 导入供应商报价文件
    ///
    /// # 返回
    /// - Ok(ConsolidationReport): 合并报告（含行级错误、文件内重复统计）
    /// - Err: 整文件错误（文件不可读、缺少必需列、仓储失败），目录无任何变化
    async fn import_file(&self, file_path: &Path) -> ImportResult<ConsolidationReport>;

    /// 导入已标准化的行
    async fn import_rows(&self, rows: Vec<RawOfferRow>) -> ImportResult<ConsolidationReport>;

    /// 读取需求文件并生成配货方案
    async fn analyze_file(&self, file_path: &Path) -> ImportResult<Vec<FulfillmentPlan>>;

    /// 对已给出的需求行生成配货方案
    async fn analyze_requests(
        &self,
        requests: Vec<FulfillmentRequest>,
    ) -> ImportResult<Vec<FulfillmentPlan>>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为表头 + 行记录（跳过完全空白的行）
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 定位报价文件各字段所在列，必需列缺失为整文件错误
    fn resolve_offer_columns(&self, headers: &[String]) -> ImportResult<OfferColumns>;

    /// 将原始行映射为 RawOfferRow（数值解析失败回退为 None）
    fn map_offer_row(&self, columns: &OfferColumns, row: &ParsedRow) -> RawOfferRow;

    /// 定位需求文件各字段所在列
    fn resolve_request_columns(&self, headers: &[String]) -> ImportResult<RequestColumns>;

    /// 将原始行映射为需求行（数量解析失败回退为 0）
    fn map_request_row(&self, columns: &RequestColumns, row: &ParsedRow) -> FulfillmentRequest;
}
