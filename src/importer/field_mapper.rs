// ==========================================
// 供应商报价引擎 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段映射 + 类型转换（带回退）
// 规则: 列名按别名表匹配（忽略大小写与首尾空白）
//       数值解析失败回退为 None，由下游取默认值 0
// ==========================================

use crate::domain::fulfillment::FulfillmentRequest;
use crate::domain::offer::RawOfferRow;
use crate::domain::supplier::SupplierKeyRule;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::offer_importer_trait::{
    FieldMapper as FieldMapperTrait, OfferColumns, ParsedRow, RequestColumns,
};

// ===== 列名别名表 =====
const SUPPLIER_CODE_ALIASES: &[&str] = &[
    "供应商编码", "供应商代码", "supplier_code", "supplier code", "supplier sap", "sap",
];
const SUPPLIER_NAME_ALIASES: &[&str] = &[
    "供应商", "供应商名称", "supplier", "supplier_name", "supplier name",
];
const BARCODE_ALIASES: &[&str] = &[
    "条码", "商品条码", "商品标识", "barcode", "ean", "product_id",
];
const EXTERNAL_CODE_ALIASES: &[&str] = &[
    "商品编码", "外部编码", "external_code", "product code", "sku", "code",
];
const PRODUCT_NAME_ALIASES: &[&str] = &[
    "商品名称", "品名", "product_name", "product name", "product", "name",
];
const PRICE_ALIASES: &[&str] = &[
    "含税单价", "单价", "价格", "price_with_vat", "price",
];
const QUANTITY_ALIASES: &[&str] = &[
    "数量", "可供数量", "库存", "quantity", "qty", "stock",
];

/// 在表头中查找第一个匹配别名的列（返回实际列名）
fn find_column(headers: &[String], aliases: &[&str]) -> Option<String> {
    aliases.iter().find_map(|alias| {
        headers
            .iter()
            .find(|h| h.trim().to_lowercase() == *alias)
            .cloned()
    })
}

/// 读取文本单元格（TRIM，空串 → None）
fn text(row: &ParsedRow, column: Option<&String>) -> Option<String> {
    column
        .and_then(|c| row.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 解析价格（接受小数逗号；非数值或非有限值 → None）
///
/// 逗号一律视为小数点，不识别千分位分组（"1.200,75" → None，入库价格为 0）
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|p| p.is_finite())
}

/// 解析数量（整数；接受整数值的小数写法如 "5.0"）
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    if let Ok(q) = trimmed.parse::<i64>() {
        return Some(q);
    }
    parse_price(trimmed)
        .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
        .map(|f| f as i64)
}

pub struct FieldMapperImpl {
    key_rule: SupplierKeyRule,
}

impl FieldMapperImpl {
    pub fn new(key_rule: SupplierKeyRule) -> Self {
        Self { key_rule }
    }
}

impl Default for FieldMapperImpl {
    fn default() -> Self {
        Self::new(SupplierKeyRule::default())
    }
}

impl FieldMapperTrait for FieldMapperImpl {
    fn resolve_offer_columns(&self, headers: &[String]) -> ImportResult<OfferColumns> {
        let supplier_code = find_column(headers, SUPPLIER_CODE_ALIASES);
        let supplier_name = find_column(headers, SUPPLIER_NAME_ALIASES);
        let barcode = find_column(headers, BARCODE_ALIASES);

        let mut missing = Vec::new();
        match self.key_rule {
            SupplierKeyRule::BusinessCode if supplier_code.is_none() => {
                missing.push("供应商编码".to_string())
            }
            SupplierKeyRule::NormalizedName if supplier_name.is_none() => {
                missing.push("供应商名称".to_string())
            }
            _ => {}
        }
        if barcode.is_none() {
            missing.push("条码".to_string());
        }

        let barcode = match barcode {
            Some(b) if missing.is_empty() => b,
            _ => return Err(ImportError::MissingColumns(missing)),
        };

        Ok(OfferColumns {
            supplier_code,
            supplier_name,
            barcode,
            external_code: find_column(headers, EXTERNAL_CODE_ALIASES),
            product_name: find_column(headers, PRODUCT_NAME_ALIASES),
            price: find_column(headers, PRICE_ALIASES),
            quantity: find_column(headers, QUANTITY_ALIASES),
        })
    }

    fn map_offer_row(&self, columns: &OfferColumns, row: &ParsedRow) -> RawOfferRow {
        let code = text(row, columns.supplier_code.as_ref());
        let name = text(row, columns.supplier_name.as_ref());

        RawOfferRow {
            row_number: row.row_number,
            supplier_key: self.key_rule.derive_key(code.as_deref(), name.as_deref()),
            supplier_name: self
                .key_rule
                .derive_display_name(code.as_deref(), name.as_deref()),
            barcode: text(row, Some(&columns.barcode)),
            external_code: text(row, columns.external_code.as_ref()),
            product_name: text(row, columns.product_name.as_ref()),
            price: text(row, columns.price.as_ref()).and_then(|v| parse_price(&v)),
            quantity: text(row, columns.quantity.as_ref()).and_then(|v| parse_quantity(&v)),
        }
    }

    fn resolve_request_columns(&self, headers: &[String]) -> ImportResult<RequestColumns> {
        let barcode = find_column(headers, BARCODE_ALIASES);
        let quantity = find_column(headers, QUANTITY_ALIASES);

        match (barcode, quantity) {
            (Some(barcode), Some(quantity)) => Ok(RequestColumns { barcode, quantity }),
            (barcode, quantity) => {
                let mut missing = Vec::new();
                if barcode.is_none() {
                    missing.push("条码".to_string());
                }
                if quantity.is_none() {
                    missing.push("数量".to_string());
                }
                Err(ImportError::MissingColumns(missing))
            }
        }
    }

    fn map_request_row(&self, columns: &RequestColumns, row: &ParsedRow) -> FulfillmentRequest {
        FulfillmentRequest {
            row_number: Some(row.row_number),
            product_id: text(row, Some(&columns.barcode)).unwrap_or_default(),
            quantity: text(row, Some(&columns.quantity))
                .and_then(|v| parse_quantity(&v))
                .unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn parsed(row_number: usize, pairs: &[(&str, &str)]) -> ParsedRow {
        ParsedRow {
            row_number,
            cells: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("12,5"), Some(12.5));
        assert_eq!(parse_price(" 1 200.75 "), Some(1200.75));
        assert_eq!(parse_price("abc"), None);
        assert_eq!(parse_price("inf"), None);
    }

    #[test]
    fn test_parse_price_rejects_grouped_decimal_comma() {
        assert_eq!(parse_price("1.200,75"), None);
        assert_eq!(parse_price("1,200.75"), None);
        assert_eq!(parse_price("1200,75"), Some(1200.75));
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("5"), Some(5));
        assert_eq!(parse_quantity("5.0"), Some(5));
        assert_eq!(parse_quantity("5,5"), None);
        assert_eq!(parse_quantity("many"), None);
    }

    #[test]
    fn test_resolve_columns_case_insensitive() {
        let mapper = FieldMapperImpl::default();
        let columns = mapper
            .resolve_offer_columns(&headers(&["Supplier", "BARCODE", "Price", "Qty"]))
            .unwrap();
        assert_eq!(columns.supplier_name.as_deref(), Some("Supplier"));
        assert_eq!(columns.barcode, "BARCODE");
        assert!(columns.product_name.is_none());
    }

    #[test]
    fn test_missing_required_columns() {
        let mapper = FieldMapperImpl::new(SupplierKeyRule::BusinessCode);
        let err = mapper
            .resolve_offer_columns(&headers(&["供应商", "单价"]))
            .unwrap_err();
        match err {
            ImportError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["供应商编码".to_string(), "条码".to_string()])
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_map_offer_row_with_fallbacks() {
        let mapper = FieldMapperImpl::default();
        let columns = mapper
            .resolve_offer_columns(&headers(&["供应商", "条码", "商品名称", "单价", "数量"]))
            .unwrap();

        let row = mapper.map_offer_row(
            &columns,
            &parsed(
                7,
                &[
                    ("供应商", "  Alpha   Trade "),
                    ("条码", "4600000000017"),
                    ("商品名称", ""),
                    ("单价", "n/a"),
                    ("数量", "3"),
                ],
            ),
        );

        assert_eq!(row.row_number, 7);
        assert_eq!(row.supplier_key.as_deref(), Some("alpha trade"));
        assert_eq!(row.supplier_name.as_deref(), Some("Alpha   Trade"));
        assert_eq!(row.product_name, None);
        assert_eq!(row.price, None);
        assert_eq!(row.price_or_default(), 0.0);
        assert_eq!(row.quantity, Some(3));
    }

    #[test]
    fn test_map_request_row() {
        let mapper = FieldMapperImpl::default();
        let columns = mapper
            .resolve_request_columns(&headers(&["barcode", "quantity"]))
            .unwrap();
        let request = mapper.map_request_row(&columns, &parsed(2, &[("barcode", "12345678"), ("quantity", "x")]));
        assert_eq!(request.product_id, "12345678");
        assert_eq!(request.quantity, 0);
        assert_eq!(request.row_number, Some(2));

        assert!(mapper.resolve_request_columns(&headers(&["barcode"])).is_err());
    }
}
