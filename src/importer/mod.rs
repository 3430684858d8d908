// ==========================================
// 供应商报价引擎 - 导入层
// ==========================================
// 职责: 外部文件 → 标准化行（报价 / 需求）
// 支持: Excel, CSV
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod offer_importer_impl;
pub mod offer_importer_trait;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{parse_price, parse_quantity, FieldMapperImpl};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use offer_importer_impl::OfferImporterImpl;

// 重导出 Trait 接口
pub use offer_importer_trait::{
    FieldMapper, FileParser, OfferColumns, OfferImporter, ParsedRow, ParsedSheet, RequestColumns,
};
