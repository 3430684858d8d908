// ==========================================
// 供应商报价引擎 - 文件解析器实现
// ==========================================
// 职责: 单元格 → 文本（不做业务判断）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::offer_importer_trait::{FileParser, ParsedRow, ParsedSheet};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// 整数值浮点单元格的最大安全范围（超出则保留原始格式）
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// 由表头行推断分隔符（分号多于逗号时使用分号）
fn detect_delimiter(header_line: &str) -> u8 {
    let semicolons = header_line.matches(';').count();
    let commas = header_line.matches(',').count();
    if semicolons > commas {
        b';'
    } else {
        b','
    }
}

/// Excel 单元格转文本
///
/// 整数值的浮点单元格不带小数部分输出（条码常以数字格式存储）
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.is_finite() && f.fract() == 0.0 && f.abs() < MAX_EXACT_INTEGER {
                format!("{}", *f as i64)
            } else {
                f.to_string()
            }
        }
        other => other.to_string().trim().to_string(),
    }
}

fn push_row(records: &mut Vec<ParsedRow>, row_number: usize, cells: HashMap<String, String>) {
    // 跳过完全空白的行
    if cells.values().all(|v| v.is_empty()) {
        return;
    }
    records.push(ParsedRow { row_number, cells });
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut first_line = String::new();
        BufReader::new(File::open(file_path)?).read_line(&mut first_line)?;
        if first_line.trim().is_empty() {
            return Err(ImportError::MissingHeader);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(detect_delimiter(&first_line))
            .from_path(file_path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let mut cells = HashMap::new();
            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    cells.insert(header.clone(), value.trim().to_string());
                }
            }
            push_row(&mut records, row_number, cells);
        }

        Ok(ParsedSheet {
            headers,
            rows: records,
        })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
// 只读取第一个工作表
pub struct ExcelParser;

impl FileParser for ExcelParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::MissingHeader)?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| normalize_header(&cell_to_string(cell)))
            .collect();

        let mut records = Vec::new();
        for (idx, data_row) in rows.enumerate() {
            // 表头所在行号为 first_row + 1
            let row_number = first_row + idx + 2;
            let mut cells = HashMap::new();
            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    cells.insert(header.clone(), cell_to_string(cell));
                }
            }
            push_row(&mut records, row_number, cells);
        }

        Ok(ParsedSheet {
            headers,
            rows: records,
        })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse(&self, file_path: &Path) -> ImportResult<ParsedSheet> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse(file_path),
            "xlsx" | "xls" => ExcelParser.parse(file_path),
            other => {
                ensure_exists(file_path)?;
                Err(ImportError::UnsupportedFormat(other.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["供应商,条码,单价", "Alpha,4600000000017,12.5", "Beta,4600000000024,8"]);

        let sheet = CsvParser.parse(temp_file.path()).unwrap();

        assert_eq!(sheet.headers, vec!["供应商", "条码", "单价"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].row_number, 2);
        assert_eq!(sheet.rows[0].get("条码"), Some("4600000000017"));
        assert_eq!(sheet.rows[1].get("单价"), Some("8"));
    }

    #[test]
    fn test_csv_parser_semicolon_and_blank_rows() {
        let temp_file = csv_file(&["supplier;barcode;price", "Alpha;12345678;12,5", ";;", "Beta;87654321;3"]);

        let sheet = CsvParser.parse(temp_file.path()).unwrap();

        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.rows[0].get("price"), Some("12,5"));
        assert_eq!(sheet.rows[1].row_number, 4);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_empty_csv_has_no_header() {
        let temp_file = csv_file(&[]);
        assert!(matches!(
            CsvParser.parse(temp_file.path()),
            Err(ImportError::MissingHeader)
        ));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            UniversalFileParser.parse(temp_file.path()),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_cell_to_string_integral_float() {
        assert_eq!(cell_to_string(&Data::Float(4600000000017.0)), "4600000000017");
        assert_eq!(cell_to_string(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::String("  x ".to_string())), "x");
        assert_eq!(cell_to_string(&Data::Empty), "");
    }
}
