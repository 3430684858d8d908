// ==========================================
// 供应商报价引擎 - 合并结果领域模型
// ==========================================
// 职责: 单行处理结果（类型化）+ 合并报告
// 说明: 行级错误不抛出，收集为 RowOutcome::Invalid 计入报告
// ==========================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 行级校验错误（不中断批次）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RowValidationError {
    #[error("未填写供应商")]
    MissingSupplier,

    #[error("未填写条码")]
    MissingBarcode,

    #[error("条码格式无效: {0}")]
    InvalidBarcode(String),
}

/// 报价变更类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferChange {
    New,
    Updated,
    Unchanged,
}

/// 单行处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Applied(OfferChange),
    /// 同一文件内重复（附示例描述）
    Duplicate(String),
    Invalid {
        row_number: usize,
        error: RowValidationError,
    },
}

// ==========================================
// ConsolidationReport - 合并报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidationReport {
    pub batch_id: String,
    pub total_rows: usize,
    pub new_count: usize,
    pub updated_count: usize,
    pub unchanged_count: usize,
    pub skipped_count: usize,          // 文件内重复
    pub failed_count: usize,           // 行级校验失败
    pub dropped_count: usize,          // 回退逐行写入时失败而丢弃
    pub duplicate_examples: Vec<String>,
    pub failure_messages: Vec<String>,
    pub elapsed_ms: u64,
}

impl ConsolidationReport {
    pub fn new(batch_id: String) -> Self {
        Self {
            batch_id,
            ..Default::default()
        }
    }

    /// 记录单行结果
    ///
    /// # 参数
    /// - outcome: 单行结果
    /// - max_examples: 重复示例上限
    /// - max_failures: 失败信息上限
    ///
    /// # 返回
    /// - true: 该失败信息被保留（调用方据此决定是否输出 WARN 日志）
    pub fn record(&mut self, outcome: RowOutcome, max_examples: usize, max_failures: usize) -> bool {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Applied(OfferChange::New) => self.new_count += 1,
            RowOutcome::Applied(OfferChange::Updated) => self.updated_count += 1,
            RowOutcome::Applied(OfferChange::Unchanged) => self.unchanged_count += 1,
            RowOutcome::Duplicate(example) => {
                self.skipped_count += 1;
                if self.duplicate_examples.len() < max_examples {
                    self.duplicate_examples.push(example);
                    return true;
                }
            }
            RowOutcome::Invalid { row_number, error } => {
                self.failed_count += 1;
                if self.failure_messages.len() < max_failures {
                    self.failure_messages
                        .push(format!("行 {}: {}", row_number, error));
                    return true;
                }
            }
        }
        false
    }

    /// 写入的报价数（新增 + 更新 - 丢弃）
    pub fn written_count(&self) -> usize {
        (self.new_count + self.updated_count).saturating_sub(self.dropped_count)
    }

    /// 生成面向用户的摘要
    pub fn summary_message(&self) -> String {
        let mut message = format!(
            "新增 {} 条, 更新 {} 条, 未变化 {} 条, 文件内重复跳过 {} 条, 错误 {} 条",
            self.new_count,
            self.updated_count,
            self.unchanged_count,
            self.skipped_count,
            self.failed_count
        );
        if self.dropped_count > 0 {
            message.push_str(&format!(", 写入失败丢弃 {} 条", self.dropped_count));
        }
        message.push_str(&format!(". 耗时 {} ms", self.elapsed_ms));
        if !self.duplicate_examples.is_empty() {
            message.push_str(&format!(
                ". 重复示例: {}",
                self.duplicate_examples.join("; ")
            ));
        }
        message
    }
}
