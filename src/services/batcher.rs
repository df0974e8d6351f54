//! 批处理器 - 业务能力层
//!
//! ## 职责
//!
//! 1. 把段落单元按固定大小分成批次，限制单次 Oracle 请求的规模
//! 2. 每个批次内使用局部序号（0..批次大小）构造请求文本
//! 3. 把 Oracle 按局部序号返回的结果映射回段落的全局索引
//! 4. 单个批次失败只记录日志并跳过，不影响其他批次
//!
//! 批次之间并发执行，并发数由 `Semaphore` 限制；每个批次只调用一次。

use std::collections::HashSet;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::OracleFailure;
use crate::models::ParagraphUnit;
use crate::services::oracle::{decode_response, Oracle, ProposedChange, SuggestionBatch};

/// 每个批次的默认段落数
pub const BATCH_SIZE: usize = 5;

/// 批次内段落之间的分隔符
pub const PARAGRAPH_SEPARATOR: &str = "\n\n---PARAGRAPH SEPARATOR---\n\n";

/// 一个批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchWindow {
    /// 批次编号（从 0 开始）
    pub number: usize,
    /// 批次内的段落，下标即局部序号
    pub units: Vec<ParagraphUnit>,
}

impl BatchWindow {
    /// 局部序号 → 段落单元
    pub fn resolve(&self, ordinal: usize) -> Option<&ParagraphUnit> {
        self.units.get(ordinal)
    }

    /// (局部序号, 全局段落索引) 对照表
    pub fn correlation_map(&self) -> Vec<(usize, usize)> {
        self.units
            .iter()
            .enumerate()
            .map(|(ordinal, unit)| (ordinal, unit.index))
            .collect()
    }

    /// 发送给 Oracle 的批次文本，段落以局部序号标记
    pub fn prompt_text(&self) -> String {
        self.units
            .iter()
            .enumerate()
            .map(|(ordinal, unit)| format!("[PARAGRAPH {}]\n{}", ordinal, unit.text))
            .collect::<Vec<_>>()
            .join(PARAGRAPH_SEPARATOR)
    }

    /// 批次中第一个段落的全局索引（用于日志）
    pub fn first_index(&self) -> Option<usize> {
        self.units.first().map(|u| u.index)
    }

    /// 把解码后的结果映射回段落
    ///
    /// - 超出批次范围的局部序号被忽略
    /// - 同一局部序号出现多次时只保留第一次
    /// - 建议文本与原文相同视为无修改
    pub fn correlate(&self, batch: SuggestionBatch) -> Vec<Recommendation> {
        let mut seen = HashSet::new();
        let mut recommendations = Vec::new();

        for entry in batch.entries {
            let Some(unit) = self.resolve(entry.paragraph_number) else {
                warn!(
                    "批次 {} 返回了不存在的段落序号 {}，已忽略",
                    self.number, entry.paragraph_number
                );
                continue;
            };

            if !seen.insert(entry.paragraph_number) {
                warn!(
                    "批次 {} 重复返回段落序号 {}，只保留第一条",
                    self.number, entry.paragraph_number
                );
                continue;
            }

            match entry.change {
                Some(change) if change.suggested_text.trim() != unit.text.trim() => {
                    recommendations.push(Recommendation {
                        unit: unit.clone(),
                        change,
                    });
                }
                _ => {}
            }
        }

        recommendations
    }
}

/// 段落 + 建议修改，交给建议生成器生成建议记录
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub unit: ParagraphUnit,
    pub change: ProposedChange,
}

/// 所有批次的汇总结果
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// 按批次顺序排列的建议
    pub recommendations: Vec<Recommendation>,
    pub windows_total: usize,
    pub windows_failed: usize,
}

/// 按固定大小切分批次（`window_size` 为 0 时按 1 处理）
pub fn partition(units: Vec<ParagraphUnit>, window_size: usize) -> Vec<BatchWindow> {
    let window_size = window_size.max(1);
    let mut windows: Vec<BatchWindow> = Vec::new();

    for unit in units {
        match windows.last_mut() {
            Some(window) if window.units.len() < window_size => window.units.push(unit),
            _ => windows.push(BatchWindow {
                number: windows.len(),
                units: vec![unit],
            }),
        }
    }

    windows
}

/// 处理单个批次：调用 Oracle → 严格解码 → 映射回段落
pub async fn run_window(
    oracle: &dyn Oracle,
    window: &BatchWindow,
    instruction: &str,
) -> Result<Vec<Recommendation>, OracleFailure> {
    debug!(
        "批次 {} 调用 {}，段落数: {}",
        window.number,
        oracle.name(),
        window.units.len()
    );

    let raw = oracle.complete(&window.prompt_text(), instruction).await?;
    let batch = decode_response(&raw)?;
    Ok(window.correlate(batch))
}

/// 并发处理所有批次，失败的批次记录日志后跳过
pub async fn run_all(
    oracle: &dyn Oracle,
    windows: &[BatchWindow],
    instruction: &str,
    max_concurrent: usize,
) -> BatchOutcome {
    let semaphore = Semaphore::new(max_concurrent.max(1));

    let tasks = windows.iter().map(|window| {
        let semaphore = &semaphore;
        async move {
            // 信号量不会被关闭
            let _permit = semaphore.acquire().await.ok();
            (window, run_window(oracle, window, instruction).await)
        }
    });

    let mut outcome = BatchOutcome {
        windows_total: windows.len(),
        ..Default::default()
    };

    for (window, result) in join_all(tasks).await {
        match result {
            Ok(recommendations) => outcome.recommendations.extend(recommendations),
            Err(e) => {
                warn!(
                    "批次 {} (起始段落 {:?}) 处理失败，已跳过: {}",
                    window.number,
                    window.first_index(),
                    e
                );
                outcome.windows_failed += 1;
            }
        }
    }

    outcome
}
