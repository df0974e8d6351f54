//! 分析流程 - 流程层
//!
//! 核心职责：定义"一次分析"的完整处理流程
//!
//! 流程顺序：
//! 1. 段落切分（过滤空段落和短段落）
//! 2. 有 Oracle：分批 → 并发调用 → 严格解码 → 映射回段落
//!    无 Oracle：规则兜底
//! 3. 生成建议记录
//!
//! 单个批次失败不会让整个分析失败；所有批次都失败时结果为空列表。

use std::sync::Arc;

use tracing::info;

use crate::clients::LlmClient;
use crate::config::Config;
use crate::models::Suggestion;
use crate::services::{batcher, fallback, segmenter, suggestion_builder, Oracle};
use crate::utils::logging::{log_analysis_complete, log_analysis_start};
use crate::workflow::doc_ctx::DocCtx;

/// 建议来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisMode {
    /// 调用外部 Oracle
    Oracle,
    /// 规则兜底
    Fallback,
}

/// 一次分析的结果
#[derive(Debug, Default)]
pub struct AnalysisReport {
    pub suggestions: Vec<Suggestion>,
    /// 通过切分的段落数
    pub units: usize,
    pub windows_total: usize,
    pub windows_failed: usize,
}

/// 分析流程
///
/// - 编排 切分 → 分批 → Oracle / 兜底 → 生成建议
/// - 不持有文档，也不写存储
pub struct AnalysisFlow {
    oracle: Option<Arc<dyn Oracle>>,
    batch_size: usize,
    min_words: usize,
    max_concurrent_windows: usize,
}

impl AnalysisFlow {
    /// 根据配置创建：配置了 API Key 时使用 LLM，否则使用规则兜底
    pub fn new(config: &Config) -> Self {
        let oracle: Option<Arc<dyn Oracle>> = if config.oracle_configured() {
            Some(Arc::new(LlmClient::new(config)))
        } else {
            None
        };
        Self::build(config, oracle)
    }

    /// 使用指定的 Oracle
    pub fn with_oracle(config: &Config, oracle: Arc<dyn Oracle>) -> Self {
        Self::build(config, Some(oracle))
    }

    /// 只使用规则兜底
    pub fn fallback_only(config: &Config) -> Self {
        Self::build(config, None)
    }

    fn build(config: &Config, oracle: Option<Arc<dyn Oracle>>) -> Self {
        Self {
            oracle,
            batch_size: config.batch_size,
            min_words: config.min_words,
            max_concurrent_windows: config.max_concurrent_windows,
        }
    }

    pub fn mode(&self) -> AnalysisMode {
        if self.oracle.is_some() {
            AnalysisMode::Oracle
        } else {
            AnalysisMode::Fallback
        }
    }

    /// 对一份段落快照执行分析
    pub async fn run(&self, ctx: &DocCtx, paragraphs: &[String], instruction: &str) -> AnalysisReport {
        let units = segmenter::segment(paragraphs, self.min_words);
        let unit_count = units.len();

        log_analysis_start(ctx, paragraphs.len(), unit_count, self.mode());

        let mut report = AnalysisReport {
            units: unit_count,
            ..Default::default()
        };

        let recommendations = match &self.oracle {
            Some(oracle) => {
                let windows = batcher::partition(units, self.batch_size);
                let outcome = batcher::run_all(
                    oracle.as_ref(),
                    &windows,
                    instruction,
                    self.max_concurrent_windows,
                )
                .await;
                report.windows_total = outcome.windows_total;
                report.windows_failed = outcome.windows_failed;
                outcome.recommendations
            }
            None => {
                info!("{} 未配置 LLM，使用规则兜底", ctx);
                fallback::recommend(&units, instruction)
            }
        };

        report.suggestions = suggestion_builder::build_suggestions(recommendations);

        log_analysis_complete(ctx, &report);

        report
    }
}
