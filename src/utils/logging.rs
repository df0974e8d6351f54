/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::workflow::analysis_flow::{AnalysisMode, AnalysisReport};
use crate::workflow::doc_ctx::DocCtx;

/// 初始化全局日志
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复调用无副作用。
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 程序启动 - 文档建议服务 ({})",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("📁 上传目录: {}", config.upload_dir.display());
    if config.oracle_configured() {
        info!("🤖 LLM 模型: {} ({})", config.llm_model_name, config.llm_api_base_url);
    } else {
        warn!("⚠️ 未配置 OPENAI_API_KEY，将使用规则兜底生成建议");
    }
    info!(
        "📦 每批 {} 段，最多 {} 个批次并发",
        config.batch_size, config.max_concurrent_windows
    );
    info!("{}", "=".repeat(60));
}

/// 记录分析开始信息
pub fn log_analysis_start(ctx: &DocCtx, paragraphs: usize, units: usize, mode: AnalysisMode) {
    info!("\n{}", "=".repeat(60));
    info!("🔍 {} 开始分析 ({:?})", ctx, mode);
    info!("📄 段落总数: {}，参与分析: {}", paragraphs, units);
    info!("{}", "=".repeat(60));
}

/// 记录分析完成信息
pub fn log_analysis_complete(ctx: &DocCtx, report: &AnalysisReport) {
    info!("\n{}", "─".repeat(60));
    info!("✓ {} 分析完成: 共 {} 条建议", ctx, report.suggestions.len());
    if report.windows_total > 0 {
        info!(
            "📦 批次: 成功 {}/{}",
            report.windows_total - report.windows_failed,
            report.windows_total
        );
    }
    if report.windows_failed > 0 && report.windows_failed == report.windows_total {
        warn!("⚠️ {} 所有批次均失败，结果与\"无需修改\"无法区分", ctx);
    }
    info!("{}", "─".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("这是一段很长的中文文本", 4), "这是一段...");
    }

    #[test]
    fn test_init_twice() {
        init(false);
        init(true);
    }
}
