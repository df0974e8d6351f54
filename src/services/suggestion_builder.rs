//! 建议生成器 - 业务能力层
//!
//! 把 (段落, 建议修改) 变成可独立接受的建议记录，每条分配新的唯一 ID。
//! Oracle 路径和规则兜底路径都经过这里，产出的记录结构完全相同。

use tracing::debug;

use crate::models::Suggestion;
use crate::services::batcher::Recommendation;

/// 生成建议记录，保持输入顺序
pub fn build_suggestions(recommendations: Vec<Recommendation>) -> Vec<Suggestion> {
    let suggestions: Vec<Suggestion> = recommendations
        .into_iter()
        .map(|rec| Suggestion::for_unit(&rec.unit, rec.change.suggested_text, rec.change.reason))
        .collect();

    debug!("生成 {} 条建议", suggestions.len());
    suggestions
}
