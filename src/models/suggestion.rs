use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ParagraphUnit;

/// 单条修改建议
///
/// `paragraph_index` 只对产生这条建议的那次分析所使用的原文档有效。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: String,
    pub paragraph_index: usize,
    pub original: String,
    pub suggested: String,
    pub reason: String,
}

impl Suggestion {
    /// 为段落生成一条新建议，分配全局唯一 ID
    pub fn for_unit(
        unit: &ParagraphUnit,
        suggested: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            paragraph_index: unit.index,
            original: unit.text.clone(),
            suggested: suggested.into(),
            reason: reason.into(),
        }
    }
}
