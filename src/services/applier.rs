//! 建议应用 - 业务能力层
//!
//! 把选中的建议写回文档段落：
//! 1. 按 ID 从本次分析的建议中挑出选中项，未知 ID 直接丢弃
//! 2. 按段落索引从大到小依次替换文本（同一段落按 ID 排序，结果与输入顺序无关）
//! 3. 段落索引越界的建议跳过
//!
//! 只修改内存中的文档，写出由调用方负责，原件从不被覆盖。

use std::cmp::Reverse;
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::AppResult;
use crate::infrastructure::DocumentAccessor;
use crate::models::Suggestion;

/// 应用结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// 实际写入的建议数
    pub applied: usize,
    /// 因段落索引越界被跳过的建议 ID
    pub skipped: Vec<String>,
}

/// 按 ID 挑选建议，保持存储中的顺序，忽略未知 ID
pub fn select_suggestions<S: AsRef<str>>(all: &[Suggestion], ids: &[S]) -> Vec<Suggestion> {
    let wanted: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
    let selected: Vec<Suggestion> = all
        .iter()
        .filter(|s| wanted.contains(s.id.as_str()))
        .cloned()
        .collect();

    if selected.len() < wanted.len() {
        debug!(
            "请求 {} 个建议 ID，其中 {} 个有效",
            wanted.len(),
            selected.len()
        );
    }
    selected
}

/// 把建议写入文档
pub fn apply_suggestions<D: DocumentAccessor>(
    document: &mut D,
    selected: &[Suggestion],
) -> AppResult<ApplyReport> {
    let mut ordered: Vec<&Suggestion> = selected.iter().collect();
    ordered.sort_by(|a, b| {
        Reverse(a.paragraph_index)
            .cmp(&Reverse(b.paragraph_index))
            .then_with(|| a.id.cmp(&b.id))
    });

    let paragraph_count = document.paragraph_count();
    let mut report = ApplyReport::default();

    for suggestion in ordered {
        if suggestion.paragraph_index >= paragraph_count {
            warn!(
                "建议 {} 的段落索引 {} 超出范围 (共 {} 段)，已跳过",
                suggestion.id, suggestion.paragraph_index, paragraph_count
            );
            report.skipped.push(suggestion.id.clone());
            continue;
        }

        document.set_text(suggestion.paragraph_index, &suggestion.suggested)?;
        report.applied += 1;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::path::Path;

    /// 只在内存中保存段落的文档，记录替换顺序
    #[derive(Debug, Clone, Default)]
    struct MemoryDocument {
        paragraphs: Vec<String>,
        writes: Vec<usize>,
    }

    impl MemoryDocument {
        fn with(paragraphs: &[&str]) -> Self {
            Self {
                paragraphs: paragraphs.iter().map(|p| p.to_string()).collect(),
                writes: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl DocumentAccessor for MemoryDocument {
        async fn open(_path: &Path) -> AppResult<Self> {
            Ok(Self::default())
        }

        fn paragraphs(&self) -> Vec<String> {
            self.paragraphs.clone()
        }

        fn set_text(&mut self, index: usize, text: &str) -> AppResult<()> {
            let slot = self
                .paragraphs
                .get_mut(index)
                .ok_or_else(|| AppError::invalid_input("out of range"))?;
            *slot = text.to_string();
            self.writes.push(index);
            Ok(())
        }

        async fn save(&self, _path: &Path) -> AppResult<()> {
            Ok(())
        }
    }

    fn suggestion(id: &str, index: usize, text: &str) -> Suggestion {
        Suggestion {
            id: id.to_string(),
            paragraph_index: index,
            original: String::new(),
            suggested: text.to_string(),
            reason: String::new(),
        }
    }

    #[test]
    fn test_select_drops_unknown_ids() {
        let all = vec![suggestion("a", 0, "A"), suggestion("b", 1, "B"), suggestion("c", 2, "C")];
        let selected = select_suggestions(&all, &["c", "zzz", "a"]);

        let ids: Vec<&str> = selected.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_applies_in_descending_order() {
        let mut doc = MemoryDocument::with(&["p0", "p1", "p2", "p3"]);
        let selected = vec![suggestion("a", 0, "A"), suggestion("b", 3, "B"), suggestion("c", 2, "C")];

        let report = apply_suggestions(&mut doc, &selected).unwrap();

        assert_eq!(report.applied, 3);
        assert_eq!(doc.writes, vec![3, 2, 0]);
        assert_eq!(doc.paragraphs, vec!["A", "p1", "C", "B"]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let base = vec![
            suggestion("x", 1, "one"),
            suggestion("y", 4, "four"),
            suggestion("z", 1, "uno"),
            suggestion("w", 2, "two"),
        ];
        let mut reversed = base.clone();
        reversed.reverse();
        let mut rotated = base.clone();
        rotated.rotate_left(2);

        let results: Vec<Vec<String>> = [base, reversed, rotated]
            .iter()
            .map(|selected| {
                let mut doc = MemoryDocument::with(&["a", "b", "c", "d", "e"]);
                apply_suggestions(&mut doc, selected).unwrap();
                doc.paragraphs
            })
            .collect();

        assert_eq!(results[0], results[1]);
        assert_eq!(results[0], results[2]);
    }

    #[test]
    fn test_out_of_range_is_skipped() {
        let mut doc = MemoryDocument::with(&["only"]);
        let selected = vec![suggestion("a", 0, "A"), suggestion("b", 5, "B")];

        let report = apply_suggestions(&mut doc, &selected).unwrap();

        assert_eq!(report.applied, 1);
        assert_eq!(report.skipped, vec!["b".to_string()]);
        assert_eq!(doc.paragraphs, vec!["A"]);
    }

    #[test]
    fn test_empty_selection_changes_nothing() {
        let mut doc = MemoryDocument::with(&["a", "b"]);
        let report = apply_suggestions(&mut doc, &[]).unwrap();

        assert_eq!(report, ApplyReport::default());
        assert_eq!(doc.paragraphs, vec!["a", "b"]);
    }
}
