//! 段落切分 - 业务能力层
//!
//! 把文档段落序列过滤为值得分析的段落单元，保留原始位置。
//! 纯函数，不修改输入。

use crate::models::ParagraphUnit;

/// 默认的最小词数，少于该词数的段落不参与分析
pub const MIN_WORDS: usize = 10;

/// 过滤掉空段落和词数不足 `min_words` 的段落
///
/// 输出中每个单元的 `index` 都是它在 `paragraphs` 中的原始位置。
pub fn segment<S: AsRef<str>>(paragraphs: &[S], min_words: usize) -> Vec<ParagraphUnit> {
    paragraphs
        .iter()
        .enumerate()
        .filter_map(|(index, text)| {
            let text = text.as_ref();
            if text.trim().is_empty() || text.split_whitespace().count() < min_words {
                return None;
            }
            Some(ParagraphUnit::new(index, text))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn test_keeps_original_indices() {
        let paragraphs = vec![words(12), String::new(), words(3), "   ".to_string(), words(10)];
        let units = segment(&paragraphs, MIN_WORDS);

        assert_eq!(units.iter().map(|u| u.index).collect::<Vec<_>>(), vec![0, 4]);
        for unit in &units {
            assert_eq!(unit.text, paragraphs[unit.index]);
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let paragraphs = vec![words(9), words(10)];
        let units = segment(&paragraphs, 10);
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].index, 1);
    }

    #[test]
    fn test_output_never_longer_than_input() {
        for n in 0..20 {
            let paragraphs: Vec<String> = (0..n).map(|i| words(i * 2)).collect();
            let units = segment(&paragraphs, MIN_WORDS);
            assert!(units.len() <= paragraphs.len());
            assert!(units.iter().all(|u| u.index < paragraphs.len()));
        }
    }

    #[test]
    fn test_empty_document() {
        assert!(segment::<&str>(&[], MIN_WORDS).is_empty());
    }
}
