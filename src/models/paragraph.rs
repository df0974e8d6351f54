use std::fmt::Display;

/// 段落单元
///
/// `index` 是段落在原文档段落序列中的位置（从 0 开始），
/// 在切分时确定，之后不会重新编号。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphUnit {
    pub index: usize,
    pub text: String,
}

impl ParagraphUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// 按空白切分的词数
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

impl Display for ParagraphUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[段落 #{} | {} 词]", self.index, self.word_count())
    }
}
