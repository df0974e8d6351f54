//! 规则兜底 - 业务能力层
//!
//! 没有配置 LLM 时使用的确定性规则，产出与 Oracle 路径相同的 `Recommendation`：
//! - 指令包含 "more formal"：展开英文缩写
//! - 指令包含 "concise" / "shorter"：超过 30 词的段落截取前 20 词并加省略号

use std::sync::LazyLock;

use phf::phf_map;
use regex::{Captures, Regex};

use crate::models::ParagraphUnit;
use crate::services::batcher::Recommendation;
use crate::services::oracle::ProposedChange;

/// 超过该词数才会被缩写
pub const CONCISE_THRESHOLD_WORDS: usize = 30;

/// 缩写后保留的词数
pub const CONCISE_KEEP_WORDS: usize = 20;

const FORMAL_REASON: &str = "Replace contractions with full forms for formality";
const CONCISE_REASON: &str = "Shorten long paragraph for conciseness";

/// 缩写 → 完整形式（小写）
static CONTRACTIONS: phf::Map<&'static str, &'static str> = phf_map! {
    "don't" => "do not",
    "doesn't" => "does not",
    "didn't" => "did not",
    "can't" => "cannot",
    "couldn't" => "could not",
    "won't" => "will not",
    "wouldn't" => "would not",
    "shouldn't" => "should not",
    "isn't" => "is not",
    "aren't" => "are not",
    "wasn't" => "was not",
    "weren't" => "were not",
    "haven't" => "have not",
    "hasn't" => "has not",
    "hadn't" => "had not",
    "it's" => "it is",
    "that's" => "that is",
    "there's" => "there is",
    "let's" => "let us",
    "i'm" => "I am",
    "you're" => "you are",
    "we're" => "we are",
    "they're" => "they are",
    "i've" => "I have",
    "we've" => "we have",
    "they've" => "they have",
    "i'll" => "I will",
    "we'll" => "we will",
    "they'll" => "they will",
};

static CONTRACTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z]+['’][A-Za-z]+\b").expect("缩写正则非法")
});

/// 对所有段落应用兜底规则
pub fn recommend(units: &[ParagraphUnit], instruction: &str) -> Vec<Recommendation> {
    let instruction = instruction.to_lowercase();
    let wants_formal = instruction.contains("more formal");
    let wants_concise = instruction.contains("concise") || instruction.contains("shorter");

    let mut recommendations = Vec::new();
    for unit in units {
        if wants_formal {
            if let Some(expanded) = expand_contractions(&unit.text) {
                recommendations.push(recommendation(unit, expanded, FORMAL_REASON));
            }
        }
        if wants_concise {
            if let Some(shortened) = shorten(&unit.text) {
                recommendations.push(recommendation(unit, shortened, CONCISE_REASON));
            }
        }
    }
    recommendations
}

fn recommendation(unit: &ParagraphUnit, suggested_text: String, reason: &str) -> Recommendation {
    Recommendation {
        unit: unit.clone(),
        change: ProposedChange {
            suggested_text,
            reason: reason.to_string(),
        },
    }
}

/// 展开缩写，没有任何可展开的缩写时返回 None
pub fn expand_contractions(text: &str) -> Option<String> {
    let mut changed = false;
    let expanded = CONTRACTION_WORD.replace_all(text, |caps: &Captures| {
        let word = &caps[0];
        let key = word.replace('’', "'").to_lowercase();
        match CONTRACTIONS.get(key.as_str()) {
            Some(full) => {
                changed = true;
                match_capitalization(word, full)
            }
            None => word.to_string(),
        }
    });

    changed.then(|| expanded.into_owned())
}

/// 原词首字母大写时，展开结果首字母也大写
fn match_capitalization(original: &str, full: &str) -> String {
    let starts_upper = original.chars().next().is_some_and(char::is_uppercase);
    if !starts_upper {
        return full.to_string();
    }

    let mut chars = full.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// 超过阈值的段落截取前若干词
pub fn shorten(text: &str) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= CONCISE_THRESHOLD_WORDS {
        return None;
    }
    Some(format!("{}...", words[..CONCISE_KEEP_WORDS].join(" ")))
}
