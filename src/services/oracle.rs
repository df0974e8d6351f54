//! Oracle 能力 - 业务能力层
//!
//! Oracle 是外部的文本改进能力（通常是 LLM），这里只定义：
//! - 调用契约 `Oracle`
//! - 返回内容的严格解码（结构不符即整批失败）

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::OracleFailure;

/// 外部文本改进能力
///
/// 输入一个批次的段落文本和自然语言指令，返回机器可解析的 JSON 文本。
/// 调用可能很慢，也可能失败。
#[async_trait]
pub trait Oracle: Send + Sync {
    /// 用于日志的名称（通常是模型名）
    fn name(&self) -> &str;

    async fn complete(&self, batch_text: &str, instruction: &str) -> Result<String, OracleFailure>;
}

/// Oracle 返回的原始结构
#[derive(Debug, Deserialize)]
struct RawResponse {
    suggestions: Vec<RawPayload>,
}

#[derive(Debug, Deserialize)]
struct RawPayload {
    paragraph_number: usize,
    has_suggestion: bool,
    #[serde(default)]
    suggested_text: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

/// 建议的修改内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposedChange {
    pub suggested_text: String,
    pub reason: String,
}

/// 批次内单个段落的结果，`paragraph_number` 是批次内的局部序号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleEntry {
    pub paragraph_number: usize,
    pub change: Option<ProposedChange>,
}

/// 解码后的批次结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionBatch {
    pub entries: Vec<OracleEntry>,
}

/// 严格解码 Oracle 的返回内容
///
/// 允许外层包裹 Markdown 代码块；其余任何结构问题都视为整批失败：
/// - 不是 JSON / 缺少 `suggestions`
/// - 字段类型不符
/// - `has_suggestion` 为 true 却缺少 `suggested_text` 或 `reason`
pub fn decode_response(raw: &str) -> Result<SuggestionBatch, OracleFailure> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Err(OracleFailure::Malformed {
            reason: "返回内容为空".to_string(),
        });
    }

    let parsed: RawResponse = serde_json::from_str(body)?;

    let entries = parsed
        .suggestions
        .into_iter()
        .map(|payload| {
            let change = if payload.has_suggestion {
                let (Some(suggested_text), Some(reason)) = (payload.suggested_text, payload.reason)
                else {
                    return Err(OracleFailure::Malformed {
                        reason: format!(
                            "段落 {} 标记了建议但缺少 suggested_text 或 reason",
                            payload.paragraph_number
                        ),
                    });
                };
                Some(ProposedChange {
                    suggested_text,
                    reason,
                })
            } else {
                None
            };

            Ok(OracleEntry {
                paragraph_number: payload.paragraph_number,
                change,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SuggestionBatch { entries })
}

/// 去掉 ```json ... ``` 包裹
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // 跳过语言标记所在的行
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_valid_response() {
        let raw = r#"{
            "suggestions": [
                {"paragraph_number": 0, "has_suggestion": true, "suggested_text": "Better.", "reason": "clarity"},
                {"paragraph_number": 1, "has_suggestion": false}
            ]
        }"#;
        let batch = decode_response(raw).unwrap();

        assert_eq!(batch.entries.len(), 2);
        assert_eq!(
            batch.entries[0].change,
            Some(ProposedChange {
                suggested_text: "Better.".to_string(),
                reason: "clarity".to_string(),
            })
        );
        assert_eq!(batch.entries[1].change, None);
    }

    #[test]
    fn test_decode_fenced_response() {
        let raw = "```json\n{\"suggestions\": []}\n```";
        assert_eq!(decode_response(raw).unwrap(), SuggestionBatch::default());
    }

    #[test]
    fn test_decode_rejects_missing_suggestions_key() {
        assert!(matches!(
            decode_response(r#"{"items": []}"#),
            Err(OracleFailure::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_wrong_types() {
        let raw = r#"{"suggestions": [{"paragraph_number": "zero", "has_suggestion": true}]}"#;
        assert!(decode_response(raw).is_err());
    }

    #[test]
    fn test_decode_rejects_suggestion_without_text() {
        let raw = r#"{"suggestions": [{"paragraph_number": 0, "has_suggestion": true, "reason": "r"}]}"#;
        assert!(matches!(
            decode_response(raw),
            Err(OracleFailure::Malformed { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_prose() {
        assert!(decode_response("Sure! Here are my suggestions.").is_err());
        assert!(decode_response("   ").is_err());
    }
}
