//! 集成测试共用的工具
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use docx_suggester::error::OracleFailure;
use docx_suggester::services::batcher::PARAGRAPH_SEPARATOR;
use docx_suggester::{AnalysisFlow, Config, DocumentEditor, DocxDocument, MemoryStore, Oracle};
use tempfile::TempDir;

/// 12 个词以上的段落，保证通过切分
pub fn long_paragraph(prefix: &str) -> String {
    format!("{} {}", prefix, vec!["lorem"; 12].join(" "))
}

pub fn docx(paragraphs: &[String]) -> Vec<u8> {
    DocxDocument::package_from_paragraphs(paragraphs).expect("构建测试文档失败")
}

pub fn config_for(dir: &TempDir) -> Config {
    Config {
        upload_dir: dir.path().to_path_buf(),
        ..Config::default()
    }
}

/// 把批次中每个段落都改成大写的 Oracle
pub struct UppercaseOracle {
    pub calls: AtomicUsize,
}

impl UppercaseOracle {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Oracle for UppercaseOracle {
    fn name(&self) -> &str {
        "uppercase"
    }

    async fn complete(&self, batch_text: &str, _instruction: &str) -> Result<String, OracleFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let suggestions: Vec<serde_json::Value> = batch_text
            .split(PARAGRAPH_SEPARATOR)
            .enumerate()
            .map(|(ordinal, block)| {
                let text = block.split_once('\n').map(|(_, text)| text).unwrap_or_default();
                serde_json::json!({
                    "paragraph_number": ordinal,
                    "has_suggestion": true,
                    "suggested_text": text.to_uppercase(),
                    "reason": "uppercase"
                })
            })
            .collect();

        Ok(serde_json::json!({ "suggestions": suggestions }).to_string())
    }
}

/// 总是失败的 Oracle
pub struct UnreachableOracle;

#[async_trait]
impl Oracle for UnreachableOracle {
    fn name(&self) -> &str {
        "unreachable"
    }

    async fn complete(&self, _batch_text: &str, _instruction: &str) -> Result<String, OracleFailure> {
        Err(OracleFailure::Request {
            model: "unreachable".to_string(),
            message: "connection refused".to_string(),
        })
    }
}

pub fn editor_with(dir: &TempDir, flow: AnalysisFlow) -> DocumentEditor {
    DocumentEditor::with_parts(
        &config_for(dir),
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryStore::new()),
        flow,
    )
    .expect("创建文档编辑器失败")
}

pub fn oracle_editor(dir: &TempDir, oracle: Arc<dyn Oracle>) -> DocumentEditor {
    editor_with(dir, AnalysisFlow::with_oracle(&config_for(dir), oracle))
}

pub fn fallback_editor(dir: &TempDir) -> DocumentEditor {
    editor_with(dir, AnalysisFlow::fallback_only(&config_for(dir)))
}
