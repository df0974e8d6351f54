use std::path::PathBuf;

use chrono::{DateTime, Local};
use serde::Serialize;

/// 预览截取的字符数
pub const PREVIEW_CHARS: usize = 200;

/// 上传时计算的文档统计信息，之后不再重新计算
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentMetadata {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub preview: String,
}

impl DocumentMetadata {
    /// 根据段落文本计算统计信息（只统计去空白后非空的段落）
    pub fn from_paragraphs<S: AsRef<str>>(paragraphs: &[S]) -> Self {
        let non_empty: Vec<&str> = paragraphs
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.trim().is_empty())
            .collect();

        Self {
            word_count: non_empty.iter().map(|p| p.split_whitespace().count()).sum(),
            paragraph_count: non_empty.len(),
            preview: non_empty
                .first()
                .map(|p| p.chars().take(PREVIEW_CHARS).collect())
                .unwrap_or_default(),
        }
    }
}

/// 文档记录
///
/// 上传时创建，由文档注册表独占持有。
/// `modified_path` / `download_filename` 每次成功应用建议后被覆盖。
#[derive(Debug, Clone)]
pub struct DocumentRecord {
    pub document_id: String,
    pub filename: String,
    pub source_path: PathBuf,
    pub metadata: DocumentMetadata,
    pub modified_path: Option<PathBuf>,
    pub download_filename: Option<String>,
    pub uploaded_at: DateTime<Local>,
}

impl DocumentRecord {
    pub fn new(
        document_id: impl Into<String>,
        filename: impl Into<String>,
        source_path: PathBuf,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            document_id: document_id.into(),
            filename: filename.into(),
            source_path,
            metadata,
            modified_path: None,
            download_filename: None,
            uploaded_at: Local::now(),
        }
    }

    /// 修改后文档的下载文件名：原文件名 + `_modified` + 原扩展名
    ///
    /// 没有扩展名时使用 `.docx`；`.docx` 这类只有扩展名的文件名视为没有主干。
    pub fn modified_download_name(&self) -> String {
        let (base, ext) = match self.filename.rsplit_once('.') {
            Some((base, ext)) if !ext.is_empty() => (base, ext),
            Some((base, _)) => (base, "docx"),
            None => (self.filename.as_str(), "docx"),
        };
        format!("{}_modified.{}", base, ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_skips_blank_paragraphs() {
        let metadata = DocumentMetadata::from_paragraphs(&["", "  ", "one two three", "four"]);
        assert_eq!(metadata.paragraph_count, 2);
        assert_eq!(metadata.word_count, 4);
        assert_eq!(metadata.preview, "one two three");
    }

    #[test]
    fn test_metadata_preview_is_char_bounded() {
        let long = "é".repeat(300);
        let metadata = DocumentMetadata::from_paragraphs(&[long]);
        assert_eq!(metadata.preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn test_metadata_of_empty_document() {
        let metadata = DocumentMetadata::from_paragraphs::<&str>(&[]);
        assert_eq!(metadata.paragraph_count, 0);
        assert_eq!(metadata.preview, "");
    }

    #[test]
    fn test_modified_download_name() {
        let metadata = DocumentMetadata::from_paragraphs::<&str>(&[]);
        let record = DocumentRecord::new("id", "report.final.docx", PathBuf::from("x"), metadata.clone());
        assert_eq!(record.modified_download_name(), "report.final_modified.docx");

        let record = DocumentRecord::new("id", "notes", PathBuf::from("x"), metadata);
        assert_eq!(record.modified_download_name(), "notes_modified.docx");
    }

    #[test]
    fn test_modified_download_name_without_base() {
        let metadata = DocumentMetadata::from_paragraphs::<&str>(&[]);
        let name = |filename: &str| {
            DocumentRecord::new("id", filename, PathBuf::from("x"), metadata.clone())
                .modified_download_name()
        };

        assert_eq!(name(".docx"), "_modified.docx");
        assert_eq!(name("draft."), "draft_modified.docx");
    }
}
