//! 文档编辑器 - 编排层
//!
//! ## 职责
//!
//! 对外暴露与传输层无关的全部操作，并以文档 ID 串起所有组件：
//!
//! 1. **upload**：保存上传内容 → 校验容器 → 提取统计信息 → 登记文档
//! 2. **analyze**：读取原件段落 → 分析流程 → 整体替换该文档的建议
//! 3. **apply**：挑选建议 → 写入原件副本 → 保存到新路径 → 更新文档记录
//! 4. **fetch_output**：读取最近一次生成的修改版本
//! 5. **delete**：显式移除文档、建议及其文件
//!
//! ## 并发约定
//!
//! 内部不加锁。同一文档的 analyze / apply 需要由调用方串行化；
//! 不同文档之间的操作互不阻塞（存储按键分片）。

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::clients::DownloadClient;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{DocumentAccessor, DocxDocument, KeyValueStore, MemoryStore, UploadStore};
use crate::models::{DocumentMetadata, DocumentRecord, Suggestion};
use crate::services::applier::{apply_suggestions, select_suggestions};
use crate::utils::logging::truncate_text;
use crate::workflow::{AnalysisFlow, DocCtx};

/// 未记录下载文件名时使用的默认值
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "modified_document.docx";

/// apply 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub output_path: PathBuf,
    pub applied_count: usize,
    /// 段落索引越界而未写入的建议 ID
    pub skipped_ids: Vec<String>,
    pub download_filename: String,
}

/// fetch_output 的结果
#[derive(Debug, Clone)]
pub struct OutputFile {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// 文档编辑器
pub struct DocumentEditor {
    documents: Arc<dyn KeyValueStore<DocumentRecord>>,
    suggestions: Arc<dyn KeyValueStore<Vec<Suggestion>>>,
    uploads: UploadStore,
    flow: AnalysisFlow,
    downloader: DownloadClient,
}

impl DocumentEditor {
    /// 使用进程内存储和按配置选择的分析流程
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_parts(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            AnalysisFlow::new(config),
        )
    }

    /// 注入存储和分析流程
    pub fn with_parts(
        config: &Config,
        documents: Arc<dyn KeyValueStore<DocumentRecord>>,
        suggestions: Arc<dyn KeyValueStore<Vec<Suggestion>>>,
        flow: AnalysisFlow,
    ) -> AppResult<Self> {
        Ok(Self {
            documents,
            suggestions,
            uploads: UploadStore::new(config.upload_dir.clone()),
            flow,
            downloader: DownloadClient::new(config)?,
        })
    }

    /// 准备上传目录
    pub async fn prepare(&self) -> AppResult<()> {
        self.uploads.ensure_dir().await
    }

    /// 上传文档
    pub async fn upload(&self, bytes: &[u8], filename: &str) -> AppResult<DocumentRecord> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(AppError::invalid_input("缺少文件名"));
        }
        if bytes.is_empty() {
            return Err(AppError::invalid_input("上传内容为空"));
        }

        let document_id = Uuid::new_v4().to_string();
        let source_path = self.uploads.write(&document_id, bytes).await?;

        // 先校验容器，再提取统计信息，失败时不留下半初始化的记录
        let document = match DocxDocument::open(&source_path).await {
            Ok(document) => document,
            Err(e) => {
                warn!("[文档 {}] 上传内容不是合法文档: {}", document_id, e);
                UploadStore::remove(&source_path).await?;
                return Err(e);
            }
        };

        let metadata = DocumentMetadata::from_paragraphs(&document.paragraphs());
        let record = DocumentRecord::new(&document_id, filename, source_path, metadata);

        info!(
            "✓ 上传 '{}' 成功 [ID: {}] 词数: {} 段落: {} 预览: {}",
            record.filename,
            record.document_id,
            record.metadata.word_count,
            record.metadata.paragraph_count,
            truncate_text(&record.metadata.preview, 40)
        );

        self.documents.put(&document_id, record.clone());
        Ok(record)
    }

    /// 从公开 URL 下载后上传
    pub async fn upload_from_url(&self, file_url: &str, filename: &str) -> AppResult<DocumentRecord> {
        if file_url.trim().is_empty() {
            return Err(AppError::invalid_input("缺少 file_url"));
        }
        let bytes = self.downloader.fetch(file_url.trim()).await?;
        self.upload(&bytes, filename).await
    }

    /// 查询文档记录
    pub fn document(&self, document_id: &str) -> AppResult<DocumentRecord> {
        if document_id.trim().is_empty() {
            return Err(AppError::invalid_input("缺少 doc_id"));
        }
        self.documents
            .get(document_id)
            .ok_or_else(|| AppError::document_not_found(document_id))
    }

    /// 分析文档，整体替换该文档之前的建议
    pub async fn analyze(&self, document_id: &str, instruction: &str) -> AppResult<Vec<Suggestion>> {
        if instruction.trim().is_empty() {
            return Err(AppError::invalid_input("缺少修改要求 (request)"));
        }
        let record = self.document(document_id)?;

        let document = DocxDocument::open(&record.source_path).await?;
        let ctx = DocCtx::new(&record.document_id, &record.filename);
        let report = self.flow.run(&ctx, &document.paragraphs(), instruction).await;

        self.suggestions.put(document_id, report.suggestions.clone());
        Ok(report.suggestions)
    }

    /// 最近一次分析得到的建议
    pub fn suggestions(&self, document_id: &str) -> AppResult<Vec<Suggestion>> {
        self.document(document_id)?;
        self.suggestions
            .get(document_id)
            .ok_or_else(|| AppError::suggestions_not_found(document_id))
    }

    /// 应用选中的建议，生成新的文档
    ///
    /// 未知的建议 ID 被忽略；空选择会生成与原件内容相同的副本。
    pub async fn apply<S: AsRef<str>>(
        &self,
        document_id: &str,
        suggestion_ids: &[S],
    ) -> AppResult<ApplyOutcome> {
        let mut record = self.document(document_id)?;
        let all = self.suggestions(document_id)?;
        let selected = select_suggestions(&all, suggestion_ids);

        let mut document = DocxDocument::open(&record.source_path).await?;
        let report = apply_suggestions(&mut document, &selected)?;

        let output_path = UploadStore::modified_path_for(&record.source_path);
        document.save(&output_path).await?;

        let download_filename = record.modified_download_name();
        record.modified_path = Some(output_path.clone());
        record.download_filename = Some(download_filename.clone());
        self.documents.put(document_id, record);

        info!(
            "✏️ [文档 {}] 已应用 {} 条建议 → {}",
            document_id,
            report.applied,
            output_path.display()
        );
        if !report.skipped.is_empty() {
            warn!(
                "[文档 {}] {} 条建议的段落索引超出范围，未写入: {:?}",
                document_id,
                report.skipped.len(),
                report.skipped
            );
        }

        Ok(ApplyOutcome {
            output_path,
            applied_count: report.applied,
            skipped_ids: report.skipped,
            download_filename,
        })
    }

    /// 读取修改后的文档
    pub async fn fetch_output(&self, document_id: &str) -> AppResult<OutputFile> {
        let record = self.document(document_id)?;
        let path = record
            .modified_path
            .ok_or_else(|| AppError::output_not_found(document_id))?;

        // 输出文件可能已被外部删除
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(AppError::output_not_found(document_id));
        }
        let bytes = UploadStore::read(&path).await?;

        Ok(OutputFile {
            bytes,
            filename: record
                .download_filename
                .unwrap_or_else(|| DEFAULT_DOWNLOAD_FILENAME.to_string()),
        })
    }

    /// 删除文档、建议及相关文件
    pub async fn delete(&self, document_id: &str) -> AppResult<()> {
        let record = self.document(document_id)?;

        self.documents.remove(document_id);
        self.suggestions.remove(document_id);

        UploadStore::remove(&record.source_path).await?;
        if let Some(modified) = &record.modified_path {
            UploadStore::remove(modified).await?;
        }

        info!("🗑️ [文档 {}] 已删除", document_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ContainerError;
    use tempfile::TempDir;

    fn long(prefix: &str) -> String {
        format!("{} {}", prefix, vec!["word"; 12].join(" "))
    }

    fn editor(dir: &TempDir) -> DocumentEditor {
        let config = Config {
            upload_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        DocumentEditor::with_parts(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
            AnalysisFlow::fallback_only(&config),
        )
        .unwrap()
    }

    async fn upload_paragraphs(editor: &DocumentEditor, paragraphs: &[String]) -> DocumentRecord {
        let bytes = DocxDocument::package_from_paragraphs(paragraphs).unwrap();
        editor.upload(&bytes, "report.docx").await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_records_metadata() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);

        let record =
            upload_paragraphs(&editor, &["Hello there world".to_string(), String::new(), "Two words".to_string()])
                .await;

        assert_eq!(record.filename, "report.docx");
        assert_eq!(record.metadata.word_count, 5);
        assert_eq!(record.metadata.paragraph_count, 2);
        assert_eq!(record.metadata.preview, "Hello there world");
        assert!(record.source_path.exists());
        assert!(record.modified_path.is_none());
        assert_eq!(editor.document(&record.document_id).unwrap().metadata, record.metadata);
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_input() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);

        let err = editor.upload(b"", "a.docx").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = editor.upload(b"PK", "  ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_malformed_upload_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);

        let err = editor.upload(b"plain text, not a zip", "notes.docx").await.unwrap_err();

        assert!(matches!(
            err,
            AppError::MalformedContainer(ContainerError::NotAnArchive { .. })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_operations_on_unknown_document() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);

        assert!(editor.analyze("missing", "more formal").await.unwrap_err().is_not_found());
        assert!(editor.apply("missing", &["x"]).await.unwrap_err().is_not_found());
        assert!(editor.fetch_output("missing").await.unwrap_err().is_not_found());
        assert!(editor.delete("missing").await.unwrap_err().is_not_found());
        assert!(matches!(
            editor.document(" ").unwrap_err(),
            AppError::InvalidInput(_)
        ));
    }

    #[tokio::test]
    async fn test_analyze_requires_instruction() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);
        let record = upload_paragraphs(&editor, &[long("Don't")]).await;

        let err = editor.analyze(&record.document_id, "   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_apply_before_analyze_is_not_found() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);
        let record = upload_paragraphs(&editor, &[long("Don't")]).await;

        let err = editor.apply(&record.document_id, &["any"]).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound(crate::error::NotFoundError::Suggestions { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_before_apply_is_not_found() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);
        let record = upload_paragraphs(&editor, &[long("Don't")]).await;

        let err = editor.fetch_output(&record.document_id).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::NotFound(crate::error::NotFoundError::Output { .. })
        ));
    }

    #[tokio::test]
    async fn test_analyze_apply_fetch() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);
        let record = upload_paragraphs(&editor, &[long("Don't"), "short".to_string()]).await;

        let suggestions = editor.analyze(&record.document_id, "Make it more formal").await.unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(editor.suggestions(&record.document_id).unwrap(), suggestions);

        let outcome = editor
            .apply(&record.document_id, &[suggestions[0].id.as_str()])
            .await
            .unwrap();
        assert_eq!(outcome.applied_count, 1);
        assert!(outcome.skipped_ids.is_empty());
        assert_eq!(outcome.download_filename, "report_modified.docx");
        assert_ne!(outcome.output_path, record.source_path);

        let output = editor.fetch_output(&record.document_id).await.unwrap();
        assert_eq!(output.filename, "report_modified.docx");
        let written = DocxDocument::from_bytes(output.bytes).unwrap();
        assert!(written.paragraphs()[0].starts_with("Do not"));
        assert_eq!(written.paragraphs()[1], "short");
    }

    #[tokio::test]
    async fn test_apply_reports_out_of_range_suggestions() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            upload_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let suggestions: Arc<MemoryStore<Vec<Suggestion>>> = Arc::new(MemoryStore::new());
        let editor = DocumentEditor::with_parts(
            &config,
            Arc::new(MemoryStore::new()),
            suggestions.clone(),
            AnalysisFlow::fallback_only(&config),
        )
        .unwrap();
        let record = upload_paragraphs(&editor, &[long("first")]).await;

        let stale = |id: &str, index: usize| Suggestion {
            id: id.to_string(),
            paragraph_index: index,
            original: String::new(),
            suggested: "replaced".to_string(),
            reason: String::new(),
        };
        suggestions.put(&record.document_id, vec![stale("in", 0), stale("out", 7)]);

        let outcome = editor
            .apply(&record.document_id, &["in", "out"])
            .await
            .unwrap();

        assert_eq!(outcome.applied_count, 1);
        assert_eq!(outcome.skipped_ids, vec!["out".to_string()]);
        let output = editor.fetch_output(&record.document_id).await.unwrap();
        assert_eq!(DocxDocument::from_bytes(output.bytes).unwrap().paragraphs(), vec!["replaced"]);
    }

    #[tokio::test]
    async fn test_delete_removes_entries_and_files() {
        let dir = TempDir::new().unwrap();
        let editor = editor(&dir);
        let record = upload_paragraphs(&editor, &[long("Can't")]).await;
        let suggestions = editor.analyze(&record.document_id, "more formal").await.unwrap();
        let outcome = editor
            .apply(&record.document_id, &[suggestions[0].id.clone()])
            .await
            .unwrap();

        editor.delete(&record.document_id).await.unwrap();

        assert!(!record.source_path.exists());
        assert!(!outcome.output_path.exists());
        assert!(editor.document(&record.document_id).unwrap_err().is_not_found());
        assert!(editor.suggestions(&record.document_id).unwrap_err().is_not_found());
    }
}
