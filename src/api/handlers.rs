//! REST 接口处理函数
//!
//! 只做参数提取和响应组装，业务全部委托给 `DocumentEditor`。

use axum::{
    extract::{Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::ApiState;
use crate::error::{AppError, AppResult};
use crate::models::{DocumentMetadata, DocumentRecord, Suggestion};
use crate::services::select_suggestions;

/// DOCX 的 MIME 类型
pub const DOCX_MEDIA_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// GET / | /api | /api/
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Document suggestion server is running",
    })
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub doc_id: String,
    pub filename: String,
    pub metadata: DocumentMetadata,
}

impl From<DocumentRecord> for UploadResponse {
    fn from(record: DocumentRecord) -> Self {
        Self {
            doc_id: record.document_id,
            filename: record.filename,
            metadata: record.metadata,
        }
    }
}

/// POST /api/upload（multipart，字段名 `file`）
pub async fn upload(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::invalid_input(format!("multipart 解析失败: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid_input(format!("读取上传内容失败: {}", e)))?;

        let record = state.editor.upload(&bytes, &filename).await?;
        return Ok(Json(record.into()));
    }

    Err(AppError::invalid_input("缺少 file 字段"))
}

#[derive(Deserialize)]
pub struct UploadUrlRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub file_url: String,
}

/// POST /api/upload_url
pub async fn upload_url(
    State(state): State<ApiState>,
    Json(req): Json<UploadUrlRequest>,
) -> AppResult<Json<UploadResponse>> {
    let record = state.editor.upload_from_url(&req.file_url, &req.filename).await?;
    Ok(Json(record.into()))
}

#[derive(Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub request: String,
}

#[derive(Serialize)]
pub struct AnalyzeResponse {
    pub doc_id: String,
    pub filename: String,
    pub suggestions: Vec<Suggestion>,
    pub count: usize,
}

/// POST /api/analyze
pub async fn analyze(
    State(state): State<ApiState>,
    Json(req): Json<AnalyzeRequest>,
) -> AppResult<Json<AnalyzeResponse>> {
    if req.doc_id.trim().is_empty() || req.request.trim().is_empty() {
        return Err(AppError::invalid_input("Missing doc_id or request"));
    }

    let suggestions = state.editor.analyze(&req.doc_id, &req.request).await?;
    let record = state.editor.document(&req.doc_id)?;

    Ok(Json(AnalyzeResponse {
        doc_id: record.document_id,
        filename: record.filename,
        count: suggestions.len(),
        suggestions,
    }))
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    #[serde(default)]
    pub doc_id: String,
    #[serde(default)]
    pub suggestion_ids: Vec<String>,
}

#[derive(Serialize)]
pub struct ApplyResponse {
    pub success: bool,
    pub applied_count: usize,
    pub download_url: String,
}

/// POST /api/apply
///
/// 与核心操作不同，这里没有任何 ID 命中时返回 400。
pub async fn apply(
    State(state): State<ApiState>,
    Json(req): Json<ApplyRequest>,
) -> AppResult<Json<ApplyResponse>> {
    if req.doc_id.trim().is_empty() {
        return Err(AppError::invalid_input("Missing doc_id"));
    }

    let stored = state.editor.suggestions(&req.doc_id)?;
    if select_suggestions(&stored, &req.suggestion_ids).is_empty() {
        return Err(AppError::invalid_input("No valid suggestions selected"));
    }

    let outcome = state.editor.apply(&req.doc_id, &req.suggestion_ids).await?;

    Ok(Json(ApplyResponse {
        success: true,
        applied_count: outcome.applied_count,
        download_url: state.download_url(&req.doc_id),
    }))
}

/// GET /api/download/:doc_id
pub async fn download(
    State(state): State<ApiState>,
    Path(doc_id): Path<String>,
) -> AppResult<Response> {
    let output = state.editor.fetch_output(&doc_id).await?;
    info!("📥 下载 [文档 {}] {}", doc_id, output.filename);

    let disposition = format!(
        "attachment; filename=\"{}\"",
        header_safe_filename(&output.filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, DOCX_MEDIA_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.bytes,
    )
        .into_response())
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub success: bool,
}

/// DELETE /api/documents/:doc_id
pub async fn delete(
    State(state): State<ApiState>,
    Path(doc_id): Path<String>,
) -> AppResult<Json<DeleteResponse>> {
    state.editor.delete(&doc_id).await?;
    Ok(Json(DeleteResponse { success: true }))
}

/// 头部只允许可见 ASCII，其余字符和引号替换为下划线
fn header_safe_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_safe_filename() {
        assert_eq!(header_safe_filename("report_modified.docx"), "report_modified.docx");
        assert_eq!(header_safe_filename("my \"draft\".docx"), "my _draft_.docx");
        assert_eq!(header_safe_filename("报告.docx"), "__.docx");
    }
}
