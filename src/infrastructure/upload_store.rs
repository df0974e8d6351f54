//! 上传文件存储 - 基础设施层
//!
//! 以文档 ID 为键把上传内容保存在本地目录中，只负责读写删，不解析内容

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 修改后文档的文件名标记
pub const MODIFIED_MARKER: &str = "_modified";

/// 上传目录
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 确保目录存在
    pub async fn ensure_dir(&self) -> AppResult<()> {
        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::file_write_failed(self.root.display().to_string(), e))
    }

    /// 文档原件的存放路径
    pub fn source_path(&self, document_id: &str) -> PathBuf {
        self.root.join(format!("{}.docx", document_id))
    }

    /// 由原件路径推导修改后文档的路径（与原件同目录，从不覆盖原件）
    pub fn modified_path_for(source_path: &Path) -> PathBuf {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = source_path
            .extension()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "docx".to_string());

        source_path.with_file_name(format!("{}{}.{}", stem, MODIFIED_MARKER, ext))
    }

    /// 保存上传内容，返回存放路径
    pub async fn write(&self, document_id: &str, bytes: &[u8]) -> AppResult<PathBuf> {
        let path = self.source_path(document_id);
        fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        debug!("已保存上传文件: {} ({} 字节)", path.display(), bytes.len());
        Ok(path)
    }

    /// 写出到指定路径
    pub async fn write_to(path: &Path, bytes: &[u8]) -> AppResult<()> {
        fs::write(path, bytes)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        debug!("已写出文件: {} ({} 字节)", path.display(), bytes.len());
        Ok(())
    }

    /// 读取文件
    pub async fn read(path: &Path) -> AppResult<Vec<u8>> {
        fs::read(path)
            .await
            .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
    }

    /// 删除文件，文件不存在时视为成功
    pub async fn remove(path: &Path) -> AppResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::file_delete_failed(path.display().to_string(), e)),
        }
    }
}
