//! 文档处理上下文
//!
//! 封装"我正在处理哪个文档"这一信息，用于日志

use std::fmt::Display;

/// 文档处理上下文
#[derive(Debug, Clone)]
pub struct DocCtx {
    /// 文档ID
    pub document_id: String,

    /// 上传时的文件名（仅用于日志显示）
    pub filename: String,
}

impl DocCtx {
    /// 创建新的文档上下文
    pub fn new(document_id: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            filename: filename.into(),
        }
    }
}

impl Display for DocCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 ID#{} 文件#{}]", self.document_id, self.filename)
    }
}
