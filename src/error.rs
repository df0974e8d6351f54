use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 参数缺失或格式错误（空 ID、空指令等）
    #[error("参数错误: {0}")]
    InvalidInput(String),
    /// 文档或建议不存在
    #[error("{0}")]
    NotFound(NotFoundError),
    /// 上传内容不是合法的文档容器
    #[error("文档格式错误: {0}")]
    MalformedContainer(ContainerError),
    /// 单个批次的 Oracle 调用失败（由批处理器吸收，不会中止整个分析）
    #[error("Oracle错误: {0}")]
    Oracle(#[from] OracleFailure),
    /// 存储读写错误
    #[error("文件错误: {0}")]
    Io(#[from] FileError),
    /// 远程下载错误
    #[error("下载错误: {0}")]
    Download(#[from] DownloadError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 资源不存在
#[derive(Debug, Error)]
pub enum NotFoundError {
    /// 文档不存在
    #[error("文档不存在: {document_id}")]
    Document { document_id: String },
    /// 该文档还没有完成过分析
    #[error("文档 {document_id} 没有可用的建议，请先执行分析")]
    Suggestions { document_id: String },
    /// 该文档还没有生成修改后的版本
    #[error("文档 {document_id} 没有修改后的版本")]
    Output { document_id: String },
}

/// 文档容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 不是 zip 包
    #[error("不是合法的 DOCX/ZIP 包 (文件头: {header_hex}, 大小: {size} 字节)")]
    NotAnArchive { header_hex: String, size: usize },
    /// zip 包中缺少正文部件
    #[error("缺少正文部件 {part}")]
    MissingPart { part: String },
    /// 正文部件无法解析
    #[error("正文部件解析失败: {reason}")]
    BadPart { reason: String },
}

/// Oracle 调用失败
#[derive(Debug, Error)]
pub enum OracleFailure {
    /// 请求失败
    #[error("调用失败 (模型: {model}): {message}")]
    Request { model: String, message: String },
    /// 返回内容为空
    #[error("返回内容为空 (模型: {model})")]
    EmptyResponse { model: String },
    /// 返回内容不符合约定结构
    #[error("返回内容结构不合法: {reason}")]
    Malformed { reason: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 删除文件失败
    #[error("删除文件失败 ({path}): {source}")]
    DeleteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// zip 写出失败
    #[error("写出文档失败: {source}")]
    ArchiveWriteFailed {
        #[source]
        source: zip::result::ZipError,
    },
}

/// 远程下载错误
#[derive(Debug, Error)]
pub enum DownloadError {
    /// 网络请求失败
    #[error("请求失败 ({url}): {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务器返回非 2xx 状态码
    #[error("服务器返回错误状态 ({url}): {status}")]
    BadStatus { url: String, status: u16 },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(FileError::ReadFailed {
            path: String::new(),
            source: err,
        })
    }
}

impl From<serde_json::Error> for OracleFailure {
    fn from(err: serde_json::Error) -> Self {
        OracleFailure::Malformed {
            reason: err.to_string(),
        }
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建参数错误
    pub fn invalid_input(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    /// 创建文档不存在错误
    pub fn document_not_found(document_id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Document {
            document_id: document_id.into(),
        })
    }

    /// 创建建议不存在错误
    pub fn suggestions_not_found(document_id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Suggestions {
            document_id: document_id.into(),
        })
    }

    /// 创建输出文档不存在错误
    pub fn output_not_found(document_id: impl Into<String>) -> Self {
        AppError::NotFound(NotFoundError::Output {
            document_id: document_id.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件删除错误
    pub fn file_delete_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Io(FileError::DeleteFailed {
            path: path.into(),
            source,
        })
    }

    /// 根据上传内容创建"不是 zip 包"错误
    pub fn not_an_archive(bytes: &[u8]) -> Self {
        let header_hex = bytes
            .iter()
            .take(4)
            .map(|b| format!("{:02X}", b))
            .collect::<String>();
        AppError::MalformedContainer(ContainerError::NotAnArchive {
            header_hex,
            size: bytes.len(),
        })
    }

    /// 是否属于"不存在"类错误
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
