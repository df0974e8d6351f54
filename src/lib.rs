//! # Docx Suggester
//!
//! 上传 Word 文档，按自然语言要求生成逐段修改建议，并把选中的建议写入新文档
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有文件和存储，只暴露能力
//! - `DocxDocument` - `.docx` 段落读写
//! - `KeyValueStore` / `MemoryStore` - 文档注册表与建议存储
//! - `UploadStore` - 上传目录
//!
//! ### ② 客户端（Clients）
//! - `LlmClient` - 兼容 OpenAI 的 Chat Completion，实现 `Oracle`
//! - `DownloadClient` - 按 URL 下载文档
//!
//! ### ③ 业务能力层（Services）
//! - `segmenter` / `batcher` / `fallback` / `suggestion_builder` / `applier`
//!
//! ### ④ 流程层（Workflow）
//! - `DocCtx` - 日志上下文（文档 ID + 文件名）
//! - `AnalysisFlow` - 切分 → 分批 → Oracle / 兜底 → 生成建议
//!
//! ### ⑤ 编排层（Orchestration）
//! - `DocumentEditor` - 以文档 ID 为中心的全部操作
//! - `App` - 应用生命周期与 HTTP 服务
//!
//! ### ⑥ 接口层（API）
//! - `api/` - axum 路由
//!
//! ## 模块结构

pub mod api;
pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentAccessor, DocxDocument, KeyValueStore, MemoryStore};
pub use models::{DocumentMetadata, DocumentRecord, ParagraphUnit, Suggestion};
pub use orchestrator::{App, ApplyOutcome, DocumentEditor};
pub use services::Oracle;
pub use workflow::{AnalysisFlow, DocCtx};
