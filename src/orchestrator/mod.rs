//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `document_editor` - 文档编辑器
//! - 持有文档注册表、建议存储、上传目录和分析流程
//! - 对外提供 upload / analyze / apply / fetch_output / delete
//!
//! ### `app` - 应用生命周期
//! - 启动日志、准备上传目录、启动 HTTP 服务
//!
//! ## 层次关系
//!
//! ```text
//! app (HTTP 服务)
//!     ↓
//! document_editor (按文档 ID 编排)
//!     ↓
//! workflow::AnalysisFlow (一次分析)
//!     ↓
//! services (能力层：segmenter / batcher / fallback / applier)
//!     ↓
//! infrastructure (基础设施：DocxDocument / KeyValueStore / UploadStore)
//! ```

pub mod app;
pub mod document_editor;

pub use app::App;
pub use document_editor::{ApplyOutcome, DocumentEditor, OutputFile, DEFAULT_DOWNLOAD_FILENAME};
