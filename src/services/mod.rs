//! 业务能力层（Services）
//!
//! 每个模块描述"我能做什么"，不持有文档或存储：
//! - `segmenter` - 段落切分
//! - `batcher` - 分批、并发调用 Oracle、映射回段落
//! - `oracle` - Oracle 抽象与严格解码
//! - `fallback` - 无 Oracle 时的规则兜底
//! - `suggestion_builder` - 生成建议记录
//! - `applier` - 把选中的建议写回文档

pub mod applier;
pub mod batcher;
pub mod fallback;
pub mod oracle;
pub mod segmenter;
pub mod suggestion_builder;

pub use applier::{apply_suggestions, select_suggestions, ApplyReport};
pub use oracle::Oracle;
