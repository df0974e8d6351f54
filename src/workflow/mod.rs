pub mod analysis_flow;
pub mod doc_ctx;

pub use analysis_flow::{AnalysisFlow, AnalysisMode, AnalysisReport};
pub use doc_ctx::DocCtx;
