pub mod document;
pub mod paragraph;
pub mod suggestion;

pub use document::{DocumentMetadata, DocumentRecord};
pub use paragraph::ParagraphUnit;
pub use suggestion::Suggestion;
