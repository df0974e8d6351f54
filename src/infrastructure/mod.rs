pub mod docx;
pub mod kv_store;
pub mod upload_store;

pub use docx::{DocumentAccessor, DocxDocument};
pub use kv_store::{KeyValueStore, MemoryStore};
pub use upload_store::UploadStore;
