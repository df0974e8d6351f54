pub mod download_client;
pub mod llm_client;

pub use download_client::DownloadClient;
pub use llm_client::LlmClient;
