//! HTTP 接口层
//!
//! axum 路由，负责请求解析、响应组装和错误到状态码的映射

pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::orchestrator::DocumentEditor;

/// 上传大小上限
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// 路由共享状态
#[derive(Clone)]
pub struct ApiState {
    pub editor: Arc<DocumentEditor>,
    pub public_base_url: String,
}

impl ApiState {
    pub fn new(editor: Arc<DocumentEditor>, public_base_url: impl Into<String>) -> Self {
        Self {
            editor,
            public_base_url: public_base_url.into(),
        }
    }

    /// 修改后文档的下载地址
    pub fn download_url(&self, doc_id: &str) -> String {
        format!(
            "{}/api/download/{}",
            self.public_base_url.trim_end_matches('/'),
            doc_id
        )
    }
}

/// 构建路由
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        // 健康检查
        .route("/", get(handlers::health))
        .route("/api", get(handlers::health))
        .route("/api/", get(handlers::health))
        // 文档
        .route("/api/upload", post(handlers::upload))
        .route("/api/upload_url", post(handlers::upload_url))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/apply", post(handlers::apply))
        .route("/api/download/:doc_id", get(handlers::download))
        .route("/api/documents/:doc_id", delete(handlers::delete))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(state)
}
