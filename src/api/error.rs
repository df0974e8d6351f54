//! 错误到 HTTP 响应的映射

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::error::AppError;

/// 错误响应体
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// 错误对应的状态码
pub fn status_of(err: &AppError) -> StatusCode {
    match err {
        AppError::InvalidInput(_) | AppError::MalformedContainer(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::Oracle(_) | AppError::Download(_) => StatusCode::BAD_GATEWAY,
        AppError::Io(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = status_of(&self);
        if status.is_server_error() {
            error!("❌ 请求失败: {}", self);
        } else {
            warn!("请求被拒绝 ({}): {}", status.as_u16(), self);
        }

        let body = ErrorResponse {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
