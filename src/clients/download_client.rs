/// 远程下载客户端
///
/// 从公开 URL 拉取待上传的文档（跟随重定向，带超时）
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppResult, DownloadError};

/// 下载客户端
pub struct DownloadClient {
    client: reqwest::Client,
}

impl DownloadClient {
    /// 创建新的下载客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|source| DownloadError::RequestFailed {
                url: String::new(),
                source,
            })?;

        Ok(Self { client })
    }

    /// 下载文件内容
    ///
    /// # 参数
    /// - `url`: 公开可访问的文件地址
    ///
    /// # 返回
    /// 返回文件字节，非 2xx 状态码视为失败
    pub async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        info!("正在下载文件: {}", url);

        let request_failed = |source| DownloadError::RequestFailed {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }

        let bytes = response.bytes().await.map_err(request_failed)?;
        debug!("下载完成: {} 字节", bytes.len());

        Ok(bytes.to_vec())
    }
}
