//! 应用入口 - 编排层
//!
//! 负责应用生命周期：打印启动信息、准备上传目录、创建 `DocumentEditor`、启动 HTTP 服务。

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{self, ApiState};
use crate::config::Config;
use crate::orchestrator::DocumentEditor;
use crate::utils::logging::log_startup;

/// 应用主结构
pub struct App {
    config: Config,
    editor: Arc<DocumentEditor>,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        log_startup(&config);

        let editor = DocumentEditor::new(&config).context("创建文档编辑器失败")?;
        editor.prepare().await.context("准备上传目录失败")?;

        Ok(Self {
            config,
            editor: Arc::new(editor),
        })
    }

    /// 运行 HTTP 服务，直到进程退出
    pub async fn run(self) -> Result<()> {
        let state = ApiState::new(self.editor.clone(), self.config.public_base_url.clone());
        let router = api::router(state);

        let listener = tokio::net::TcpListener::bind(&self.config.bind_addr)
            .await
            .with_context(|| format!("无法监听 {}", self.config.bind_addr))?;

        info!("🌐 服务已启动: http://{}", self.config.bind_addr);
        info!("🔗 对外地址: {}", self.config.public_base_url);

        axum::serve(listener, router).await?;

        Ok(())
    }
}
