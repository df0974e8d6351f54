//! LLM API 客户端
//!
//! 使用 `async-openai` 调用兼容 OpenAI API 的服务，作为 `Oracle` 的实现。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::OracleFailure;
use crate::services::oracle::Oracle;

/// LLM 客户端
pub struct LlmClient {
    client: Client<OpenAIConfig>,
    model_name: String,
    temperature: f32,
    max_tokens: u32,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
            temperature: config.llm_temperature,
            max_tokens: config.llm_max_tokens,
        }
    }

    /// 构建编辑提示词，要求按固定 JSON 结构返回每个段落的结果
    pub fn build_system_message(instruction: &str) -> String {
        format!(
            r#"You are a professional document editor. Analyze the given paragraphs and suggest improvements based on this request: "{}"

For each paragraph, return your response in this exact JSON format:
{{
    "suggestions": [
        {{
            "paragraph_number": 0,
            "has_suggestion": true/false,
            "suggested_text": "improved version of the text",
            "reason": "brief explanation of the change"
        }},
        ...
    ]
}}

Only suggest changes if they meaningfully improve the text. If no changes are needed for a paragraph, set has_suggestion to false for that paragraph.
Process all paragraphs provided and return suggestions for each one. Respond with the JSON object only."#,
            instruction
        )
    }

    /// 构建一次批次请求，要求服务端只返回 JSON 对象
    pub fn build_request(
        &self,
        batch_text: &str,
        instruction: &str,
    ) -> Result<CreateChatCompletionRequest, OracleFailure> {
        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content(Self::build_system_message(instruction))
            .build()
            .map_err(|e| self.request_failed(e))?;

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(batch_text)
            .build()
            .map_err(|e| self.request_failed(e))?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(vec![
                ChatCompletionRequestMessage::System(system_msg),
                ChatCompletionRequestMessage::User(user_msg),
            ])
            .response_format(ResponseFormat::JsonObject)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| self.request_failed(e))
    }

    fn request_failed(&self, message: impl ToString) -> OracleFailure {
        OracleFailure::Request {
            model: self.model_name.clone(),
            message: message.to_string(),
        }
    }
}

#[async_trait]
impl Oracle for LlmClient {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn complete(&self, batch_text: &str, instruction: &str) -> Result<String, OracleFailure> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("批次文本长度: {} 字符", batch_text.len());

        let request = self.build_request(batch_text, instruction)?;
        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            self.request_failed(e)
        })?;

        debug!("LLM API 调用成功");

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| OracleFailure::EmptyResponse {
                model: self.model_name.clone(),
            })
    }
}
