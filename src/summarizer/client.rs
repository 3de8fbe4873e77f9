use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::SummarizerConfig;
use crate::utils::{PaperError, PaperResult};

/// 一次生成请求
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// 文本生成服务
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> PaperResult<String>;
}

/// Chat Completions 请求体
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat Completions 响应体
#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn first_content(self) -> Option<String> {
        self.choices.into_iter().next().and_then(|c| c.message.content)
    }
}

/// OpenAI 兼容的对话接口客户端
pub struct ChatClient {
    client: reqwest::Client,
    config: SummarizerConfig,
}

impl ChatClient {
    pub fn new(config: SummarizerConfig) -> PaperResult<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs));

        if !config.proxy.is_empty() {
            match reqwest::Proxy::all(&config.proxy) {
                Ok(proxy) => {
                    info!("使用代理: {}", config.proxy);
                    builder = builder.proxy(proxy);
                }
                Err(e) => {
                    warn!("代理配置无效 '{}': {}", config.proxy, e);
                }
            }
        }

        let client = builder
            .build()
            .map_err(|e| PaperError::Config(format!("无法创建HTTP客户端: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl TextGenerator for ChatClient {
    async fn generate(&self, request: &GenerationRequest) -> PaperResult<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        debug!("调用生成接口: {} ({})", self.config.api_url, self.config.model);

        let response = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| PaperError::Generation(format!("发送请求失败: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PaperError::Generation(format!(
                "API 返回错误 {}: {}",
                status, text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| PaperError::Generation(format!("解析 API 响应失败: {}", e)))?;

        chat_response
            .first_content()
            .ok_or_else(|| PaperError::Generation("响应中没有生成内容".to_string()))
    }
}
