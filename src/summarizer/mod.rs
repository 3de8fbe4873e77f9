pub mod client;

pub use client::{ChatClient, GenerationRequest, TextGenerator};

use tracing::{info, warn};

use crate::config::SummarizerConfig;
use crate::parser::SectionLabel;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that simplifies scientific content.";

/// 单个章节的摘要结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Summarized(String),
    Failed(String),
}

pub struct Summarizer {
    generator: Box<dyn TextGenerator>,
    temperature: f32,
    max_tokens: u32,
}

impl Summarizer {
    pub fn new(generator: Box<dyn TextGenerator>, config: &SummarizerConfig) -> Self {
        Self {
            generator,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    /// 为一个章节生成面向大众的摘要。
    ///
    /// 章节全文原样放入提示词，不做截断；输出长度由 `max_tokens` 限制。
    pub async fn summarize(&self, label: SectionLabel, section_text: &str) -> SummaryOutcome {
        let request = GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(label, section_text),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        info!("正在摘要章节 [{}] ({} 字符)", label, section_text.len());

        match self.generator.generate(&request).await {
            Ok(text) => {
                let summary = text.trim();
                if summary.is_empty() {
                    warn!("章节 [{}] 返回空摘要", label);
                    SummaryOutcome::Failed("empty response".to_string())
                } else {
                    SummaryOutcome::Summarized(summary.to_string())
                }
            }
            Err(e) => {
                warn!("章节 [{}] 摘要失败: {}", label, e);
                SummaryOutcome::Failed(e.to_string())
            }
        }
    }
}

fn build_prompt(label: SectionLabel, section_text: &str) -> String {
    format!(
        "You are a science communicator. Below is one section of a scientific paper.\n\
         Write a short summary of it for a general audience: avoid jargon, explain any \
         concept you keep, and stay concise.\n\
         \n\
         SECTION TYPE: {label}\n\
         \n\
         TEXT:\n\
         \"\"\"{text}\"\"\"\n\
         \n\
         SUMMARY:\n",
        label = label,
        text = section_text,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{PaperError, PaperResult};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Canned {
        reply: PaperResult<String>,
        seen: Mutex<Vec<GenerationRequest>>,
    }

    impl Canned {
        fn new(reply: PaperResult<String>) -> Self {
            Self {
                reply,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, request: &GenerationRequest) -> PaperResult<String> {
            self.seen.lock().unwrap().push(request.clone());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(PaperError::Generation(e.to_string())),
            }
        }
    }

    struct Shared(std::sync::Arc<Canned>);

    #[async_trait]
    impl TextGenerator for Shared {
        async fn generate(&self, request: &GenerationRequest) -> PaperResult<String> {
            self.0.generate(request).await
        }
    }

    fn summarizer_with(canned: std::sync::Arc<Canned>) -> Summarizer {
        Summarizer::new(Box::new(Shared(canned)), &SummarizerConfig::default())
    }

    #[tokio::test]
    async fn test_summary_is_trimmed() {
        let canned = std::sync::Arc::new(Canned::new(Ok("  Plain words.\n".to_string())));
        let outcome = summarizer_with(canned)
            .summarize(SectionLabel::Results, "Results\np < 0.05")
            .await;
        assert_eq!(outcome, SummaryOutcome::Summarized("Plain words.".to_string()));
    }

    #[tokio::test]
    async fn test_service_error_becomes_failed_outcome() {
        let canned = std::sync::Arc::new(Canned::new(Err(PaperError::Generation(
            "connection reset".to_string(),
        ))));
        let outcome = summarizer_with(canned)
            .summarize(SectionLabel::Methods, "Methods\nWe did stuff.")
            .await;
        match outcome {
            SummaryOutcome::Failed(reason) => assert!(reason.contains("connection reset")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_response_is_a_failure() {
        let canned = std::sync::Arc::new(Canned::new(Ok("   \n".to_string())));
        let outcome = summarizer_with(canned)
            .summarize(SectionLabel::Abstract, "Abstract\nText.")
            .await;
        assert!(matches!(outcome, SummaryOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_request_carries_full_text_and_limits() {
        let canned = std::sync::Arc::new(Canned::new(Ok("ok".to_string())));
        let long_text = "word ".repeat(5_000);
        summarizer_with(canned.clone())
            .summarize(SectionLabel::Discussion, &long_text)
            .await;

        let seen = canned.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].prompt.contains("SECTION TYPE: discussion"));
        assert!(seen[0].prompt.contains(&long_text));
        assert_eq!(seen[0].max_tokens, 500);
        assert!((seen[0].temperature - 0.5).abs() < f32::EPSILON);
        assert_eq!(seen[0].system_prompt, SYSTEM_PROMPT);
    }
}
