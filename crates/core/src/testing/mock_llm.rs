//! Mock language model for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmUsage};

/// Mock implementation of the LlmClient trait.
///
/// Replies are chosen in order:
/// 1. a queued error from [`fail_next`](Self::fail_next)
/// 2. the first rule whose pattern occurs in the prompt
/// 3. the default reply
pub struct MockLlmClient {
    rules: Arc<RwLock<Vec<(String, String)>>>,
    default_reply: Arc<RwLock<String>>,
    queued_errors: Arc<RwLock<VecDeque<LlmError>>>,
    prompts: Arc<RwLock<Vec<CompletionRequest>>>,
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(RwLock::new(Vec::new())),
            default_reply: Arc::new(RwLock::new(String::new())),
            queued_errors: Arc::new(RwLock::new(VecDeque::new())),
            prompts: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Reply with `text` whenever the prompt contains `pattern`.
    pub async fn respond_when(&self, pattern: &str, text: &str) {
        self.rules
            .write()
            .await
            .push((pattern.to_string(), text.to_string()));
    }

    pub async fn set_default_reply(&self, text: &str) {
        *self.default_reply.write().await = text.to_string();
    }

    /// Fail the next call with `error`. Errors queue up in order.
    pub async fn fail_next(&self, error: LlmError) {
        self.queued_errors.write().await.push_back(error);
    }

    /// Requests received so far.
    pub async fn recorded_prompts(&self) -> Vec<CompletionRequest> {
        self.prompts.read().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.read().await.len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.prompts.write().await.push(request.clone());

        if let Some(error) = self.queued_errors.write().await.pop_front() {
            return Err(error);
        }

        let text = {
            let rules = self.rules.read().await;
            match rules.iter().find(|(pattern, _)| request.prompt.contains(pattern)) {
                Some((_, reply)) => reply.clone(),
                None => self.default_reply.read().await.clone(),
            }
        };

        Ok(CompletionResponse {
            usage: LlmUsage {
                input_tokens: request.prompt.len() as u32 / 4,
                output_tokens: text.len() as u32 / 4,
            },
            text,
            model: "mock-model".to_string(),
        })
    }
}
