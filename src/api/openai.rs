use super::types::*;
use super::utils::{check_response_status, endpoint_url, REQUEST_TIMEOUT};
use crate::error::{LocalWriterError, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;

// Chat completions as spoken by OpenAI and every OpenAI-compatible server
// (ollama, LM Studio, vLLM, OpenRouter, ...)
const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    stream: bool,
}

#[derive(Clone)]
pub struct OpenAIClient {
    client: reqwest::Client,
    url: String,
}

impl OpenAIClient {
    pub fn new(api_base: &str, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", api_key))
                    .map_err(|e| LocalWriterError::Config(format!("Invalid API key: {}", e)))?,
            );
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LocalWriterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: endpoint_url(api_base, CHAT_COMPLETIONS_PATH),
        })
    }

    pub async fn create_chat_completion(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        let body = ChatCompletionBody {
            model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
            stream: false,
        };

        tracing::debug!(url = %self.url, model = model, "Sending chat completion request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let response = check_response_status(response).await?;
        let parsed: CompletionResponse = response.json().await?;

        if parsed.choices.is_empty() {
            return Err(LocalWriterError::Api(
                "Chat completion response contained no choices".to_string(),
            ));
        }
        Ok(parsed)
    }
}
