use super::types::*;
use super::utils::{check_response_status, endpoint_url, REQUEST_TIMEOUT};
use crate::error::{LocalWriterError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};

const MESSAGES_PATH: &str = "/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<&'a Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: reqwest::Client,
    url: String,
}

impl AnthropicClient {
    pub fn new(api_base: &str, api_key: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(api_key) = api_key {
            headers.insert(
                "x-api-key",
                HeaderValue::from_str(api_key)
                    .map_err(|e| LocalWriterError::Config(format!("Invalid API key format: {}", e)))?,
            );
        }
        headers.insert("anthropic-version", HeaderValue::from_static(API_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LocalWriterError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: endpoint_url(api_base, MESSAGES_PATH),
        })
    }

    pub async fn create_message(
        &self,
        model: &str,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse> {
        let body = messages_body(model, request);

        tracing::debug!(url = %self.url, model = model, "Sending Anthropic messages request");

        let response = self.client.post(&self.url).json(&body).send().await?;
        let response = check_response_status(response).await?;
        let parsed: MessagesResponse = response.json().await?;

        Ok(into_completion_response(parsed))
    }
}

/// The messages API takes system text as a top-level field, not as a turn
fn messages_body<'a>(model: &'a str, request: &'a CompletionRequest) -> MessagesBody<'a> {
    let (system, turns): (Vec<&Message>, Vec<&Message>) = request
        .messages
        .iter()
        .partition(|m| m.role == Role::System);

    let system = if system.is_empty() {
        None
    } else {
        Some(
            system
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n\n"),
        )
    };

    MessagesBody {
        model,
        max_tokens: request.max_tokens,
        messages: turns,
        system,
    }
}

fn into_completion_response(response: MessagesResponse) -> CompletionResponse {
    let text: String = response
        .content
        .into_iter()
        .filter_map(|block| match block {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other => None,
        })
        .collect();
    CompletionResponse::from_text(text)
}
