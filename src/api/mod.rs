pub mod anthropic;
pub mod openai;
pub mod types;
pub mod utils;

pub use anthropic::AnthropicClient;
pub use openai::OpenAIClient;
pub use types::*;

use crate::error::{LocalWriterError, Result};
use crate::error_ext::OptionExt;
use crate::providers::{BuiltinProviders, ProviderRegistry, WireFormat};

/// Used when the model names no known provider and no endpoint is set
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Turns a resolved request into generated text, or fails with a message
/// fit to show the user.
pub trait CompletionBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

/// Where and how a request is actually sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub wire_format: WireFormat,
    pub api_base: String,
    pub model: String,
}

/// Splits `provider/model` and picks the wire format and base URL.
///
/// A known provider prefix is stripped from the model sent on the wire.
/// Anything else goes verbatim to an OpenAI-compatible endpoint.
pub fn resolve_route(registry: &dyn ProviderRegistry, request: &CompletionRequest) -> Result<Route> {
    if let Some((prefix, model)) = request.model.split_once('/') {
        if let Ok(info) = registry.lookup(prefix) {
            let api_base = request
                .api_base
                .clone()
                .or_else(|| info.default_api_base.map(str::to_string))
                .or_config(format!(
                    "Provider '{}' has no default endpoint; set one in the settings",
                    info.name
                ))?;
            return Ok(Route {
                wire_format: info.wire_format,
                api_base,
                model: model.to_string(),
            });
        }
    }

    Ok(Route {
        wire_format: WireFormat::OpenAiChat,
        api_base: request
            .api_base
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        model: request.model.clone(),
    })
}

/// Completion over HTTP, one blocking round trip per call
pub struct HttpBackend {
    runtime: tokio::runtime::Runtime,
    registry: BuiltinProviders,
}

impl HttpBackend {
    pub fn new() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| LocalWriterError::Config(format!("Failed to create async runtime: {}", e)))?;

        Ok(Self {
            runtime,
            registry: BuiltinProviders,
        })
    }
}

impl CompletionBackend for HttpBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let route = resolve_route(&self.registry, request)?;
        let api_key = request.api_key.as_deref();

        tracing::info!(
            model = %route.model,
            api_base = %route.api_base,
            wire_format = ?route.wire_format,
            "Dispatching completion"
        );

        match route.wire_format {
            WireFormat::OpenAiChat => {
                let client = OpenAIClient::new(&route.api_base, api_key)?;
                self.runtime
                    .block_on(client.create_chat_completion(&route.model, request))
            }
            WireFormat::Anthropic => {
                let client = AnthropicClient::new(&route.api_base, api_key)?;
                self.runtime.block_on(client.create_message(&route.model, request))
            }
        }
    }
}
