use crate::api::{CompletionRequest, Message};
use crate::config::{
    ConfigKey, ConfigSource, DEFAULT_EDIT_MAX_NEW_TOKENS, DEFAULT_EXTEND_MAX_TOKENS,
};
use crate::error::{LocalWriterError, Result};

/// What to do with the selected text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Append a continuation after the selection
    Extend,
    /// Replace the selection with a rewrite following `instructions`
    Edit { instructions: String },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Extend => "extend",
            Action::Edit { .. } => "edit",
        }
    }
}

/// Values supplied by the caller that take precedence over stored settings.
///
/// `config` swaps the settings source entirely, so a connection test sees
/// only what was typed into the unsaved form.
#[derive(Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub model: Option<&'a str>,
    pub provider: Option<&'a str>,
    pub endpoint: Option<&'a str>,
    pub api_key: Option<&'a str>,
    pub max_tokens: Option<u32>,
    pub config: Option<&'a dyn ConfigSource>,
}

pub struct RequestBuilder<'a> {
    config: &'a dyn ConfigSource,
    action: &'a Action,
    input: &'a str,
    overrides: Overrides<'a>,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(config: &'a dyn ConfigSource, action: &'a Action, input: &'a str) -> Self {
        Self {
            config,
            action,
            input,
            overrides: Overrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: Overrides<'a>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn build(self) -> Result<CompletionRequest> {
        let config = self.overrides.config.unwrap_or(self.config);

        let provider = first_non_empty(self.overrides.provider, config, ConfigKey::Provider);
        let model_name = first_non_empty(self.overrides.model, config, ConfigKey::Model);
        let model = model_identifier(&provider, &model_name);
        if model.is_empty() {
            return Err(LocalWriterError::Completion(
                "No model configured; set a model name in the settings".to_string(),
            ));
        }

        let max_tokens = self
            .overrides
            .max_tokens
            .unwrap_or_else(|| self.token_budget(config));

        let endpoint = first_non_empty(self.overrides.endpoint, config, ConfigKey::Endpoint);
        let api_key = first_non_empty(self.overrides.api_key, config, ConfigKey::ApiKey);

        let request = CompletionRequest {
            model,
            messages: self.messages(config),
            max_tokens,
            api_base: accepted_endpoint(&endpoint),
            api_key: Some(api_key).filter(|k| !k.is_empty()),
        };

        tracing::debug!(
            action = self.action.name(),
            model = %request.model,
            max_tokens = request.max_tokens,
            messages = request.messages.len(),
            api_base = ?request.api_base,
            has_api_key = request.api_key.is_some(),
            "Resolved completion request"
        );

        Ok(request)
    }

    fn messages(&self, config: &dyn ConfigSource) -> Vec<Message> {
        let (prompt_key, user_content) = match self.action {
            Action::Extend => (ConfigKey::ExtendSystemPrompt, self.input.to_string()),
            Action::Edit { instructions } => (
                ConfigKey::EditSystemPrompt,
                edit_prompt(self.input, instructions),
            ),
        };

        let mut messages = Vec::with_capacity(2);
        let system_prompt = config.string(prompt_key);
        if !system_prompt.is_empty() {
            messages.push(Message::system(system_prompt));
        }
        messages.push(Message::user(user_content));
        messages
    }

    fn token_budget(&self, config: &dyn ConfigSource) -> u32 {
        match self.action {
            Action::Extend => config.tokens(ConfigKey::ExtendMaxTokens, DEFAULT_EXTEND_MAX_TOKENS),
            Action::Edit { .. } => {
                let addend = config.tokens(ConfigKey::EditMaxNewTokens, DEFAULT_EDIT_MAX_NEW_TOKENS);
                let input_len = u32::try_from(self.input.chars().count()).unwrap_or(u32::MAX);
                input_len.saturating_add(addend)
            }
        }
    }
}

fn first_non_empty(explicit: Option<&str>, config: &dyn ConfigSource, key: ConfigKey) -> String {
    match explicit {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => config.string(key),
    }
}

/// `provider/model` when both are set, the bare model name otherwise.
/// No model name means no identifier; a default model is never substituted.
pub fn model_identifier(provider: &str, model: &str) -> String {
    if model.is_empty() {
        String::new()
    } else if provider.is_empty() {
        model.to_string()
    } else {
        format!("{}/{}", provider, model)
    }
}

/// Endpoints are only passed through when they use an HTTP scheme
pub fn accepted_endpoint(endpoint: &str) -> Option<String> {
    let lower = endpoint.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        Some(endpoint.to_string())
    } else {
        None
    }
}

fn edit_prompt(original: &str, instructions: &str) -> String {
    format!(
        "ORIGINAL VERSION:\n{}\nBelow is an edited version according to the following instructions. \
         There are no comments in the edited version.\nInstructions:\n{}\nEDITED VERSION:",
        original, instructions
    )
}
