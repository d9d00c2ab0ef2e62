use crate::api::CompletionBackend;
use crate::config::{ConfigKey, ConfigStore, Settings};
use crate::request_builder::{Action, Overrides, RequestBuilder};
use serde_json::{Map, Value};

/// Fixed prompt sent by the connection test
pub const CONNECTION_PROBE: &str = "Hello, are you working?";
pub const CONNECTION_PROBE_MAX_TOKENS: u32 = 10;

/// Raw field values as submitted from the settings form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsForm {
    pub endpoint: String,
    pub model: String,
    pub provider: String,
    pub api_key: String,
    pub extend_selection_max_tokens: String,
    pub extend_selection_system_prompt: String,
    pub edit_selection_max_new_tokens: String,
    pub edit_selection_system_prompt: String,
}

impl SettingsForm {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            provider: settings.provider.clone(),
            api_key: settings.api_key.clone(),
            extend_selection_max_tokens: settings.extend_selection_max_tokens.to_string(),
            extend_selection_system_prompt: settings.extend_selection_system_prompt.clone(),
            edit_selection_max_new_tokens: settings.edit_selection_max_new_tokens.to_string(),
            edit_selection_system_prompt: settings.edit_selection_system_prompt.clone(),
        }
    }

    /// Only the fields that decide where a request goes and who pays for it
    pub fn connection_values(&self) -> Map<String, Value> {
        [
            (ConfigKey::Endpoint, &self.endpoint),
            (ConfigKey::Model, &self.model),
            (ConfigKey::Provider, &self.provider),
            (ConfigKey::ApiKey, &self.api_key),
        ]
        .into_iter()
        .map(|(key, value)| (key.as_str().to_string(), Value::String(value.clone())))
        .collect()
    }
}

/// Which keys were written, left alone, or failed to write
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOutcome {
    pub saved: Vec<ConfigKey>,
    pub skipped: Vec<ConfigKey>,
    pub failed: Vec<ConfigKey>,
}

/// Persists a submitted form.
///
/// Token fields are only stored when they are plain digits, and the endpoint
/// only when it starts with `http` (trailing slashes trimmed). A failed write
/// is logged and the remaining fields are still attempted.
pub fn apply_settings(store: &ConfigStore, form: &SettingsForm) -> SettingsOutcome {
    let mut outcome = SettingsOutcome::default();

    let mut record = |key: ConfigKey, value: Option<Value>| match value {
        None => outcome.skipped.push(key),
        Some(value) => match store.set(key.as_str(), value) {
            Ok(()) => outcome.saved.push(key),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Setting was not saved");
                outcome.failed.push(key);
            }
        },
    };

    record(
        ConfigKey::ExtendMaxTokens,
        parse_digits(&form.extend_selection_max_tokens).map(Value::from),
    );
    record(
        ConfigKey::ExtendSystemPrompt,
        Some(Value::from(form.extend_selection_system_prompt.clone())),
    );
    record(
        ConfigKey::EditMaxNewTokens,
        parse_digits(&form.edit_selection_max_new_tokens).map(Value::from),
    );
    record(
        ConfigKey::EditSystemPrompt,
        Some(Value::from(form.edit_selection_system_prompt.clone())),
    );
    record(
        ConfigKey::Endpoint,
        form.endpoint
            .starts_with("http")
            .then(|| Value::from(form.endpoint.trim_end_matches('/'))),
    );
    record(ConfigKey::Model, Some(Value::from(form.model.clone())));
    record(ConfigKey::Provider, Some(Value::from(form.provider.clone())));
    record(ConfigKey::ApiKey, Some(Value::from(form.api_key.clone())));

    outcome
}

fn parse_digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Sends the probe prompt using only the values typed into `form`.
///
/// Persisted settings are bypassed so the test reflects what would be saved.
pub fn test_connection(backend: &dyn CompletionBackend, form: &SettingsForm) -> String {
    let values = form.connection_values();
    let overrides = Overrides {
        model: Some(form.model.as_str()),
        provider: Some(form.provider.as_str()),
        endpoint: Some(form.endpoint.as_str()),
        api_key: Some(form.api_key.as_str()),
        max_tokens: Some(CONNECTION_PROBE_MAX_TOKENS),
        config: Some(&values),
    };

    let result = RequestBuilder::new(&values, &Action::Extend, CONNECTION_PROBE)
        .with_overrides(overrides)
        .build()
        .and_then(|request| {
            tracing::debug!(request = ?request, "Testing connection");
            backend.complete(&request)
        })
        .and_then(|response| response.text().map(str::to_string));

    match result {
        Ok(text) => format!("Success: {}", text),
        Err(e) => {
            tracing::warn!(error = %e, "Connection test failed");
            format!("Failed: {}", e.detail())
        }
    }
}
