use crate::error::{LocalWriterError, Result};
use crate::error_ext::OptionExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = "localwriter";
const CONFIG_FILE: &str = "localwriter.json";

pub const DEFAULT_EXTEND_MAX_TOKENS: u32 = 70;
pub const DEFAULT_EDIT_MAX_NEW_TOKENS: u32 = 0;

/// Recognized setting names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Endpoint,
    Provider,
    Model,
    ApiKey,
    ExtendMaxTokens,
    ExtendSystemPrompt,
    EditMaxNewTokens,
    EditSystemPrompt,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 8] = [
        ConfigKey::Endpoint,
        ConfigKey::Provider,
        ConfigKey::Model,
        ConfigKey::ApiKey,
        ConfigKey::ExtendMaxTokens,
        ConfigKey::ExtendSystemPrompt,
        ConfigKey::EditMaxNewTokens,
        ConfigKey::EditSystemPrompt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigKey::Endpoint => "endpoint",
            ConfigKey::Provider => "provider",
            ConfigKey::Model => "model",
            ConfigKey::ApiKey => "api_key",
            ConfigKey::ExtendMaxTokens => "extend_selection_max_tokens",
            ConfigKey::ExtendSystemPrompt => "extend_selection_system_prompt",
            ConfigKey::EditMaxNewTokens => "edit_selection_max_new_tokens",
            ConfigKey::EditSystemPrompt => "edit_selection_system_prompt",
        }
    }
}

impl std::fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Anything that can answer "what is the value of this setting".
///
/// The persisted store is the usual source; an unsaved settings form is
/// another, used when a request must not see persisted values at all.
pub trait ConfigSource {
    fn lookup(&self, key: ConfigKey) -> Option<Value>;

    /// String value of `key`, or empty when absent or not a scalar.
    fn string(&self, key: ConfigKey) -> String {
        self.lookup(key)
            .and_then(|v| value_as_string(&v))
            .unwrap_or_default()
    }

    /// Token count for `key`; integers and digit strings are both accepted.
    fn tokens(&self, key: ConfigKey, default: u32) -> u32 {
        self.lookup(key)
            .and_then(|v| value_as_u32(&v))
            .unwrap_or(default)
    }
}

impl ConfigSource for Map<String, Value> {
    fn lookup(&self, key: ConfigKey) -> Option<Value> {
        self.get(key.as_str()).cloned()
    }
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_as_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Durable key/value settings backed by a single JSON object on disk.
///
/// Reads never fail: a missing, unreadable or malformed file behaves as an
/// empty mapping. Writes are read-merge-write, so keys this crate does not
/// know about survive every `set`.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<user config dir>/localwriter/localwriter.json`
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
            .or_config("Could not determine the user configuration directory")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load_or_empty().remove(key) {
            Some(value) => serde_json::from_value(value).unwrap_or(default),
            None => default,
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut data = self.load_or_empty();
        data.insert(key.to_string(), value);

        self.write(&data).map_err(|e| {
            tracing::warn!(path = %self.path.display(), key = key, error = %e, "Failed to write settings");
            LocalWriterError::ConfigWrite(format!("{}: {}", self.path.display(), e))
        })
    }

    /// The whole stored mapping, empty when the file is absent or malformed.
    ///
    /// Requests resolve every setting from one snapshot so a concurrent
    /// `set` cannot mix two versions of the file into a single request.
    pub fn snapshot(&self) -> Map<String, Value> {
        self.load_or_empty()
    }

    fn load(&self) -> Result<Map<String, Value>> {
        let content = fs::read_to_string(&self.path)?;
        match serde_json::from_str::<Value>(&content)? {
            Value::Object(map) => Ok(map),
            _ => Err(LocalWriterError::Config(
                "settings file is not a JSON object".to_string(),
            )),
        }
    }

    fn load_or_empty(&self) -> Map<String, Value> {
        if !self.path.exists() {
            return Map::new();
        }
        self.load().unwrap_or_else(|e| {
            tracing::debug!(path = %self.path.display(), error = %e, "Ignoring unreadable settings file");
            Map::new()
        })
    }

    fn write(&self, data: &Map<String, Value>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(data)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)?;
        fs::rename(&tmp_path, &self.path).inspect_err(|_| {
            let _ = fs::remove_file(&tmp_path);
        })?;
        Ok(())
    }
}

/// Every recognized setting with its default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: String,
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub extend_selection_max_tokens: u32,
    pub extend_selection_system_prompt: String,
    pub edit_selection_max_new_tokens: u32,
    pub edit_selection_system_prompt: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            provider: String::new(),
            model: String::new(),
            api_key: String::new(),
            extend_selection_max_tokens: DEFAULT_EXTEND_MAX_TOKENS,
            extend_selection_system_prompt: String::new(),
            edit_selection_max_new_tokens: DEFAULT_EDIT_MAX_NEW_TOKENS,
            edit_selection_system_prompt: String::new(),
        }
    }
}

impl Settings {
    pub fn load(source: &dyn ConfigSource) -> Self {
        Self {
            endpoint: source.string(ConfigKey::Endpoint),
            provider: source.string(ConfigKey::Provider),
            model: source.string(ConfigKey::Model),
            api_key: source.string(ConfigKey::ApiKey),
            extend_selection_max_tokens: source
                .tokens(ConfigKey::ExtendMaxTokens, DEFAULT_EXTEND_MAX_TOKENS),
            extend_selection_system_prompt: source.string(ConfigKey::ExtendSystemPrompt),
            edit_selection_max_new_tokens: source
                .tokens(ConfigKey::EditMaxNewTokens, DEFAULT_EDIT_MAX_NEW_TOKENS),
            edit_selection_system_prompt: source.string(ConfigKey::EditSystemPrompt),
        }
    }
}
