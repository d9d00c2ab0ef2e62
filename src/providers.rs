use crate::error::{LocalWriterError, Result};

/// Request/response dialect spoken by a provider's HTTP API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireFormat {
    OpenAiChat,
    Anthropic,
}

/// Static metadata about a known provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    pub name: &'static str,
    pub wire_format: WireFormat,
    pub default_api_base: Option<&'static str>,
    pub requires_api_key: bool,
}

/// Lookup of provider metadata by name.
///
/// Kept behind a trait so the provider table can change (or be faked in
/// tests) without touching request resolution or capability hints.
pub trait ProviderRegistry {
    fn lookup(&self, provider: &str) -> Result<ProviderInfo>;
}

const PROVIDERS: &[ProviderInfo] = &[
    ProviderInfo {
        name: "openai",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.openai.com/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "anthropic",
        wire_format: WireFormat::Anthropic,
        default_api_base: Some("https://api.anthropic.com/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "openrouter",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://openrouter.ai/api/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "groq",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.groq.com/openai/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "xai",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.x.ai/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "deepseek",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.deepseek.com/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "mistral",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.mistral.ai/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "together_ai",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("https://api.together.xyz/v1"),
        requires_api_key: true,
    },
    ProviderInfo {
        name: "ollama",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("http://localhost:11434/v1"),
        requires_api_key: false,
    },
    ProviderInfo {
        name: "lm_studio",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("http://localhost:1234/v1"),
        requires_api_key: false,
    },
    ProviderInfo {
        name: "hosted_vllm",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: None,
        requires_api_key: false,
    },
    ProviderInfo {
        name: "llamafile",
        wire_format: WireFormat::OpenAiChat,
        default_api_base: Some("http://localhost:8080/v1"),
        requires_api_key: false,
    },
];

/// Providers that usually run on the user's own machine and therefore
/// expect the endpoint field to be filled in.
pub const LOCAL_PROVIDERS: &[&str] = &["ollama", "lm_studio", "hosted_vllm", "llamafile"];

/// The compiled-in provider table
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinProviders;

impl ProviderRegistry for BuiltinProviders {
    fn lookup(&self, provider: &str) -> Result<ProviderInfo> {
        let wanted = provider.trim().to_ascii_lowercase();
        PROVIDERS
            .iter()
            .find(|info| info.name == wanted)
            .copied()
            .ok_or_else(|| LocalWriterError::CapabilityLookup(format!("Unknown provider: {}", provider)))
    }
}

pub fn is_local_provider(provider: &str) -> bool {
    let wanted = provider.trim().to_ascii_lowercase();
    LOCAL_PROVIDERS.contains(&wanted.as_str())
}

/// Which settings fields a provider needs, as far as we can tell.
///
/// Informational only: it drives hints in the settings form and never
/// decides whether a request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderCapability {
    pub requires_api_key: bool,
    pub requires_endpoint: bool,
}

impl Default for ProviderCapability {
    fn default() -> Self {
        Self {
            requires_api_key: true,
            requires_endpoint: true,
        }
    }
}

/// Presentation hint for one settings field.
///
/// There is no read-only state: the user can always fill in a field the
/// heuristic did not highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldHint {
    pub highlighted: bool,
}

impl ProviderCapability {
    pub fn api_key_hint(&self) -> FieldHint {
        FieldHint {
            highlighted: self.requires_api_key,
        }
    }

    pub fn endpoint_hint(&self) -> FieldHint {
        FieldHint {
            highlighted: self.requires_endpoint,
        }
    }
}

/// Capability of `provider`, or `prior` unchanged when no provider is named.
///
/// A failed lookup assumes a key is required. The endpoint requirement
/// follows the local-provider allow-list regardless of the lookup.
pub fn capabilities_for(
    registry: &dyn ProviderRegistry,
    provider: &str,
    prior: ProviderCapability,
) -> ProviderCapability {
    let provider = provider.trim();
    if provider.is_empty() {
        return prior;
    }

    let requires_api_key = match registry.lookup(provider) {
        Ok(info) => info.requires_api_key,
        Err(e) => {
            tracing::debug!(provider = provider, error = %e, "Provider lookup failed, assuming API key is required");
            true
        }
    };

    ProviderCapability {
        requires_api_key,
        requires_endpoint: is_local_provider(provider),
    }
}

/// Tracks the capability shown for the provider currently selected in a form
pub struct CapabilityTracker<'a> {
    registry: &'a dyn ProviderRegistry,
    current: ProviderCapability,
}

impl<'a> CapabilityTracker<'a> {
    pub fn new(registry: &'a dyn ProviderRegistry) -> Self {
        Self {
            registry,
            current: ProviderCapability::default(),
        }
    }

    pub fn provider_changed(&mut self, provider: &str) -> ProviderCapability {
        self.current = capabilities_for(self.registry, provider, self.current);
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingRegistry;

    impl ProviderRegistry for FailingRegistry {
        fn lookup(&self, _provider: &str) -> Result<ProviderInfo> {
            Err(LocalWriterError::CapabilityLookup("registry offline".to_string()))
        }
    }

    #[test]
    fn test_known_hosted_provider() {
        let cap = capabilities_for(&BuiltinProviders, "openai", ProviderCapability::default());
        assert!(cap.requires_api_key);
        assert!(!cap.requires_endpoint);
    }

    #[test]
    fn test_local_provider_needs_endpoint_not_key() {
        let cap = capabilities_for(&BuiltinProviders, "ollama", ProviderCapability::default());
        assert!(!cap.requires_api_key);
        assert!(cap.requires_endpoint);
    }

    #[test]
    fn test_unknown_provider_requires_key() {
        let cap = capabilities_for(
            &BuiltinProviders,
            "my-private-gateway",
            ProviderCapability {
                requires_api_key: false,
                requires_endpoint: true,
            },
        );
        assert!(cap.requires_api_key);
        assert!(!cap.requires_endpoint);
    }

    #[test]
    fn test_registry_failure_keeps_endpoint_rule() {
        let cap = capabilities_for(&FailingRegistry, "lm_studio", ProviderCapability::default());
        assert!(cap.requires_api_key);
        assert!(cap.requires_endpoint);
    }

    #[test]
    fn test_empty_provider_keeps_prior_state() {
        let prior = ProviderCapability {
            requires_api_key: false,
            requires_endpoint: true,
        };
        assert_eq!(capabilities_for(&BuiltinProviders, "  ", prior), prior);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let info = BuiltinProviders.lookup(" Anthropic ").unwrap();
        assert_eq!(info.wire_format, WireFormat::Anthropic);
        assert!(BuiltinProviders.lookup("nope").is_err());
    }

    #[test]
    fn test_hints_follow_requirements() {
        let cap = capabilities_for(&BuiltinProviders, "openai", ProviderCapability::default());
        assert!(!cap.endpoint_hint().highlighted);
        assert!(cap.api_key_hint().highlighted);
    }

    #[test]
    fn test_tracker_follows_provider_changes() {
        let mut tracker = CapabilityTracker::new(&BuiltinProviders);
        assert_eq!(tracker.current, ProviderCapability::default());

        let local = tracker.provider_changed("ollama");
        assert!(!local.requires_api_key);

        assert_eq!(tracker.provider_changed(""), local);
        assert!(tracker.provider_changed("groq").requires_api_key);
    }
}
