use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocalWriterError {
    #[error("API error: {0}")]
    Api(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write settings: {0}")]
    ConfigWrite(String),

    #[error("Completion error: {0}")]
    Completion(String),

    #[error("Provider lookup failed: {0}")]
    CapabilityLookup(String),

    #[error("{message}: {source}")]
    Context {
        message: String,
        #[source]
        source: Box<LocalWriterError>,
    },
}

impl LocalWriterError {
    /// Wraps any failure raised while resolving or dispatching a request so
    /// callers see a single completion error carrying the original message.
    pub fn into_completion(self) -> Self {
        match self {
            LocalWriterError::Completion(_) => self,
            other => LocalWriterError::Completion(other.detail()),
        }
    }

    /// The message without the variant's prefix, as written into a
    /// failed selection or shown by the connection test
    pub fn detail(&self) -> String {
        match self {
            LocalWriterError::Api(msg)
            | LocalWriterError::Config(msg)
            | LocalWriterError::ConfigWrite(msg)
            | LocalWriterError::Completion(msg)
            | LocalWriterError::CapabilityLookup(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// A suggestion for the user, when one is obvious from the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            LocalWriterError::Completion(msg) if msg.starts_with("No model configured") => {
                Some("Run `localwriter settings` and enter a model name")
            }
            LocalWriterError::Http(e) if e.is_connect() => {
                Some("Check that the endpoint is reachable and the server is running")
            }
            LocalWriterError::Api(msg) | LocalWriterError::Completion(msg)
                if msg.contains("status 401") || msg.contains("status 403") =>
            {
                Some("Check the API key for this provider")
            }
            LocalWriterError::Context { source, .. } => source.hint(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, LocalWriterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_completion_keeps_message() {
        let err = LocalWriterError::Api("status 401: bad key".to_string()).into_completion();
        assert_eq!(err.to_string(), "Completion error: status 401: bad key");
        assert_eq!(err.detail(), "status 401: bad key");
    }

    #[test]
    fn test_detail_of_wrapped_errors_keeps_context() {
        let err = LocalWriterError::Context {
            message: "Failed to read selection from notes.txt".to_string(),
            source: Box::new(LocalWriterError::Config("missing".to_string())),
        };
        assert_eq!(
            err.detail(),
            "Failed to read selection from notes.txt: Configuration error: missing"
        );
    }

    #[test]
    fn test_auth_hint_survives_completion_wrapping() {
        let err = LocalWriterError::Api(
            "API request failed with status 401 Unauthorized: invalid key".to_string(),
        )
        .into_completion();
        assert!(err.hint().unwrap().contains("API key"));
    }

    #[test]
    fn test_hints() {
        let err = LocalWriterError::Completion("No model configured; set one".to_string());
        assert!(err.hint().unwrap().contains("settings"));

        let err = LocalWriterError::Context {
            message: "Testing connection".to_string(),
            source: Box::new(LocalWriterError::Api("status 401 Unauthorized".to_string())),
        };
        assert!(err.hint().unwrap().contains("API key"));

        assert!(LocalWriterError::Config("x".to_string()).hint().is_none());
    }

    #[test]
    fn test_into_completion_is_idempotent() {
        let err = LocalWriterError::Completion("no model configured".to_string())
            .into_completion()
            .into_completion();
        assert_eq!(err.to_string(), "Completion error: no model configured");
    }
}
