use crate::error::{LocalWriterError, Result};
use std::path::Path;

/// Says what localwriter was doing when a lower-level call failed
pub trait ResultExt<T> {
    fn context(self, doing: impl Into<String>) -> Result<T>;

    /// `Failed to <verb> <path>`, for reads and writes of selections and settings
    fn path_context(self, verb: &str, path: &Path) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LocalWriterError>,
{
    fn context(self, doing: impl Into<String>) -> Result<T> {
        self.map_err(|e| wrap(doing.into(), e.into()))
    }

    fn path_context(self, verb: &str, path: &Path) -> Result<T> {
        self.map_err(|e| wrap(format!("Failed to {} {}", verb, path.display()), e.into()))
    }
}

fn wrap(message: String, source: LocalWriterError) -> LocalWriterError {
    LocalWriterError::Context {
        message,
        source: Box::new(source),
    }
}

/// Names the error a missing value stands for
pub trait OptionExt<T> {
    /// Missing from the environment or the settings
    fn or_config(self, message: impl Into<String>) -> Result<T>;

    /// Missing from a provider's reply
    fn or_api(self, message: impl Into<String>) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_config(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| LocalWriterError::Config(message.into()))
    }

    fn or_api(self, message: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| LocalWriterError::Api(message.into()))
    }
}
