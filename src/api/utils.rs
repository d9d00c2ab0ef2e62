use crate::error::{LocalWriterError, Result};
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub async fn check_response_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            error = %error_text,
            "API request failed"
        );
        return Err(LocalWriterError::Api(format!(
            "API request failed with status {}: {}",
            status, error_text
        )));
    }
    Ok(response)
}

/// Appends `path` to `base` unless the base already points at it
pub fn endpoint_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(path) {
        base.to_string()
    } else {
        format!("{}{}", base, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_appends_path() {
        assert_eq!(
            endpoint_url("http://localhost:1234/v1/", "/chat/completions"),
            "http://localhost:1234/v1/chat/completions"
        );
    }

    #[test]
    fn test_endpoint_url_keeps_full_url() {
        assert_eq!(
            endpoint_url("https://api.x.ai/v1/chat/completions", "/chat/completions"),
            "https://api.x.ai/v1/chat/completions"
        );
    }
}
