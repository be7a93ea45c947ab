use std::fmt::Debug;

const DEFAULT_CHAT_PATH: &str = "/api/chat";
const DEFAULT_ASSIGNMENT_PATH: &str = "/api/generate-assignment";

/// Builder for [`GatewayConfig`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GatewayConfigBuilder {
    base_url: String,
    chat_path: Option<String>,
    assignment_path: Option<String>,
}

impl GatewayConfigBuilder {
    /// Creates a builder with the given base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(base_url: S) -> Self {
        Self {
            base_url: base_url.into(),
            chat_path: None,
            assignment_path: None,
        }
    }

    /// Sets a custom path for the chat endpoint.
    #[inline]
    pub fn with_chat_path<S: Into<String>>(mut self, path: S) -> Self {
        self.chat_path = Some(path.into());
        self
    }

    /// Sets a custom path for the assignment endpoint.
    #[inline]
    pub fn with_assignment_path<S: Into<String>>(mut self, path: S) -> Self {
        self.assignment_path = Some(path.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GatewayConfig {
        GatewayConfig {
            base_url: self.base_url,
            chat_path: self
                .chat_path
                .unwrap_or_else(|| DEFAULT_CHAT_PATH.to_string()),
            assignment_path: self
                .assignment_path
                .unwrap_or_else(|| DEFAULT_ASSIGNMENT_PATH.to_string()),
        }
    }
}

/// Configuration for the HTTP gateway.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GatewayConfig {
    pub(crate) base_url: String,
    pub(crate) chat_path: String,
    pub(crate) assignment_path: String,
}

impl GatewayConfig {
    #[inline]
    pub(crate) fn chat_url(&self) -> String {
        format!("{}{}", self.base_url, self.chat_path)
    }

    #[inline]
    pub(crate) fn assignment_url(&self) -> String {
        format!("{}{}", self.base_url, self.assignment_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let config =
            GatewayConfigBuilder::with_base_url("https://example.com").build();
        assert_eq!(config.chat_url(), "https://example.com/api/chat");
        assert_eq!(
            config.assignment_url(),
            "https://example.com/api/generate-assignment"
        );
    }

    #[test]
    fn test_custom_paths() {
        let config = GatewayConfigBuilder::with_base_url("http://localhost")
            .with_chat_path("/v2/chat")
            .with_assignment_path("/v2/assignment")
            .build();
        assert_eq!(config.chat_url(), "http://localhost/v2/chat");
        assert_eq!(config.assignment_url(), "http://localhost/v2/assignment");
    }
}
