//! Payment gateway configuration (Asaas)

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Asaas API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// API root, production unless overridden with the sandbox URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key sent in the `access_token` header
    pub api_key: SecretString,

    /// Token the gateway presents on webhook deliveries
    pub webhook_token: SecretString,

    /// Upper bound for a single gateway call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.api_key.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_KEY"));
        }
        if self.webhook_token.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__WEBHOOK_TOKEN"));
        }
        if !self.api_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_api_url() -> String {
    "https://api.asaas.com/v3".to_string()
}

fn default_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        GatewayConfig {
            api_url: default_api_url(),
            api_key: SecretString::new("$aact_test_key".to_string()),
            webhook_token: SecretString::new("whk-token".to_string()),
            timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = valid();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let config = GatewayConfig {
            api_key: SecretString::new("  ".to_string()),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("GATEWAY__API_KEY"))
        );
    }

    #[test]
    fn test_empty_webhook_token_rejected() {
        let config = GatewayConfig {
            webhook_token: SecretString::new(String::new()),
            ..valid()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("GATEWAY__WEBHOOK_TOKEN"))
        );
    }

    #[test]
    fn test_plain_http_rejected() {
        let config = GatewayConfig {
            api_url: "http://api.asaas.com/v3".to_string(),
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::GatewayUrlMustBeHttps));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = GatewayConfig {
            timeout_secs: 0,
            ..valid()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTimeout));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", valid());
        assert!(!rendered.contains("$aact_test_key"));
        assert!(!rendered.contains("whk-token"));
    }
}
