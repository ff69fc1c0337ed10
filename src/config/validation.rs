//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use url::Url;

use crate::config::schema::ClientConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match Url::parse(&config.lcd.api_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "lcd.api_url",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "lcd.api_url",
            format!("'{}' is not a valid URL: {}", config.lcd.api_url, e),
        )),
    }

    if config.lcd.request_timeout_secs == 0 {
        errors.push(ValidationError::new("lcd.request_timeout_secs", "must be greater than 0"));
    }
    if config.lcd.connect_timeout_secs == 0 {
        errors.push(ValidationError::new("lcd.connect_timeout_secs", "must be greater than 0"));
    }

    let level = config.observability.log_level.to_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = ClientConfig::default();
        config.lcd.api_url = "ws://localhost:1317".to_string();
        config.lcd.request_timeout_secs = 0;
        config.observability.log_level = "loud".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec!["lcd.api_url", "lcd.request_timeout_secs", "observability.log_level"]
        );
    }

    #[test]
    fn test_invalid_url() {
        let mut config = ClientConfig::default();
        config.lcd.api_url = "not a url".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().starts_with("lcd.api_url"));
    }
}
