//! Health report derived from the loaded configuration

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::AppConfig;

/// Which delivery path a submission would take right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryMode {
    Primary,
    FallbackOnly,
    Unconfigured,
}

impl DeliveryMode {
    /// Primary needs credentials and at least one recipient; credentials
    /// alone fall through to the fallback.
    pub fn from_config(config: &AppConfig) -> Self {
        if config.primary_usable() {
            DeliveryMode::Primary
        } else if config.fallback_usable() {
            DeliveryMode::FallbackOnly
        } else {
            DeliveryMode::Unconfigured
        }
    }
}

impl fmt::Display for DeliveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryMode::Primary => write!(f, "primary"),
            DeliveryMode::FallbackOnly => write!(f, "fallback-only"),
            DeliveryMode::Unconfigured => write!(f, "unconfigured"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub ok: bool,
    pub smtp_configured: bool,
    pub recipients_configured: bool,
    pub fallback_configured: bool,
    pub delivery_mode: DeliveryMode,
}

impl HealthReport {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ok: true,
            smtp_configured: config.smtp_configured(),
            recipients_configured: !config.smtp.recipients.is_empty(),
            fallback_configured: config.fallback_usable(),
            delivery_mode: DeliveryMode::from_config(config),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smtp_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.smtp.host = Some("smtp.example.com".to_string());
        config.smtp.username = Some("relay@example.com".to_string());
        config.smtp.password = Some("secret".to_string());
        config
    }

    #[test]
    fn test_delivery_mode_display() {
        assert_eq!(DeliveryMode::Primary.to_string(), "primary");
        assert_eq!(DeliveryMode::FallbackOnly.to_string(), "fallback-only");
        assert_eq!(DeliveryMode::Unconfigured.to_string(), "unconfigured");
    }

    #[test]
    fn test_unconfigured_by_default() {
        let report = HealthReport::from_config(&AppConfig::default());
        assert!(!report.smtp_configured);
        assert!(!report.recipients_configured);
        assert!(!report.fallback_configured);
        assert_eq!(report.delivery_mode, DeliveryMode::Unconfigured);
    }

    #[test]
    fn test_credentials_without_recipients_are_not_primary() {
        let mut config = smtp_config();
        config.fallback.address = Some("inbox@example.com".to_string());

        let report = HealthReport::from_config(&config);
        assert!(report.smtp_configured);
        assert!(!report.recipients_configured);
        assert_eq!(report.delivery_mode, DeliveryMode::FallbackOnly);
    }

    #[test]
    fn test_primary_mode() {
        let mut config = smtp_config();
        config.smtp.recipients = vec!["owner@example.com".to_string()];
        assert_eq!(DeliveryMode::from_config(&config), DeliveryMode::Primary);
    }

    #[test]
    fn test_wire_field_names() {
        let body = serde_json::to_value(HealthReport::from_config(&AppConfig::default())).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "ok": true,
                "smtpConfigured": false,
                "recipientsConfigured": false,
                "fallbackConfigured": false,
                "deliveryMode": "unconfigured",
            })
        );
    }
}
