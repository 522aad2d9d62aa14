use config::{Config, ConfigBuilder, ConfigError, File};
use config::builder::DefaultState;
use lettre::{message::Mailbox, Address};
use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// Environment variables and the config keys they override.
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("CONTACT_SERVER_HOST", "server.host"),
    ("CONTACT_SERVER_PORT", "server.port"),
    ("CONTACT_TRUST_PROXY", "server.trust_proxy"),
    ("CONTACT_MAX_BODY_BYTES", "server.max_body_bytes"),
    ("CONTACT_MAX_MESSAGE_LENGTH", "contact.max_message_length"),
    ("CONTACT_RATE_LIMIT_WINDOW_MS", "rate_limit.window_ms"),
    ("CONTACT_RATE_LIMIT_MAX", "rate_limit.max_requests"),
    ("CONTACT_ALLOWED_ORIGINS", "cors.allowed_origins"),
    ("SMTP_HOST", "smtp.host"),
    ("SMTP_PORT", "smtp.port"),
    ("SMTP_SECURE", "smtp.secure"),
    ("SMTP_USER", "smtp.username"),
    ("SMTP_PASS", "smtp.password"),
    ("CONTACT_RECEIVER", "smtp.recipients"),
    ("CONTACT_FROM_NAME", "smtp.from_name"),
    ("CONTACT_FROM_ADDRESS", "smtp.from_address"),
    ("CONTACT_FALLBACK_EMAIL", "fallback.address"),
    ("CONTACT_FALLBACK_URL", "fallback.base_url"),
    ("CONTACT_DELIVERY_TIMEOUT_SECS", "delivery.attempt_timeout_seconds"),
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub contact: ContactConfig,
    pub rate_limit: RateLimitConfig,
    pub cors: CorsConfig,
    pub smtp: SmtpConfig,
    pub fallback: FallbackConfig,
    pub delivery: DeliveryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Take the caller address from `X-Forwarded-For` / `X-Real-IP`.
    pub trust_proxy: bool,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactConfig {
    pub max_message_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    #[serde(default, deserialize_with = "comma_list")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: Option<String>,
    pub port: u16,
    pub secure: bool,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "comma_list")]
    pub recipients: Vec<String>,
    pub from_name: String,
    pub from_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    pub address: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    pub attempt_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            contact: ContactConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            smtp: SmtpConfig::default(),
            fallback: FallbackConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            trust_proxy: true,
            max_body_bytes: 32 * 1024,
        }
    }
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            max_message_length: 4000,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: 15 * 60 * 1000,
            max_requests: 5,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            secure: false,
            username: None,
            password: None,
            recipients: Vec::new(),
            from_name: "Portfolio Contact".to_string(),
            from_address: None,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            address: None,
            base_url: "https://formsubmit.co/ajax".to_string(),
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            attempt_timeout_seconds: 10,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl DeliveryConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_seconds)
    }
}

impl SmtpConfig {
    /// Port 465 always means implicit TLS.
    pub fn implicit_tls(&self) -> bool {
        self.secure || self.port == 465
    }
}

impl AppConfig {
    /// Defaults, then `contact.toml` if present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(Some("contact"), |key| std::env::var(key).ok())
    }

    /// Same layering as [`AppConfig::load`] with an injectable file and
    /// environment lookup.
    pub fn load_with<F>(file: Option<&str>, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if let Some(name) = file {
            builder = builder.add_source(File::with_name(name).required(false));
        }

        builder = apply_env_overrides(builder, lookup)?;

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;
        let app_config = app_config.normalize();

        app_config.validate()?;

        Ok(app_config)
    }

    /// Blank strings become unset and the relay's derived defaults are filled
    /// in: recipients and sender fall back to the SMTP user, the fallback
    /// address to the first recipient.
    pub fn normalize(mut self) -> Self {
        self.smtp.host = non_blank(self.smtp.host);
        self.smtp.username = non_blank(self.smtp.username);
        self.smtp.password = non_blank(self.smtp.password);
        self.smtp.from_address = non_blank(self.smtp.from_address);
        self.fallback.address = non_blank(self.fallback.address);

        self.smtp.recipients = clean_list(self.smtp.recipients);
        self.cors.allowed_origins = clean_list(self.cors.allowed_origins);
        self.smtp.from_name = self.smtp.from_name.trim().to_string();

        if self.smtp.recipients.is_empty() {
            if let Some(user) = &self.smtp.username {
                self.smtp.recipients.push(user.clone());
            }
        }

        if self.smtp.from_address.is_none() {
            self.smtp.from_address = self.smtp.username.clone();
        }

        if self.fallback.address.is_none() {
            self.fallback.address = self.smtp.recipients.first().cloned();
        }

        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Message(
                "Max body size must be greater than 0".to_string(),
            ));
        }

        if self.contact.max_message_length < 10 {
            return Err(ConfigError::Message(
                "Max message length must be at least 10".to_string(),
            ));
        }

        if self.rate_limit.window_ms == 0 {
            return Err(ConfigError::Message(
                "Rate limit window must be greater than 0".to_string(),
            ));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(ConfigError::Message(
                "Rate limit max requests must be greater than 0".to_string(),
            ));
        }

        if self.delivery.attempt_timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Delivery attempt timeout must be greater than 0".to_string(),
            ));
        }

        if self.fallback.base_url.trim().is_empty() {
            return Err(ConfigError::Message(
                "Fallback base URL cannot be empty".to_string(),
            ));
        }

        if self.cors.allowed_origins.iter().any(|origin| origin == "*") {
            return Err(ConfigError::Message(
                "Wildcard origin \"*\" is not supported, list allowed origins explicitly".to_string(),
            ));
        }

        if self.smtp.host.is_some() && !self.smtp_configured() {
            tracing::warn!("SMTP host is set but credentials are incomplete - SMTP delivery disabled");
        }

        if self.smtp_configured() {
            for problem in self.smtp_address_problems() {
                tracing::warn!("{} - SMTP delivery disabled", problem);
            }
        }

        Ok(())
    }

    /// Host and credentials are present. Recipients are not considered.
    pub fn smtp_configured(&self) -> bool {
        self.smtp.host.is_some() && self.smtp.username.is_some() && self.smtp.password.is_some()
    }

    /// Credentials, at least one recipient, and every address parses.
    pub fn primary_usable(&self) -> bool {
        self.smtp_configured()
            && !self.smtp.recipients.is_empty()
            && self.smtp_address_problems().is_empty()
    }

    /// Recipients and the sender address that would be rejected when the
    /// mail is built.
    pub fn smtp_address_problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .smtp
            .recipients
            .iter()
            .filter(|r| r.parse::<Mailbox>().is_err())
            .map(|r| format!("Invalid recipient address {:?}", r))
            .collect();

        if let Some(from) = self.smtp.from_address.as_ref().or(self.smtp.username.as_ref()) {
            if from.parse::<Address>().is_err() {
                problems.push(format!("Invalid sender address {:?}", from));
            }
        }

        problems
    }

    pub fn fallback_usable(&self) -> bool {
        self.fallback.address.is_some()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn apply_env_overrides<F>(
    mut builder: ConfigBuilder<DefaultState>,
    lookup: F,
) -> Result<ConfigBuilder<DefaultState>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    for (var, key) in ENV_OVERRIDES {
        builder = builder.set_override_option(*key, lookup(var))?;
    }
    Ok(builder)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Accepts either a sequence or a comma-separated string.
fn comma_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ListOrCsv {
        List(Vec<String>),
        Csv(String),
    }

    Ok(match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(values) => values,
        ListOrCsv::Csv(raw) => raw.split(',').map(str::to_string).collect(),
    })
}
