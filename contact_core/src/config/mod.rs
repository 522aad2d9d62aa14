pub mod settings;

pub use settings::{
    AppConfig, ContactConfig, CorsConfig, DeliveryConfig, FallbackConfig, RateLimitConfig,
    ServerConfig, SmtpConfig,
};
