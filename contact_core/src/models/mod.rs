pub mod health;
pub mod request;

pub use health::{DeliveryMode, HealthReport};
pub use request::{ContactRequest, ContactResponse, Submission};
