mod app;
mod config;
mod http;
mod validation;

pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::{HttpError, TransportError};
pub use validation::ValidationError;
