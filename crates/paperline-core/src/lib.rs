pub mod config;
pub mod error;
pub mod models;

pub use config::{AppConfig, DatesConfig, HttpConfig, SinkConfig};
pub use error::{CoreError, Result};
pub use models::*;
