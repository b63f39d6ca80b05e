pub mod config;
pub mod error;
pub mod models;

pub use config::AppConfig;
pub use error::{ChatError, Result};
pub use models::ModelAlias;
