pub mod config;
pub mod error;
pub mod types;

pub use config::InsureConfig;
pub use error::{InsureError, Result, ServiceError};
pub use types::*;
