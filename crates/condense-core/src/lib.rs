pub mod config;
pub mod error;
pub mod types;

pub use config::CondenseConfig;
pub use error::{CondenseError, Result};
pub use types::*;
