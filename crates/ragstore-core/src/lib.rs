pub mod config;
pub mod error;

pub use config::RagstoreConfig;
pub use error::{Result, StoreError};
