pub mod bundle;
pub mod config;
pub mod error;
pub mod extension;
pub mod install;
pub mod pack;
pub mod registry;

pub use config::Settings;
pub use error::{Error, Result, ValidationError, Violation};
