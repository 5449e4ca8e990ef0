pub mod campaign;
pub mod config;
pub mod error;
pub mod records;
pub mod types;

pub use config::AppConfig;
pub use error::{LaunchError, LaunchResult, ParentResource, RemoteApiError};
