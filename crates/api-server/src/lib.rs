#![warn(clippy::unwrap_used)]

pub mod bulk_rest;
pub mod platform_rest;
pub mod records_rest;
pub mod rest;
pub mod runs;
pub mod server;

pub use rest::AppState;
pub use runs::{RunRegistry, RunSnapshot};
pub use server::{router, ApiServer};
