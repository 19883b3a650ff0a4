pub mod answer;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod providers;
pub mod server;
pub mod sessions;

pub use error::ServiceError;
