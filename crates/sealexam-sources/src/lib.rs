//! sealexam-sources: where question banks come from.
//!
//! Implements the core `Source` trait for local files and HTTP URLs, and
//! loads `sealexam.toml` to decide which banks and blueprint to fetch.

pub mod config;
pub mod file;
pub mod http;
pub mod mock;

pub use config::{create_source, load_config_from, BankEntry, Location, SealexamConfig};
pub use file::FileSource;
pub use http::HttpSource;
pub use mock::MockSource;
