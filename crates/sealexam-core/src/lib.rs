//! sealexam-core: question model, sampling, and session scoring.
//!
//! This crate defines the data model, the blueprint-weighted sampler, the
//! session state machine and the library loader that the rest of sealexam
//! builds on.

pub mod error;
pub mod library;
pub mod model;
pub mod parser;
pub mod report;
pub mod sampler;
pub mod session;
pub mod shuffle;
pub mod statistics;
pub mod traits;
