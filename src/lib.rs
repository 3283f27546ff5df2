// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod deliver;
pub mod enrich;
pub mod ingest;
pub mod logging;
pub mod memory;
pub mod post;
pub mod run;
pub mod select;

pub use crate::config::AppConfig;
pub use crate::run::{RunOutcome, Runner};
