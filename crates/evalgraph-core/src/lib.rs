//! Core types and ambient services for the EvalGraph update-propagation engine.
//!
//! This crate holds everything the graph crate builds on but that carries no
//! traversal logic of its own:
//! - index handles and node kinds (`types`)
//! - original / evaluated data records and their tag bits (`record`)
//! - Fx-hashed compact containers (`memory`)
//! - the error type, configuration loading and tracing bootstrap

pub mod config;
pub mod error;
pub mod logging;
pub mod memory;
pub mod record;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use memory::*;
pub use record::*;
pub use types::*;
