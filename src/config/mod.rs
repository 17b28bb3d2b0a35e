//! Configuration module
//!
//! This module contains the job settings and path management.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{EtlConfig, MAX_RECENT_LIMIT};
