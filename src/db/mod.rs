//! Database module
//!
//! This module handles all database operations using SQLx with SQLite.

mod engine;
pub mod schema;
pub mod tables;

pub use engine::DbEngine;
pub use schema::{ensure_schemas, ensure_tables, Schema};
pub use tables::{AlbumTable, SongTable};
