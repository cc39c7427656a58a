//! # bmcat Common Library
//!
//! Shared code for the bmcat services:
//! - Error type shared by every crate
//! - Configuration loading (root folder, TOML config file)
//! - Database initialization and schema

pub mod config;
pub mod db;
pub mod error;

pub use error::{is_sqlite_lock_error, Error, Result};
