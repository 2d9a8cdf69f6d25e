//! # ComPath Common Library
//!
//! Shared core of the ComPath services:
//! - Resource registry over the external pathway databases
//! - Mapping store, voting engine and user accounts
//! - Hierarchy inference and bulk hierarchy loading
//! - Curation import pipeline and TSV export
//! - Configuration loading

pub mod auth;
pub mod config;
pub mod context;
pub mod curation;
pub mod db;
pub mod error;
pub mod export;
pub mod hierarchy;
pub mod model;
pub mod registry;

pub use context::AppContext;
pub use error::{Error, Result};
pub use model::{MappingType, PathwayReference};
