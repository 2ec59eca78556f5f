//! vido - VTODO task manager library
//!
//! This library provides the core functionality for the vido CLI tool,
//! managing RFC 5545 VTODO files in vdir-style list directories.
//!
//! # Core Concepts
//!
//! - **Lists**: directories matched by a configured glob, one .ics file per
//!   todo, with optional `displayname`/`color` metadata files
//! - **Cache**: a disposable JSON snapshot keyed by file mtime and size so
//!   listing cost is proportional to what changed
//! - **Ids**: dense session-scoped numbers assigned at listing time; the
//!   durable identity of a todo is its UID
//! - **Round-trips**: properties this tool does not own are re-emitted
//!   byte-for-byte, so a syncing CalDAV client never sees spurious diffs
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `config.toml`
//! - `error`: Error types and result aliases
//! - `ical`: RFC 5545 text layer (folding, escaping, component tree)
//! - `vtodo`: VTODO component <-> todo record adapter
//! - `todo`: The todo record and its lifecycle operations
//! - `list`: List directory discovery
//! - `cache`: Persistent snapshot and filesystem reconciliation
//! - `query`: Filtering and sorting
//! - `db`: Database façade tying lists, cache, and disk writes together
//! - `output`: Human and porcelain formatting

pub mod cache;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod ical;
pub mod list;
pub mod output;
pub mod query;
pub mod todo;
pub mod vtodo;

pub use error::{Error, Result};
