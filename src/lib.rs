//! Local persistence layer for a client-side CRM.
//!
//! An embedded SQLite database lives in memory and is snapshotted to a
//! durable key-value store after every write. Domain records reach the
//! database through mappers and repositories.
//!
//! # Architecture
//!
//! - [`cli`] - Admin command-line interface using clap
//! - [`model`] - Domain types (Contact, Company, Deal, Task, Note, lookups)
//! - [`mapper`] - Domain record to table row conversion
//! - [`repository`] - Generic repository and per-entity queries
//! - [`storage`] - Engine, schema, snapshots, migrations and queries
//! - [`config`] - Storage keys, open options and data directory
//! - [`error`] - Error types and handling

#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod mapper;
pub mod model;
pub mod repository;
pub mod storage;
pub mod validate;

pub use error::{Error, Result};
pub use storage::SqliteStorage;
