//! `platebook` - A license-plate record book
//!
//! This library provides the record API (List, Create, Update, Delete over
//! plates and their details), its SQLite store, the HTTP transport, and a
//! client with a searchable, optimistically updated record table.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod record;
pub mod service;
pub mod storage;

pub use client::{HttpClient, LocalClient, RecordApi, RecordTable};
pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use record::{NewRecord, PlatePolicy, Record};
pub use service::RecordService;
pub use storage::{Connector, Storage, StorageStats};
