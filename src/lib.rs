//! MFlix - movie / series / anime catalog service
//!
//! # Features
//! - **server**: HTTP server mode (default)
//! - **cli**: maintenance commands (`migrate`, `hash-password`)
//!
//! # Architecture
//! - `storage`: SeaORM storage backend and domain models
//! - `session`: visitor session store (in-memory, TTL per key)
//! - `services`: catalog, admin, bulk import, redirect loop and the gates
//! - `api`: HTTP services and middleware
//! - `config`: configuration management
//! - `runtime`: application lifecycle and execution modes
//! - `system`: logging setup

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod session;
pub mod storage;
pub mod system;
pub mod utils;
