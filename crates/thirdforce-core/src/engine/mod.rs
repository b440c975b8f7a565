//! # Engine Module
//!
//! Run-level plumbing shared by the workflows.
//!
//! - **Configuration** ([`config`]) - `RunConfig` and its builder
//! - **Discovery** ([`discovery`]) - Enumerating `<prefix>.POSCAR.<n>` files and laying out outputs
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress events
//! - **Error Handling** ([`error`]) - `EngineError`, tagged with the failing displacement

pub mod config;
pub mod discovery;
pub mod error;
pub mod progress;
