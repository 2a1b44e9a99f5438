//! Shared foundation for the radscribe workspace
//!
//! This crate holds the domain types exchanged between pipeline stages, the
//! error taxonomy used across every crate, and small fs/logging helpers.
//! It has no knowledge of providers, stores, or pipeline control flow.

pub mod atomic_write;
pub mod error;
pub mod logging;
pub mod types;
