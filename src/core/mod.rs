//! Core types for upsync.
//!
//! This module holds the error taxonomy shared across the sync pipeline.
//! See [`error`] for the distinction between structural invariant violations
//! (which exit with status 2) and ordinary failures.

pub mod error;

pub use error::{ErrorContext, UpsyncError, user_friendly_error};
