//! Global constants used throughout the upsync codebase.
//!
//! Timeout durations, retry intervals, and fixed names live here so magic
//! numbers stay discoverable and consistent across modules.

use std::time::Duration;

/// Fixed sleep between retry attempts for outbound network calls (10 seconds).
///
/// Retries are unbounded; this interval only paces them. The external
/// scheduler invoking upsync provides the real timeout.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Per-request timeout for HTTP calls (60 seconds).
///
/// Bounds a single attempt so a dead connection cannot stall the retry loop;
/// a timed-out attempt is just another transient failure.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// File name of the source manifest, searched for in the current directory
/// and its parents.
pub const MANIFEST_NAME: &str = "upsync.toml";

/// User agent sent with every outbound request.
///
/// The GitHub releases API rejects requests without one.
pub const USER_AGENT: &str = concat!("upsync/", env!("CARGO_PKG_VERSION"));

/// Placeholder substituted with the discovered version when expanding a
/// source's `url-template`.
pub const VERSION_PLACEHOLDER: &str = "{version}";
