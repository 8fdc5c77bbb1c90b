//! Error handling for upsync.
//!
//! The error system has two layers:
//! 1. [`UpsyncError`] - strongly-typed errors for every failure the sync
//!    pipeline can diagnose
//! 2. [`ErrorContext`] - a wrapper that adds user-friendly suggestions and
//!    details for CLI display
//!
//! # Error Categories
//!
//! The taxonomy follows the way failures are handled, not where they occur:
//! - **Structural invariant violations** - states the repository layout
//!   promises can never happen (zero or multiple descriptor files in a
//!   directory, incomparable version identifiers, an empty candidate
//!   listing). These terminate the run with exit status 2.
//! - **Data-integrity failures** - the descriptor or manifest content is not
//!   what the pipeline requires (no `SRC_URI` line to rewrite, unparseable
//!   manifest). Also exit status 2.
//! - **Everything else** - I/O and miscellaneous errors, exit status 1.
//!
//! Transient network failures never appear here: they are absorbed by the
//! retry loop in [`crate::net`] and only ever logged.
//!
//! Use [`user_friendly_error`] to convert any [`anyhow::Error`] into an
//! [`ErrorContext`] with contextual suggestions before display.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for upsync operations.
///
/// Each variant carries enough context (directory, expected vs. found,
/// offending version strings) that a failure can be diagnosed from the
/// message alone, without re-running with extra logging.
#[derive(Error, Debug)]
pub enum UpsyncError {
    /// A descriptor directory did not contain exactly one descriptor file.
    #[error(
        "expected exactly one .{extension} descriptor in {directory}, found {}: [{}]",
        .found.len(),
        .found.join(", ")
    )]
    DescriptorCount {
        /// Directory that was scanned.
        directory: String,
        /// Descriptor extension that was matched against.
        extension: String,
        /// File names that matched, in scan order.
        found: Vec<String>,
    },

    /// Two version identifiers have different numeric arity and cannot be
    /// ordered.
    #[error("versions '{left}' and '{right}' are incomparable: numeric parts differ in arity")]
    IncomparableVersions {
        /// Left-hand version string.
        left: String,
        /// Right-hand version string.
        right: String,
    },

    /// A version identifier could not be parsed at all.
    #[error("invalid version identifier '{version}': {reason}")]
    InvalidVersion {
        /// The offending version string.
        version: String,
        /// Why parsing failed.
        reason: String,
    },

    /// A numeric component does not fit the weighting scheme.
    ///
    /// The weighted comparison allots two decimal digits per slotted
    /// component, and the whole weighted value must fit in a u64. Values
    /// that would collide with a neighboring slot or overflow the weight
    /// are rejected instead of wrapped.
    #[error("version '{version}' has component {component} too large for the weighted ordering")]
    VersionComponentTooLarge {
        /// The offending version string.
        version: String,
        /// The out-of-range component value.
        component: u64,
    },

    /// A listing produced no candidates at all.
    ///
    /// The field is deliberately not called `source`: thiserror reserves
    /// that name for the error-chain source.
    #[error("no version candidates found in listing for source '{name}'")]
    NoCandidateFound {
        /// Name of the configured source whose listing was empty.
        name: String,
    },

    /// A source name given on the command line is not in the manifest.
    #[error("source '{name}' is not defined in the manifest")]
    SourceNotFound {
        /// The requested source name.
        name: String,
    },

    /// No `upsync.toml` was found in the current directory or any parent.
    #[error("manifest file upsync.toml not found in current directory or any parent directory")]
    ManifestNotFound,

    /// The manifest file exists but could not be parsed.
    #[error("invalid manifest file syntax in {file}: {reason}")]
    ManifestParseError {
        /// Manifest path.
        file: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// The descriptor body contained no `SRC_URI=` line to rewrite.
    #[error("no SRC_URI line found in descriptor {file}; refusing to leave a stale source URL")]
    SubstitutionNotFound {
        /// Descriptor path whose body was scanned.
        file: String,
    },

    /// A configured listing pattern is not a valid regular expression, or
    /// lacks the required capture group.
    #[error("invalid listing pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The configured pattern.
        pattern: String,
        /// Why it was rejected.
        reason: String,
    },

    /// IO errors from [`std::io::Error`].
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Catch-all with a custom message.
    #[error("{message}")]
    Other {
        /// The error message.
        message: String,
    },
}

impl UpsyncError {
    /// Whether this error is a structural invariant violation or a
    /// data-integrity failure.
    ///
    /// Structural errors exit with status 2 so schedulers can tell a broken
    /// repository apart from ordinary runtime failures.
    #[must_use]
    pub const fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::DescriptorCount { .. }
                | Self::IncomparableVersions { .. }
                | Self::InvalidVersion { .. }
                | Self::VersionComponentTooLarge { .. }
                | Self::NoCandidateFound { .. }
                | Self::SourceNotFound { .. }
                | Self::ManifestNotFound
                | Self::ManifestParseError { .. }
                | Self::SubstitutionNotFound { .. }
                | Self::InvalidPattern { .. }
        )
    }
}

/// Wrapper that pairs an error message with optional user guidance.
///
/// The error message is displayed in red, details in yellow, and the
/// suggestion in green, mirroring the severity gradient.
pub struct ErrorContext {
    /// The rendered error message.
    pub message: String,
    /// Optional suggestion for resolving the error.
    pub suggestion: Option<String>,
    /// Optional additional details about the error.
    pub details: Option<String>,
    /// Process exit status this error should terminate with.
    pub exit_code: i32,
}

impl ErrorContext {
    /// Create a new error context with the given message and exit code.
    #[must_use]
    pub const fn new(message: String, exit_code: i32) -> Self {
        Self {
            message,
            suggestion: None,
            details: None,
            exit_code,
        }
    }

    /// Add an actionable suggestion for resolving the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining why the error occurred.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error context to stderr with terminal colors.
    pub fn display(&self) {
        eprintln!("{} {}", "Error:".red().bold(), self.message.red());
        if let Some(details) = &self.details {
            eprintln!("  {}", details.yellow());
        }
        if let Some(suggestion) = &self.suggestion {
            eprintln!("  {} {}", "Hint:".green().bold(), suggestion.green());
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(details) = &self.details {
            write!(f, "\n  {details}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Hint: {suggestion}")?;
        }
        Ok(())
    }
}

/// Convert any error into a user-friendly [`ErrorContext`].
///
/// Typed [`UpsyncError`]s receive tailored suggestions; everything else is
/// rendered with its full context chain and a generic exit status.
#[must_use]
pub fn user_friendly_error(error: &anyhow::Error) -> ErrorContext {
    if let Some(err) = error.downcast_ref::<UpsyncError>() {
        let exit_code = if err.is_structural() { 2 } else { 1 };
        let ctx = ErrorContext::new(err.to_string(), exit_code);
        return match err {
            UpsyncError::DescriptorCount { directory, .. } => ctx
                .with_suggestion(format!(
                    "each tracked directory must hold exactly one descriptor file; inspect {directory}"
                ))
                .with_details(
                    "the update renames the descriptor in place, so duplicates mean an interrupted bootstrap or a stray file",
                ),
            UpsyncError::IncomparableVersions { .. }
            | UpsyncError::VersionComponentTooLarge { .. } => ctx.with_suggestion(
                "check the listing pattern; it is matching version strings of a different shape than expected",
            ),
            UpsyncError::NoCandidateFound { .. } => ctx.with_details(
                "the listing page was fetched but the configured pattern matched nothing",
            ),
            UpsyncError::ManifestNotFound => ctx.with_suggestion(
                "run upsync from inside a descriptor repository, or pass --manifest-path",
            ),
            UpsyncError::ManifestParseError { .. } => {
                ctx.with_suggestion("check the TOML syntax in upsync.toml")
            }
            UpsyncError::SubstitutionNotFound { .. } => ctx.with_details(
                "the descriptor was renamed but its body holds no SRC_URI line; the file needs manual repair",
            ),
            _ => ctx,
        };
    }

    // Render the full anyhow chain so nested context is not lost.
    let mut message = error.to_string();
    for cause in error.chain().skip(1) {
        message.push_str(&format!("\n  caused by: {cause}"));
    }
    ErrorContext::new(message, 1)
}
