//! upsync - keep a package-descriptor repository pointed at the latest
//! upstream releases.
//!
//! A descriptor repository holds one small text file per tracked upstream
//! source, named `<version>.<ext>` and carrying a `SRC_URI="<url>"` line
//! with the canonical download URL. upsync checks each source's upstream
//! listing (a kernel.org index page, a firmware directory listing, a GitHub
//! releases feed) for the newest released version and renames/rewrites the
//! descriptor to track it.
//!
//! One invocation is one single-shot synchronization pass. There is no
//! daemon, no shared state between runs, and no scheduling - an external
//! periodic job runner drives upsync and owns the overall timeout.
//!
//! # Pipeline
//!
//! Each source flows through four stages, strictly in order:
//!
//! 1. [`net`] fetches the remote listing, retrying transient failures
//!    indefinitely at a fixed interval (the scheduler's own timeout is the
//!    failsafe, so upsync never gives up on the network by itself);
//! 2. [`discover`] enumerates the listing into `(version, url)` candidates
//!    and folds them through the version ordering to keep the newest;
//! 3. [`version`] orders the dotted-numeric-plus-suffix version identifiers
//!    the descriptor repository uses;
//! 4. [`descriptor`] renames the single descriptor file in the source's
//!    directory and rewrites its `SRC_URI` line, idempotently.
//!
//! Structural invariant violations - zero or multiple descriptor files,
//! incomparable versions, an empty candidate listing - are typed errors
//! ([`core::UpsyncError`]) that terminate the run with exit status 2 rather
//! than an opaque abort.
//!
//! # Example
//!
//! ```no_run
//! use upsync::discover::{self, Candidate};
//! use upsync::version::VersionId;
//!
//! # fn example() -> anyhow::Result<()> {
//! let listing = vec![
//!     Candidate { version: "5.14.2".into(), url: "https://kernel.org/a".into() },
//!     Candidate { version: "5.15.0".into(), url: "https://kernel.org/b".into() },
//! ];
//! let latest = discover::discover_latest("linux-vanilla", listing)?;
//! assert_eq!(latest.version, VersionId::parse("5.15.0")?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod constants;
pub mod core;
pub mod descriptor;
pub mod discover;
pub mod manifest;
pub mod net;
pub mod version;
