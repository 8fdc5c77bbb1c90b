//! Upstream version discovery.
//!
//! A listing (an HTML index page, a plain directory listing, a GitHub
//! releases response) is enumerated into [`Candidate`] pairs of version
//! string and download URL, then folded through the version ordering to keep
//! the single newest candidate. Ties keep the first-seen candidate, so a
//! listing that names the same version twice resolves deterministically.
//!
//! Scraping is deliberately dumb: a `page` listing runs the configured regex
//! over the raw response body, exactly the way the maintenance scripts this
//! tool replaces did. The pattern owns all format knowledge; this module
//! only folds and resolves.

use std::collections::HashSet;

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::constants::VERSION_PLACEHOLDER;
use crate::core::UpsyncError;
use crate::manifest::{ListingSpec, SourceSpec};
use crate::net::Fetcher;
use crate::version::VersionId;

/// A (version, download URL) pair scraped from a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Version string as it appeared in the listing.
    pub version: String,
    /// Download URL for that version.
    pub url: String,
}

/// The winning candidate, with its version parsed.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// Parsed latest version.
    pub version: VersionId,
    /// Download URL associated with it.
    pub url: String,
}

/// Fold candidates through the version ordering, keeping the maximum.
///
/// Ties keep the first-seen candidate.
///
/// # Errors
///
/// - [`UpsyncError::NoCandidateFound`] when the sequence is empty
/// - [`UpsyncError::InvalidVersion`] when a candidate's version does not
///   parse
/// - [`UpsyncError::IncomparableVersions`] when candidates mix arities - the
///   listing pattern is expected to produce homogeneous version shapes
pub fn discover_latest(
    source: &str,
    candidates: impl IntoIterator<Item = Candidate>,
) -> Result<Resolved> {
    let mut best: Option<Resolved> = None;
    for candidate in candidates {
        trace!("candidate {} -> {}", candidate.version, candidate.url);
        let version = VersionId::parse(&candidate.version)?;
        best = match best {
            None => Some(Resolved {
                version,
                url: candidate.url,
            }),
            Some(current) => {
                if version.is_newer_than(&current.version)? {
                    Some(Resolved {
                        version,
                        url: candidate.url,
                    })
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| {
        UpsyncError::NoCandidateFound {
            name: source.to_string(),
        }
        .into()
    })
}

/// Run a listing pattern over a fetched page body.
///
/// Every match of `pattern` (validated at manifest load to carry exactly one
/// capture group) yields a candidate; the download URL comes from
/// `url_template` with `{version}` substituted. Index pages usually repeat a
/// filename in both the anchor href and the anchor text, so repeated
/// versions collapse to their first occurrence.
pub fn scrape_page(body: &str, pattern: &str, url_template: &str) -> Result<Vec<Candidate>> {
    let regex = regex::Regex::new(pattern).map_err(|e| UpsyncError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut seen = HashSet::new();
    let candidates: Vec<Candidate> = regex
        .captures_iter(body)
        .filter_map(|caps| {
            let version = caps[1].to_string();
            if !seen.insert(version.clone()) {
                return None;
            }
            let url = url_template.replace(VERSION_PLACEHOLDER, &version);
            Some(Candidate { version, url })
        })
        .collect();
    debug!("pattern matched {} distinct candidate(s)", candidates.len());
    Ok(candidates)
}

/// One release from the GitHub releases API. Only the fields upsync reads.
#[derive(Debug, Deserialize)]
pub struct GithubRelease {
    /// Release tag, e.g. `v1.2.3` or `1.2.3`.
    pub tag_name: String,
    /// Source tarball URL for the tag.
    pub tarball_url: String,
    /// Draft releases are not published versions.
    #[serde(default)]
    pub draft: bool,
    /// Pre-releases are skipped; only final releases are synced.
    #[serde(default)]
    pub prerelease: bool,
}

/// Convert GitHub releases into candidates.
///
/// Drafts and pre-releases are skipped, and a single leading `v` is stripped
/// from the tag so `v1.2.3` compares as `1.2.3`.
#[must_use]
pub fn releases_to_candidates(releases: Vec<GithubRelease>) -> Vec<Candidate> {
    releases
        .into_iter()
        .filter(|release| !release.draft && !release.prerelease)
        .map(|release| {
            let version = release
                .tag_name
                .strip_prefix('v')
                .unwrap_or(&release.tag_name)
                .to_string();
            Candidate {
                version,
                url: release.tarball_url,
            }
        })
        .collect()
}

/// Fetch a source's listing and enumerate it into candidates.
pub async fn fetch_candidates(fetcher: &Fetcher, spec: &SourceSpec) -> Result<Vec<Candidate>> {
    match &spec.listing {
        ListingSpec::Page {
            url,
            pattern,
            url_template,
        } => {
            let body = fetcher.fetch_text(url).await?;
            scrape_page(&body, pattern, url_template)
        }
        ListingSpec::GithubReleases { owner, repo } => {
            let url = format!("https://api.github.com/repos/{owner}/{repo}/releases");
            let releases: Vec<GithubRelease> = fetcher.fetch_json(&url).await?;
            Ok(releases_to_candidates(releases))
        }
    }
}
