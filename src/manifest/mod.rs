//! Manifest parsing for `upsync.toml`.
//!
//! The manifest maps source names to the parameters one sync pass needs: the
//! descriptor directory, the descriptor extension, and how to enumerate the
//! upstream listing. One parameterized [`SourceSpec`] replaces the
//! per-package copy-paste the repository grew out of.
//!
//! # Format
//!
//! ```toml
//! [sources.linux-vanilla]
//! directory = "linux/vanilla"
//! extension = "bbki"
//!
//! [sources.linux-vanilla.listing]
//! kind = "page"
//! url = "https://www.kernel.org/pub/linux/kernel/v6.x/"
//! pattern = 'linux-([0-9][0-9.]*)\.tar\.xz'
//! url-template = "https://www.kernel.org/pub/linux/kernel/v6.x/linux-{version}.tar.xz"
//!
//! [sources.wireless-regdb.listing]
//! kind = "github-releases"
//! owner = "wtarreau"
//! repo = "wireless-regdb"
//! ```
//!
//! A `page` listing fetches the URL and runs `pattern` (which must have
//! exactly one capture group, the version) over the raw body; each match
//! becomes a candidate whose download URL is `url-template` with `{version}`
//! substituted. A `github-releases` listing queries the GitHub releases API
//! and uses each release's tag and tarball URL.
//!
//! Manifest discovery walks up from the working directory, so upsync can be
//! run from anywhere inside the descriptor repository.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{MANIFEST_NAME, VERSION_PLACEHOLDER};
use crate::core::UpsyncError;

/// How to enumerate an upstream listing into version candidates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ListingSpec {
    /// Fetch a page (HTML index, plain directory listing) and run a regex
    /// with one capture group over the body.
    #[serde(rename_all = "kebab-case")]
    Page {
        /// Listing page URL.
        url: String,
        /// Regex with exactly one capture group extracting the version.
        pattern: String,
        /// Download URL template; `{version}` is replaced per candidate.
        url_template: String,
    },
    /// Query the GitHub releases API for a repository.
    #[serde(rename_all = "kebab-case")]
    GithubReleases {
        /// Repository owner.
        owner: String,
        /// Repository name.
        repo: String,
    },
}

/// One tracked upstream source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SourceSpec {
    /// Descriptor directory, relative to the manifest.
    pub directory: PathBuf,
    /// Descriptor file extension, without the leading dot (e.g. `bbki`).
    pub extension: String,
    /// How to enumerate the upstream listing.
    pub listing: ListingSpec,
}

/// The parsed `upsync.toml` manifest.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Tracked sources by name. `BTreeMap` keeps iteration order stable.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceSpec>,

    /// Directory containing the manifest, for resolving relative paths.
    #[serde(skip)]
    manifest_dir: PathBuf,
}

impl Manifest {
    /// Load and validate a manifest from the given path.
    ///
    /// # Errors
    ///
    /// Returns [`UpsyncError::ManifestParseError`] on syntax errors and the
    /// relevant typed error when validation fails (bad pattern, missing
    /// placeholder, absolute directory).
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| UpsyncError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut manifest: Self =
            toml::from_str(&content).map_err(|e| UpsyncError::ManifestParseError {
                file: path.display().to_string(),
                reason: e.to_string(),
            })?;

        manifest.manifest_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        manifest.validate()?;
        Ok(manifest)
    }

    /// Validate every source spec.
    ///
    /// Checks that each `page` pattern compiles and has exactly one capture
    /// group, that each `url-template` carries the `{version}` placeholder,
    /// that extensions are bare (no leading dot), and that directories are
    /// relative to the manifest.
    pub fn validate(&self) -> Result<()> {
        for (name, spec) in &self.sources {
            if spec.extension.is_empty() || spec.extension.starts_with('.') {
                return Err(UpsyncError::Other {
                    message: format!(
                        "source '{name}': extension '{}' must be non-empty and without a leading dot",
                        spec.extension
                    ),
                }
                .into());
            }
            if spec.directory.is_absolute() {
                return Err(UpsyncError::Other {
                    message: format!(
                        "source '{name}': directory must be relative to the manifest, got {}",
                        spec.directory.display()
                    ),
                }
                .into());
            }
            if let ListingSpec::Page {
                pattern,
                url_template,
                ..
            } = &spec.listing
            {
                let compiled =
                    regex::Regex::new(pattern).map_err(|e| UpsyncError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    })?;
                // captures_len counts the implicit whole-match group 0.
                if compiled.captures_len() != 2 {
                    return Err(UpsyncError::InvalidPattern {
                        pattern: pattern.clone(),
                        reason: format!(
                            "expected exactly one capture group for the version, found {}",
                            compiled.captures_len() - 1
                        ),
                    }
                    .into());
                }
                if !url_template.contains(VERSION_PLACEHOLDER) {
                    return Err(UpsyncError::Other {
                        message: format!(
                            "source '{name}': url-template is missing the {VERSION_PLACEHOLDER} placeholder"
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// Absolute descriptor directory for a source.
    #[must_use]
    pub fn source_dir(&self, spec: &SourceSpec) -> PathBuf {
        self.manifest_dir.join(&spec.directory)
    }

    /// Select sources to operate on: one by name, or all when `name` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`UpsyncError::SourceNotFound`] for an unknown name.
    pub fn select(&self, name: Option<&str>) -> Result<Vec<(&String, &SourceSpec)>> {
        match name {
            Some(name) => {
                let spec = self
                    .sources
                    .get_key_value(name)
                    .ok_or_else(|| UpsyncError::SourceNotFound {
                        name: name.to_string(),
                    })?;
                Ok(vec![spec])
            }
            None => Ok(self.sources.iter().collect()),
        }
    }
}

/// Find the manifest by walking up from `current`.
///
/// # Errors
///
/// Returns [`UpsyncError::ManifestNotFound`] when no `upsync.toml` exists in
/// `current` or any of its parents.
pub fn find_manifest_from(mut current: PathBuf) -> Result<PathBuf> {
    loop {
        let manifest_path = current.join(MANIFEST_NAME);
        if manifest_path.exists() {
            return Ok(manifest_path);
        }

        if !current.pop() {
            return Err(UpsyncError::ManifestNotFound.into());
        }
    }
}

/// Find the manifest starting from the current working directory.
pub fn find_manifest() -> Result<PathBuf> {
    find_manifest_from(std::env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"
[sources.linux-vanilla]
directory = "linux/vanilla"
extension = "bbki"

[sources.linux-vanilla.listing]
kind = "page"
url = "https://www.kernel.org/pub/linux/kernel/v6.x/"
pattern = 'linux-([0-9][0-9.]*)\.tar\.xz'
url-template = "https://www.kernel.org/pub/linux/kernel/v6.x/linux-{version}.tar.xz"

[sources.wireless-regdb]
directory = "linux-addon/wireless-regdb"
extension = "bbki"

[sources.wireless-regdb.listing]
kind = "github-releases"
owner = "wtarreau"
repo = "wireless-regdb"
"#;

    fn write_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(MANIFEST_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_both_listing_kinds() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = Manifest::load(&write_manifest(temp.path(), GOOD)).unwrap();

        assert_eq!(manifest.sources.len(), 2);
        let kernel = &manifest.sources["linux-vanilla"];
        assert_eq!(kernel.extension, "bbki");
        assert!(matches!(kernel.listing, ListingSpec::Page { .. }));
        assert!(matches!(
            manifest.sources["wireless-regdb"].listing,
            ListingSpec::GithubReleases { .. }
        ));
    }

    #[test]
    fn source_dir_is_resolved_against_the_manifest() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = Manifest::load(&write_manifest(temp.path(), GOOD)).unwrap();
        let spec = &manifest.sources["linux-vanilla"];
        assert_eq!(
            manifest.source_dir(spec),
            temp.path().join("linux/vanilla")
        );
    }

    #[test]
    fn select_by_name_and_all() {
        let temp = tempfile::TempDir::new().unwrap();
        let manifest = Manifest::load(&write_manifest(temp.path(), GOOD)).unwrap();

        assert_eq!(manifest.select(None).unwrap().len(), 2);
        assert_eq!(manifest.select(Some("linux-vanilla")).unwrap().len(), 1);
        assert!(matches!(
            manifest
                .select(Some("nope"))
                .unwrap_err()
                .downcast_ref::<UpsyncError>(),
            Some(UpsyncError::SourceNotFound { .. })
        ));
    }

    #[test]
    fn rejects_pattern_without_capture_group() {
        let temp = tempfile::TempDir::new().unwrap();
        let bad = GOOD.replace(r"linux-([0-9][0-9.]*)\.tar\.xz", "linux-.*");
        let err = Manifest::load(&write_manifest(temp.path(), &bad)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn rejects_template_without_placeholder() {
        let temp = tempfile::TempDir::new().unwrap();
        let bad = GOOD.replace("linux-{version}.tar.xz", "linux-latest.tar.xz");
        assert!(Manifest::load(&write_manifest(temp.path(), &bad)).is_err());
    }

    #[test]
    fn rejects_dotted_extension() {
        let temp = tempfile::TempDir::new().unwrap();
        let bad = GOOD.replace("extension = \"bbki\"", "extension = \".bbki\"");
        assert!(Manifest::load(&write_manifest(temp.path(), &bad)).is_err());
    }

    #[test]
    fn syntax_errors_are_typed() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = Manifest::load(&write_manifest(temp.path(), "sources = 3")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::ManifestParseError { .. })
        ));
    }

    #[test]
    fn manifest_discovery_walks_up_parents() {
        let temp = tempfile::TempDir::new().unwrap();
        write_manifest(temp.path(), GOOD);
        let nested = temp.path().join("linux/vanilla");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_manifest_from(nested).unwrap();
        assert_eq!(found, temp.path().join(MANIFEST_NAME));
    }

    #[test]
    fn missing_manifest_is_a_typed_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = find_manifest_from(temp.path().to_path_buf()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::ManifestNotFound)
        ));
    }
}
