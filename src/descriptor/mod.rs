//! Descriptor file location and update.
//!
//! Each tracked directory holds exactly one descriptor file named
//! `<version>.<ext>` whose body carries a `SRC_URI="<url>"` line. An update
//! renames that file to the newly discovered version and rewrites the
//! `SRC_URI` line - a rename in place, never a copy, so stale version files
//! cannot accumulate.
//!
//! The body rewrite goes through a temp file in the same directory followed
//! by a rename, so a crash never leaves a half-written descriptor. The
//! rename and the rewrite together are still two filesystem operations: a
//! crash between them leaves the file correctly named but with the previous
//! URL, which the next run repairs.
//!
//! Updates are idempotent: running the same update twice leaves exactly one
//! descriptor with the same name and body, and never errors.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::core::UpsyncError;
use crate::version::VersionId;

/// Result of [`update_descriptor`].
#[derive(Debug)]
pub struct DescriptorUpdate {
    /// Path of the descriptor after the update.
    pub path: PathBuf,
    /// Whether the file was renamed to a new version.
    pub renamed: bool,
    /// Whether the body content changed.
    pub rewritten: bool,
}

impl DescriptorUpdate {
    /// Whether the update changed anything on disk.
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.renamed || self.rewritten
    }
}

/// Locate the single descriptor file in `directory`.
///
/// The scan is non-recursive and matches on the extension only; the file
/// stem is the version currently recorded.
///
/// # Errors
///
/// Returns [`UpsyncError::DescriptorCount`] naming every match when the
/// directory does not hold exactly one descriptor. Nothing is modified.
pub fn find_descriptor(directory: &Path, extension: &str) -> Result<PathBuf> {
    let mut matches: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(directory)
        .map_err(UpsyncError::IoError)
        .with_context(|| format!("failed to read directory {}", directory.display()))?
    {
        let path = entry.map_err(UpsyncError::IoError)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            matches.push(path);
        }
    }
    // read_dir order is platform-dependent; sort so errors are stable.
    matches.sort();

    if matches.len() == 1 {
        Ok(matches.remove(0))
    } else {
        Err(UpsyncError::DescriptorCount {
            directory: directory.display().to_string(),
            extension: extension.to_string(),
            found: matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .collect(),
        }
        .into())
    }
}

/// Version currently recorded by the descriptor in `directory`, taken from
/// the file stem.
pub fn current_version(directory: &Path, extension: &str) -> Result<VersionId> {
    let path = find_descriptor(directory, extension)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(VersionId::parse(&stem)?)
}

/// Point the descriptor in `directory` at `new_version` / `new_url`.
///
/// Renames the single descriptor to `<new_version>.<ext>` (skipped when the
/// name already matches) and replaces every `SRC_URI=...` line in its body
/// with `SRC_URI="<new_url>"`.
///
/// # Errors
///
/// - [`UpsyncError::DescriptorCount`] when the directory does not hold
///   exactly one descriptor (filesystem untouched)
/// - [`UpsyncError::SubstitutionNotFound`] when the body has no `SRC_URI`
///   line to rewrite
pub fn update_descriptor(
    directory: &Path,
    extension: &str,
    new_version: &VersionId,
    new_url: &str,
) -> Result<DescriptorUpdate> {
    let current = find_descriptor(directory, extension)?;
    let target = directory.join(format!("{new_version}.{extension}"));

    let renamed = current != target;
    if renamed {
        debug!(
            "renaming {} -> {}",
            current.display(),
            target.display()
        );
        std::fs::rename(&current, &target)
            .map_err(UpsyncError::IoError)
            .with_context(|| {
                format!(
                    "failed to rename {} to {}",
                    current.display(),
                    target.display()
                )
            })?;
    }

    let content = std::fs::read_to_string(&target)
        .map_err(UpsyncError::IoError)
        .with_context(|| format!("failed to read descriptor {}", target.display()))?;

    let src_uri = Regex::new(r"(?m)^SRC_URI=.*$").expect("static pattern");
    if !src_uri.is_match(&content) {
        return Err(UpsyncError::SubstitutionNotFound {
            file: target.display().to_string(),
        }
        .into());
    }
    let replacement = format!("SRC_URI=\"{new_url}\"");
    let rewritten_content = src_uri
        .replace_all(&content, regex::NoExpand(&replacement))
        .into_owned();

    let rewritten = rewritten_content != content;
    if rewritten {
        write_atomically(&target, &rewritten_content)?;
        debug!("rewrote SRC_URI in {}", target.display());
    }

    Ok(DescriptorUpdate {
        path: target,
        renamed,
        rewritten,
    })
}

/// Write `content` to `path` via a temp file in the same directory plus a
/// rename, so readers never observe a partial body.
fn write_atomically(path: &Path, content: &str) -> Result<()> {
    let directory = path
        .parent()
        .ok_or_else(|| UpsyncError::Other {
            message: format!("descriptor path {} has no parent", path.display()),
        })?;

    let mut temp = tempfile::NamedTempFile::new_in(directory)
        .map_err(UpsyncError::IoError)
        .with_context(|| format!("failed to create temp file in {}", directory.display()))?;
    temp.write_all(content.as_bytes())
        .map_err(UpsyncError::IoError)
        .context("failed to write descriptor body")?;
    temp.as_file()
        .sync_all()
        .map_err(UpsyncError::IoError)
        .context("failed to sync descriptor body")?;
    temp.persist(path)
        .map_err(|e| UpsyncError::IoError(e.error))
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const KERNEL_URL: &str =
        "https://www.kernel.org/pub/linux/kernel/v5.x/linux-5.15.0.tar.xz";

    fn descriptor_dir(name: &str, body: &str) -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(name), body).unwrap();
        temp
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn update_renames_and_rewrites() {
        let temp = descriptor_dir(
            "5.14.2.bbki",
            "DESC=\"vanilla kernel\"\nSRC_URI=\"https://old.example/linux-5.14.2.tar.xz\"\n",
        );
        let version = VersionId::parse("5.15.0").unwrap();

        let update =
            update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap();

        assert!(update.renamed);
        assert!(update.rewritten);
        assert!(update.changed());
        assert_eq!(dir_entries(temp.path()), vec!["5.15.0.bbki"]);

        let body = std::fs::read_to_string(&update.path).unwrap();
        assert!(body.contains(&format!("SRC_URI=\"{KERNEL_URL}\"")));
        assert!(body.contains("DESC=\"vanilla kernel\""));
    }

    #[test]
    fn update_is_idempotent() {
        let temp = descriptor_dir("5.14.2.bbki", "SRC_URI=\"https://old.example\"\n");
        let version = VersionId::parse("5.15.0").unwrap();

        update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap();
        let second = update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap();

        assert!(!second.changed());
        // Exactly one file, no .bak or temp leftovers.
        assert_eq!(dir_entries(temp.path()), vec!["5.15.0.bbki"]);
        let body = std::fs::read_to_string(&second.path).unwrap();
        assert_eq!(body, format!("SRC_URI=\"{KERNEL_URL}\"\n"));
    }

    #[test]
    fn empty_directory_is_a_structural_error() {
        let temp = TempDir::new().unwrap();
        let version = VersionId::parse("5.15.0").unwrap();

        let err = update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::DescriptorCount { found, .. }) if found.is_empty()
        ));
        assert!(dir_entries(temp.path()).is_empty());
    }

    #[test]
    fn multiple_descriptors_fail_without_touching_the_filesystem() {
        let temp = descriptor_dir("5.14.2.bbki", "SRC_URI=\"a\"\n");
        std::fs::write(temp.path().join("5.13.0.bbki"), "SRC_URI=\"b\"\n").unwrap();
        let version = VersionId::parse("5.15.0").unwrap();

        let err = update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::DescriptorCount { found, .. }) if found.len() == 2
        ));
        assert_eq!(
            dir_entries(temp.path()),
            vec!["5.13.0.bbki", "5.14.2.bbki"]
        );
        assert_eq!(
            std::fs::read_to_string(temp.path().join("5.14.2.bbki")).unwrap(),
            "SRC_URI=\"a\"\n"
        );
    }

    #[test]
    fn files_with_other_extensions_are_ignored() {
        let temp = descriptor_dir("5.14.2.bbki", "SRC_URI=\"a\"\n");
        std::fs::write(temp.path().join("README.md"), "notes\n").unwrap();
        std::fs::write(temp.path().join("config"), "x\n").unwrap();

        let found = find_descriptor(temp.path(), "bbki").unwrap();
        assert_eq!(found, temp.path().join("5.14.2.bbki"));
    }

    #[test]
    fn unreadable_directory_surfaces_a_typed_io_error() {
        let err = find_descriptor(Path::new("/does/not/exist"), "bbki").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::IoError(_))
        ));
    }

    #[test]
    fn missing_src_uri_line_is_surfaced() {
        let temp = descriptor_dir("5.14.2.bbki", "DESC=\"no source line here\"\n");
        let version = VersionId::parse("5.15.0").unwrap();

        let err = update_descriptor(temp.path(), "bbki", &version, KERNEL_URL).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<UpsyncError>(),
            Some(UpsyncError::SubstitutionNotFound { .. })
        ));
    }

    #[test]
    fn replacement_url_with_dollar_signs_is_literal() {
        let temp = descriptor_dir("1.0.bbki", "SRC_URI=\"old\"\n");
        let version = VersionId::parse("1.1").unwrap();
        let url = "https://example.com/a$1b";

        let update = update_descriptor(temp.path(), "bbki", &version, url).unwrap();
        let body = std::fs::read_to_string(&update.path).unwrap();
        assert_eq!(body, "SRC_URI=\"https://example.com/a$1b\"\n");
    }

    #[test]
    fn current_version_reads_the_file_stem() {
        let temp = descriptor_dir("3.9.11-gentoo-r1.bbki", "SRC_URI=\"a\"\n");
        let version = current_version(temp.path(), "bbki").unwrap();
        assert_eq!(version.as_str(), "3.9.11-gentoo-r1");
    }
}
