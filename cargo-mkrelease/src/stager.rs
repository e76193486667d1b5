//! Release staging.
//!
//! The staging directory is `<output-dir>/<project-name>` and holds exactly the
//! files that end up in the archive. It is recreated from scratch on every run.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{MkReleaseError, Result};

/// Documents shipped with every release, relative to the project directory
pub const RELEASE_DOCUMENTS: [&str; 3] = ["CHANGELOG.md", "LICENSE", "README.md"];

/// File name of the release binary for a platform tag
pub fn binary_file_name(project_name: &str, platform: &str) -> String {
    if platform.eq_ignore_ascii_case("windows") {
        format!("{project_name}.exe")
    } else {
        project_name.to_string()
    }
}

/// Path of the release binary relative to the project directory
pub fn release_binary_path(
    target_dir: &Path,
    profile: &str,
    project_name: &str,
    platform: &str,
) -> PathBuf {
    target_dir
        .join(profile_dir(profile))
        .join(binary_file_name(project_name, platform))
}

/// Output directory cargo uses for a profile
fn profile_dir(profile: &str) -> &str {
    match profile {
        "dev" | "test" => "debug",
        "bench" => "release",
        other => other,
    }
}

/// Fixed, ordered list of files to package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackingList {
    entries: Vec<PathBuf>,
}

impl PackingList {
    /// The release documents followed by the binary
    pub fn new(binary: PathBuf) -> Self {
        let mut entries: Vec<PathBuf> = RELEASE_DOCUMENTS.iter().map(PathBuf::from).collect();
        entries.push(binary);
        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }
}

/// Handles the lifecycle of the staging directory
pub struct Stager {
    project_dir: PathBuf,
    staging_dir: PathBuf,
}

impl Stager {
    pub fn new(project_dir: &Path, output_dir: &Path, project_name: &str) -> Self {
        Self {
            project_dir: project_dir.to_path_buf(),
            staging_dir: output_dir.join(project_name),
        }
    }

    pub fn staging_path(&self) -> &Path {
        &self.staging_dir
    }

    /// Remove leftovers from a previous run and create an empty staging directory.
    ///
    /// `archive_path` is the archive this run will write; a stale copy is deleted.
    pub fn prepare(&self, archive_path: Option<&Path>) -> Result<()> {
        if self.staging_dir.exists() {
            tracing::debug!("Removing stale staging directory: {}", self.staging_dir.display());
            fs::remove_dir_all(&self.staging_dir)?;
        }

        if let Some(archive_path) = archive_path {
            if archive_path.exists() {
                tracing::info!("Removing existing archive: {}", archive_path.display());
                fs::remove_file(archive_path)?;
            }
        }

        fs::create_dir_all(&self.staging_dir)?;
        Ok(())
    }

    /// Copy every packing list entry into the staging directory under its base name
    pub fn stage(&self, packing_list: &PackingList) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(packing_list.entries().len());

        for entry in packing_list.entries() {
            let source = std::path::absolute(self.project_dir.join(entry))?;
            let file_name = entry.file_name().ok_or_else(|| {
                MkReleaseError::Package(format!("Invalid file path: {}", entry.display()))
            })?;
            let dest = self.staging_dir.join(file_name);

            tracing::debug!("Staging {} -> {}", source.display(), dest.display());
            fs::copy(&source, &dest).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => MkReleaseError::MissingReleaseFile { path: source.clone() },
                _ => MkReleaseError::Io(e),
            })?;
            staged.push(dest);
        }

        Ok(staged)
    }

    /// Delete the staging directory and everything in it
    pub fn cleanup(&self) -> Result<()> {
        if self.staging_dir.exists() {
            fs::remove_dir_all(&self.staging_dir)?;
        }
        Ok(())
    }
}
