use std::fs;
use std::path::Path;

use crate::error::{MkReleaseError, Result};

/// Project name and version read from a `Cargo.toml`-style file.
///
/// Matching is line based: any line starting with `name` or `version`
/// assigns the corresponding field, and the last matching line wins.
/// Section headers are not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub name: String,
    pub version: String,
}

impl ProjectMetadata {
    /// Read and parse the metadata file at `path`
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    /// Parse metadata from file content. `path` is only used in errors.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let mut name = String::new();
        let mut version = String::new();

        for (index, line) in content.lines().enumerate() {
            let field = if line.starts_with("name") {
                &mut name
            } else if line.starts_with("version") {
                &mut version
            } else {
                continue;
            };

            let value = line
                .split('=')
                .nth(1)
                .ok_or_else(|| MkReleaseError::MalformedMetadata {
                    line: index + 1,
                    path: path.to_path_buf(),
                })?;
            *field = unquote(value).to_string();
        }

        if name.is_empty() {
            return Err(MkReleaseError::MissingMetadata {
                field: "name",
                path: path.to_path_buf(),
            });
        }
        if version.is_empty() {
            return Err(MkReleaseError::MissingMetadata {
                field: "version",
                path: path.to_path_buf(),
            });
        }

        Ok(Self { name, version })
    }

    /// Archive base name: `<name>-v<version>-<arch>-<platform>`
    pub fn archive_base_name(&self, arch: &str, platform: &str) -> String {
        format!("{}-v{}-{}-{}", self.name, self.version, arch, platform)
    }
}

fn unquote(value: &str) -> &str {
    value.trim().trim_matches(|c| c == '"' || c == '\'')
}
