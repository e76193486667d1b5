use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MkReleaseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No `{field}` value found in {path}")]
    MissingMetadata { field: &'static str, path: PathBuf },

    #[error("Malformed metadata line {line} in {path}: expected `key = \"value\"`")]
    MalformedMetadata { line: usize, path: PathBuf },

    #[error("Build failed: {reason}")]
    BuildFailed { reason: String },

    #[error("Release file not found: {}", path.display())]
    MissingReleaseFile { path: PathBuf },

    #[error("Configuration error at {path}: {message}")]
    Config { path: String, message: String },

    #[error("Package creation failed: {0}")]
    Package(String),
}

pub type Result<T> = std::result::Result<T, MkReleaseError>;
