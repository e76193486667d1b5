//! # cargo-mkrelease
//!
//! A cargo subcommand that packages a release binary into a versioned,
//! checksummed archive for a single platform.
//!
//! ## Overview
//!
//! `cargo-mkrelease` reads the project name and version from `Cargo.toml`,
//! builds the release binary if it is missing, stages it together with
//! `CHANGELOG.md`, `LICENSE` and `README.md`, writes `B2SUMS` (BLAKE2b-512)
//! and `SHA256SUMS` manifests, and archives the staging directory as
//! `<name>-v<version>-<arch>-<platform>.zip` (or `.tar.gz`).
//!
//! ## Usage
//!
//! ```bash
//! # Package for the host platform as a zip
//! cargo mkrelease
//!
//! # Package a Windows release
//! cargo mkrelease --platform windows
//!
//! # Produce a tarball in another directory
//! cargo mkrelease --format tgz --output-dir dist
//! ```
//!
//! ## Configuration
//!
//! Defaults can be set in `.config/mkrelease.toml` in the project directory
//! or `mkrelease.toml` in the user configuration directory.

/// Release orchestration and the build step
pub mod builder;

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Configuration file handling and default settings management
pub mod config;

/// Error types and error handling utilities
pub mod error;

/// Project name and version discovery
pub mod metadata;

/// Digest manifests and archive creation
pub mod packager;

/// Staging directory management
pub mod stager;
