use anyhow::{Context, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::cli::{ArchiveFormat, Args};
use crate::config::{self, Config};
use crate::error::{MkReleaseError, Result as MkResult};
use crate::metadata::ProjectMetadata;
use crate::packager::{self, Digests};
use crate::stager::{self, PackingList, Stager};

/// Outcome of a successful packaging run
#[derive(Debug)]
pub struct ReleaseReport {
    pub metadata: ProjectMetadata,
    pub archive_name: String,
    /// `None` when the archive format is `none`
    pub archive_path: Option<PathBuf>,
    pub staged_files: Vec<String>,
    pub digests: Digests,
}

/// Runs `cargo build` for the release binary when it is missing
pub struct BinaryBuilder {
    program: OsString,
    profile: String,
}

impl BinaryBuilder {
    /// Use `$CARGO` when invoked as a cargo subcommand, `cargo` otherwise
    pub fn new(profile: &str) -> Self {
        let program = std::env::var_os("CARGO").unwrap_or_else(|| OsString::from("cargo"));
        Self::with_program(program, profile)
    }

    pub fn with_program(program: impl Into<OsString>, profile: &str) -> Self {
        Self {
            program: program.into(),
            profile: profile.to_string(),
        }
    }

    fn command(&self, project_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("build").current_dir(project_dir);

        if self.profile == "release" {
            cmd.arg("--release");
        } else {
            cmd.arg("--profile").arg(&self.profile);
        }

        cmd
    }

    /// Build unless `binary` already exists. Output streams are inherited.
    pub fn ensure_binary(&self, project_dir: &Path, binary: &Path) -> MkResult<()> {
        if binary.exists() {
            tracing::info!("Using existing binary: {}", binary.display());
            return Ok(());
        }

        tracing::info!(
            "Binary {} not found, building with profile {}",
            binary.display(),
            self.profile
        );

        let status = self
            .command(project_dir)
            .status()
            .map_err(|e| MkReleaseError::BuildFailed {
                reason: format!("could not run {}: {e}", self.program.to_string_lossy()),
            })?;

        if !status.success() {
            return Err(MkReleaseError::BuildFailed {
                reason: format!("{} build exited with {status}", self.program.to_string_lossy()),
            });
        }

        Ok(())
    }
}

pub struct ReleaseBuilder {
    args: Args,
    builder: BinaryBuilder,
}

impl ReleaseBuilder {
    pub fn new(mut args: Args) -> Result<Self> {
        let config_path = Config::locate(&args)?;
        tracing::debug!("Loading configuration from {}", config_path.display());
        let config = Config::load(&config_path).context("Failed to load configuration")?;

        config.merge_with_args(&mut args);

        let builder = BinaryBuilder::new(&Self::profile_of(&args));
        Ok(Self { args, builder })
    }

    /// Replace the build step, e.g. to use a different cargo binary
    pub fn with_binary_builder(mut self, builder: BinaryBuilder) -> Self {
        self.builder = builder;
        self
    }

    fn profile_of(args: &Args) -> String {
        args.profile.clone().unwrap_or_else(config::default_profile)
    }

    fn format(&self) -> ArchiveFormat {
        self.args.format.unwrap_or_else(config::default_format)
    }

    fn platform(&self) -> String {
        self.args
            .platform
            .clone()
            .unwrap_or_else(config::default_platform)
    }

    fn arch(&self) -> String {
        self.args.arch.clone().unwrap_or_else(config::default_arch)
    }

    fn target_dir(&self) -> PathBuf {
        self.args
            .target_dir
            .clone()
            .unwrap_or_else(config::default_target_dir)
    }

    pub fn run(&self) -> Result<ReleaseReport> {
        let project_dir = &self.args.project_dir;
        let output_dir = self.args.output_dir();
        let platform = self.platform();
        let format = self.format();

        let manifest_path = project_dir.join("Cargo.toml");
        let metadata = ProjectMetadata::from_path(&manifest_path)
            .with_context(|| format!("Failed to read project metadata from {}", manifest_path.display()))?;
        tracing::info!("Packaging {} v{}", metadata.name, metadata.version);

        let binary = stager::release_binary_path(
            &self.target_dir(),
            &Self::profile_of(&self.args),
            &metadata.name,
            &platform,
        );
        self.builder.ensure_binary(project_dir, &project_dir.join(&binary))?;

        let archive_name = metadata.archive_base_name(&self.arch(), &platform);
        let archive_path = packager::archive_path(&output_dir, &archive_name, format);

        let stager = Stager::new(project_dir, &output_dir, &metadata.name);
        stager
            .prepare(archive_path.as_deref())
            .context("Failed to prepare staging directory")?;
        let staged = stager.stage(&PackingList::new(binary))?;
        tracing::info!(
            "Staged {} files in {}",
            staged.len(),
            stager.staging_path().display()
        );

        let digests = packager::generate_checksums(stager.staging_path())?;

        let archive_path =
            packager::create_archive(stager.staging_path(), &output_dir, &archive_name, format)?;
        if archive_path.is_none() {
            tracing::warn!(
                "Archive format is none; staged files in {} are discarded",
                stager.staging_path().display()
            );
        }

        stager
            .cleanup()
            .context("Failed to remove staging directory")?;

        let staged_files = staged
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
            .collect();

        Ok(ReleaseReport {
            metadata,
            archive_name,
            archive_path,
            staged_files,
            digests,
        })
    }
}
