use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "cargo-mkrelease",
    version,
    about = "Package a release binary into a checksummed archive",
    long_about = None,
    bin_name = "cargo"
)]
pub enum CargoCli {
    #[clap(name = "mkrelease")]
    Mkrelease(MkreleaseCli),
}

#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct MkreleaseCli {
    /// Project directory containing Cargo.toml and the release documents
    #[clap(long, default_value = ".")]
    pub project_dir: PathBuf,

    /// Directory receiving the staging directory and the archive
    /// (defaults to the project directory)
    #[clap(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Archive format (zip, tgz, or none to skip archiving)
    #[clap(short, long)]
    pub format: Option<ArchiveFormat>,

    /// Platform tag used in the archive name and binary naming (e.g. windows, linux)
    #[clap(short, long)]
    pub platform: Option<String>,

    /// Architecture tag used in the archive name
    #[clap(long)]
    pub arch: Option<String>,

    /// Cargo build profile (release, debug, etc.)
    #[clap(long)]
    pub profile: Option<String>,

    /// Cargo target directory, relative to the project directory
    #[clap(long)]
    pub target_dir: Option<PathBuf>,

    /// Configuration file path, relative to the project directory
    /// (defaults to .config/mkrelease.toml, then the user-wide mkrelease.toml)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[clap(long)]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct Args {
    pub project_dir: PathBuf,
    pub output_dir: Option<PathBuf>,
    pub format: Option<ArchiveFormat>,
    pub platform: Option<String>,
    pub arch: Option<String>,
    pub profile: Option<String>,
    pub target_dir: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

impl From<MkreleaseCli> for Args {
    fn from(cli: MkreleaseCli) -> Self {
        Args {
            project_dir: cli.project_dir,
            output_dir: cli.output_dir,
            format: cli.format,
            platform: cli.platform,
            arch: cli.arch,
            profile: cli.profile,
            target_dir: cli.target_dir,
            config: cli.config,
            verbose: cli.verbose,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveFormat {
    Zip,
    Tgz,
    None,
}

impl ArchiveFormat {
    /// File extension of the produced archive, if any
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            ArchiveFormat::Zip => Some("zip"),
            ArchiveFormat::Tgz => Some("tar.gz"),
            ArchiveFormat::None => None,
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFormat::Zip => write!(f, "zip"),
            ArchiveFormat::Tgz => write!(f, "tgz"),
            ArchiveFormat::None => write!(f, "none"),
        }
    }
}

impl Args {
    /// Arguments for packaging the project in `project_dir` with everything else unset
    pub fn for_project(project_dir: impl Into<PathBuf>) -> Self {
        Args {
            project_dir: project_dir.into(),
            output_dir: None,
            format: None,
            platform: None,
            arch: None,
            profile: None,
            target_dir: None,
            config: None,
            verbose: false,
        }
    }

    /// Directory that receives the staging directory and archive
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| self.project_dir.clone())
    }
}
