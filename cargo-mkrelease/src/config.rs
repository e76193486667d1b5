use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::{ArchiveFormat, Args};
use crate::error::MkReleaseError;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub default: DefaultConfig,
}

#[derive(Debug, Deserialize)]
pub struct DefaultConfig {
    #[serde(default = "default_format")]
    pub format: ArchiveFormat,

    #[serde(default = "default_platform")]
    pub platform: String,

    #[serde(default = "default_arch")]
    pub arch: String,

    #[serde(default = "default_profile")]
    pub profile: String,

    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,
}

impl Default for DefaultConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            platform: default_platform(),
            arch: default_arch(),
            profile: default_profile(),
            target_dir: default_target_dir(),
        }
    }
}

pub fn default_format() -> ArchiveFormat {
    ArchiveFormat::Zip
}

/// Platform tag of the host, used only when nothing else is configured
pub fn default_platform() -> String {
    std::env::consts::OS.to_string()
}

pub fn default_arch() -> String {
    "x86_64".to_string()
}

pub fn default_profile() -> String {
    "release".to_string()
}

pub fn default_target_dir() -> PathBuf {
    PathBuf::from("target")
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| MkReleaseError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(config)
    }

    /// Get the user-wide configuration file path
    pub fn default_path() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("mkrelease.toml"))
            .unwrap_or_else(|| PathBuf::from("~/.config/mkrelease.toml"))
    }

    /// Pick the configuration file for `args`.
    ///
    /// An explicit `--config` file must exist. Without one, the project's
    /// `.config/mkrelease.toml` is used when present, else the user-wide file.
    pub fn locate(args: &Args) -> Result<PathBuf> {
        if let Some(path) = &args.config {
            let path = args.project_dir.join(path);
            if !path.exists() {
                return Err(MkReleaseError::Config {
                    path: path.display().to_string(),
                    message: "configuration file not found".to_string(),
                }
                .into());
            }
            return Ok(path);
        }

        let project_path = args.project_dir.join(".config/mkrelease.toml");
        if project_path.exists() {
            Ok(project_path)
        } else {
            Ok(Self::default_path())
        }
    }

    /// Merge configuration with command line arguments
    pub fn merge_with_args(&self, args: &mut Args) {
        if args.format.is_none() {
            args.format = Some(self.default.format);
        }

        if args.platform.is_none() {
            args.platform = Some(self.default.platform.clone());
        }

        if args.arch.is_none() {
            args.arch = Some(self.default.arch.clone());
        }

        if args.profile.is_none() {
            args.profile = Some(self.default.profile.clone());
        }

        if args.target_dir.is_none() {
            args.target_dir = Some(self.default.target_dir.clone());
        }
    }
}
