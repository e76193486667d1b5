use anyhow::Result;
use blake2::Blake2b512;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::ArchiveFormat;
use crate::error::MkReleaseError;

pub const B2SUMS: &str = "B2SUMS";
pub const SHA256SUMS: &str = "SHA256SUMS";

/// Digests of the staged files for one algorithm, keyed by file name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestTable {
    entries: BTreeMap<String, String>,
}

impl DigestTable {
    pub fn insert(&mut self, file_name: String, hex_digest: String) {
        self.entries.insert(file_name, hex_digest);
    }

    pub fn get(&self, file_name: &str) -> Option<&str> {
        self.entries.get(file_name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(file name, hex digest)` pairs sorted by file name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// BLAKE2b-512 and SHA-256 tables for one staging directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Digests {
    pub blake2: DigestTable,
    pub sha256: DigestTable,
}

fn hex_digest<D: Digest>(buf: &[u8]) -> String {
    hex::encode(D::digest(buf))
}

/// Hash every top-level file in `staging_dir`, skipping the manifest files
pub fn compute_digests(staging_dir: &Path) -> Result<Digests> {
    let mut digests = Digests::default();

    for entry in fs::read_dir(staging_dir)? {
        let entry = entry?;
        let file_name = entry
            .file_name()
            .into_string()
            .map_err(|name| MkReleaseError::Package(format!("Non UTF-8 file name: {name:?}")))?;

        if file_name == B2SUMS || file_name == SHA256SUMS {
            continue;
        }
        if !entry.file_type()?.is_file() {
            tracing::debug!("Skipping non-file entry: {}", file_name);
            continue;
        }

        let buf = fs::read(entry.path())?;
        digests
            .blake2
            .insert(file_name.clone(), hex_digest::<Blake2b512>(&buf));
        digests
            .sha256
            .insert(file_name.clone(), hex_digest::<Sha256>(&buf));
        tracing::debug!("Hashed {} ({} bytes)", file_name, buf.len());
    }

    Ok(digests)
}

/// Append `<digest> <file name>` lines for `table` to `manifest_path`
pub fn write_manifest(manifest_path: &Path, table: &DigestTable) -> Result<()> {
    let mut manifest = OpenOptions::new()
        .create(true)
        .append(true)
        .open(manifest_path)?;

    for (file_name, digest) in table.iter() {
        writeln!(manifest, "{} {}", digest, file_name)?;
    }

    Ok(())
}

/// Write `B2SUMS` and `SHA256SUMS` into `staging_dir`
pub fn generate_checksums(staging_dir: &Path) -> Result<Digests> {
    let digests = compute_digests(staging_dir)?;

    write_manifest(&staging_dir.join(B2SUMS), &digests.blake2)?;
    write_manifest(&staging_dir.join(SHA256SUMS), &digests.sha256)?;

    tracing::info!(
        "Generated checksums for {} files in {}",
        digests.sha256.len(),
        staging_dir.display()
    );
    Ok(digests)
}

/// Path the archive for `archive_name` will be written to, if the format produces one
pub fn archive_path(output_dir: &Path, archive_name: &str, format: ArchiveFormat) -> Option<PathBuf> {
    format
        .extension()
        .map(|ext| output_dir.join(format!("{archive_name}.{ext}")))
}

/// Archive `staging_dir` so that it extracts to a single top-level directory
/// named like the staging directory.
///
/// Returns `None` for [`ArchiveFormat::None`].
pub fn create_archive(
    staging_dir: &Path,
    output_dir: &Path,
    archive_name: &str,
    format: ArchiveFormat,
) -> Result<Option<PathBuf>> {
    let path = match format {
        ArchiveFormat::Zip => {
            let path = output_dir.join(format!("{archive_name}.zip"));
            create_zip(&path, staging_dir)?;
            path
        }
        ArchiveFormat::Tgz => {
            let path = output_dir.join(format!("{archive_name}.tar.gz"));
            create_tar_gz(&path, staging_dir)?;
            path
        }
        ArchiveFormat::None => return Ok(None),
    };

    tracing::info!("Created archive: {}", path.display());
    Ok(Some(path))
}

fn root_name(staging_dir: &Path) -> Result<&str> {
    staging_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| MkReleaseError::Package("Invalid staging directory".to_string()).into())
}

/// Create a tar.gz archive
fn create_tar_gz(archive_path: &Path, staging_dir: &Path) -> Result<()> {
    let root = root_name(staging_dir)?;

    let tar_file = File::create(archive_path)?;
    let gz_encoder = flate2::write::GzEncoder::new(tar_file, flate2::Compression::default());
    let mut tar_builder = tar::Builder::new(gz_encoder);

    tar_builder.append_dir_all(root, staging_dir)?;
    tar_builder.into_inner()?.finish()?;
    Ok(())
}

/// Create a zip archive
fn create_zip(archive_path: &Path, staging_dir: &Path) -> Result<()> {
    let root = root_name(staging_dir)?;

    let file = File::create(archive_path)?;
    let mut zip = zip::ZipWriter::new(file);

    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for entry in WalkDir::new(staging_dir).sort_by_file_name() {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(staging_dir)
            .map_err(|e| MkReleaseError::Package(e.to_string()))?;

        let mut name = root.to_string();
        for component in relative.components() {
            let part = component.as_os_str().to_str().ok_or_else(|| {
                MkReleaseError::Package(format!("Non UTF-8 path: {}", entry.path().display()))
            })?;
            name.push('/');
            name.push_str(part);
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options.unix_permissions(0o755))?;
        } else {
            zip.start_file(name, options.unix_permissions(file_mode(entry.path())?))?;
            let file_content = fs::read(entry.path())?;
            zip.write_all(&file_content)?;
        }
    }

    zip.finish()?;
    Ok(())
}

#[cfg(unix)]
fn file_mode(path: &Path) -> Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(fs::metadata(path)?.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn file_mode(path: &Path) -> Result<u32> {
    let is_exe = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("exe"))
        .unwrap_or(false);
    Ok(if is_exe { 0o755 } else { 0o644 })
}
