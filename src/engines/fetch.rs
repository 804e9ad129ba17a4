//! Fetch an engine executable from an `http(s)://` source candidate.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reqwest::blocking::Client;

/// Download `url` into `dest_path` and mark it executable.
pub fn fetch_executable(url: &str, dest_path: &Path) -> Result<()> {
    let client = Client::builder()
        .build()
        .context("failed to build HTTP client")?;

    let resp = client
        .get(url)
        .send()
        .with_context(|| format!("request failed: {url}"))?
        .error_for_status()
        .with_context(|| format!("download failed (bad status): {url}"))?;

    download_to_path_with_reader(resp, dest_path)?;
    mark_executable(dest_path)
}

/// Stream `reader` into `dest_path` safely:
/// - write to `dest_path.part`
/// - fsync + rename to final path
/// - remove the partial file on any error
pub(crate) fn download_to_path_with_reader<R: Read>(mut reader: R, dest_path: &Path) -> Result<()> {
    let tmp_path = PathBuf::from(format!("{}.part", dest_path.display()));

    let result = (|| -> Result<()> {
        let mut file = fs::File::create(&tmp_path)
            .with_context(|| format!("failed to create temp file: {}", tmp_path.display()))?;

        let mut buf = [0u8; 64 * 1024];
        let mut written = 0usize;
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            written += n;
        }

        anyhow::ensure!(written > 0, "downloaded engine was empty");

        file.sync_all()?;
        fs::rename(&tmp_path, dest_path)
            .with_context(|| format!("failed to move into place: {}", dest_path.display()))?;
        Ok(())
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }

    result
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms)
        .with_context(|| format!("failed to mark executable: {}", path.display()))
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> Result<()> {
    Ok(())
}
