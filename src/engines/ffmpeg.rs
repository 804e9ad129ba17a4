//! Engine implementation that shells out to an `ffmpeg` executable.
//!
//! Each handle owns a private temporary working directory that plays the role of the engine's
//! working storage: inputs are staged into it, every invocation runs with it as the current
//! directory, and outputs are read back from it. Dropping the handle removes the directory.

use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, anyhow};
use tempfile::TempDir;
use tracing::debug;

use crate::engine::{Engine, EngineEvents, EngineProvider, Invocation, SourceLocation};
use crate::engine::validate_storage_name;
use crate::engines::progress::{ProgressTracker, for_each_line, parse_timestamp};
use crate::{Error, Result};

/// How many trailing stderr lines are kept for failure messages.
const STDERR_TAIL_LINES: usize = 8;

/// Flags prepended to every invocation.
const BASE_ARGS: &[&str] = &["-hide_banner", "-nostdin", "-y"];

/// Creates [`FfmpegEngine`] handles from source candidates.
#[derive(Debug, Default, Clone)]
pub struct FfmpegProvider {
    /// Parent directory for working storage (system temp dir when `None`).
    work_root: Option<PathBuf>,
}

impl FfmpegProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create working directories under `dir` instead of the system temp dir.
    pub fn with_work_root(dir: impl Into<PathBuf>) -> Self {
        Self {
            work_root: Some(dir.into()),
        }
    }

    fn make_workdir(&self) -> io::Result<TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("mediacut-");
        match &self.work_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }
}

impl EngineProvider for FfmpegProvider {
    type Engine = FfmpegEngine;

    fn initialize(&mut self, source: &SourceLocation) -> Result<FfmpegEngine> {
        let workdir = self
            .make_workdir()
            .context("failed to create engine working directory")?;

        let program = match source {
            SourceLocation::Path(path) => resolve_program(path)?,
            SourceLocation::Url(url) => fetch_into(url, workdir.path())?,
        };

        let version = probe_version(&program)?;
        debug!(program = %program.display(), %version, "ffmpeg probed");

        Ok(FfmpegEngine {
            program,
            version,
            workdir,
        })
    }
}

#[cfg(feature = "remote-engine")]
fn fetch_into(url: &str, workdir: &Path) -> Result<PathBuf> {
    // The executable lives next to (not inside) the working storage namespace.
    let bin_dir = workdir.join(".engine");
    fs::create_dir_all(&bin_dir)?;
    let dest = bin_dir.join(if cfg!(windows) { "ffmpeg.exe" } else { "ffmpeg" });
    crate::engines::fetch::fetch_executable(url, &dest)?;
    Ok(dest)
}

#[cfg(not(feature = "remote-engine"))]
fn fetch_into(url: &str, _workdir: &Path) -> Result<PathBuf> {
    Err(Error::msg(format!(
        "cannot load engine from '{url}': remote sources require the `remote-engine` feature"
    )))
}

/// Anchor relative paths to the current directory, since invocations run inside the working
/// storage. Bare command names are left for `PATH` lookup.
fn resolve_program(path: &Path) -> Result<PathBuf> {
    let has_dir = path
        .parent()
        .is_some_and(|parent| !parent.as_os_str().is_empty());
    if path.is_absolute() || !has_dir {
        return Ok(path.to_path_buf());
    }

    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    Ok(cwd.join(path))
}

/// Run `<program> -version` and return its first output line.
fn probe_version(program: &Path) -> Result<String> {
    let output = Command::new(program)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .with_context(|| format!("failed to execute '{}'", program.display()))?;

    if !output.status.success() {
        return Err(Error::msg(format!(
            "'{} -version' exited with {}",
            program.display(),
            output.status
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.lines().next().unwrap_or_default().trim().to_owned();
    if !first.starts_with("ffmpeg version") {
        return Err(Error::msg(format!(
            "'{}' does not look like ffmpeg (got '{first}')",
            program.display()
        )));
    }

    Ok(first)
}

/// A loaded ffmpeg executable plus its private working storage.
#[derive(Debug)]
pub struct FfmpegEngine {
    program: PathBuf,
    version: String,
    workdir: TempDir,
}

impl FfmpegEngine {
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// First line of `ffmpeg -version`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn workdir(&self) -> &Path {
        self.workdir.path()
    }

    fn path_of(&self, name: &str) -> Result<PathBuf> {
        validate_storage_name(name)?;
        Ok(self.workdir.path().join(name))
    }
}

impl Engine for FfmpegEngine {
    fn is_ready(&self) -> bool {
        self.workdir.path().is_dir()
    }

    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_of(name)?;
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(())
    }

    fn invoke(&mut self, invocation: &Invocation, events: &mut dyn EngineEvents) -> Result<()> {
        validate_storage_name(invocation.output_name())?;

        let mut tracker = ProgressTracker::new(
            invocation.flag_value("-t").and_then(parse_timestamp),
            invocation.flag_value("-ss").and_then(parse_timestamp),
        );

        debug!(program = %self.program.display(), args = %invocation, "running ffmpeg");

        let mut child = Command::new(&self.program)
            .args(BASE_ARGS)
            .args(invocation.args())
            .current_dir(self.workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn '{}'", self.program.display()))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow!("ffmpeg stderr was not captured"))?;

        let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let read_res = for_each_line(stderr, |line| {
            events.on_log(line);
            if let Some(ratio) = tracker.on_line(line) {
                events.on_progress(ratio);
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_owned());
        });

        // Always reap the child, even if reading stderr failed.
        let status = child.wait().context("failed to wait for ffmpeg")?;
        read_res.context("failed to read ffmpeg output")?;

        if !status.success() {
            let details = tail.into_iter().collect::<Vec<_>>().join(" | ");
            return Err(Error::InvocationFailure {
                reason: format!("ffmpeg exited with {status}: {details}"),
            });
        }

        events.on_progress(1.0);
        Ok(())
    }

    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_of(name)?;
        let bytes = fs::read(&path).with_context(|| format!("failed to read '{}'", path.display()))?;
        Ok(bytes)
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let path = self.path_of(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}
