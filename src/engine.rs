//! Capability interface for the external transcoding engine.
//!
//! The dispatcher never talks to ffmpeg directly. It sees an engine as a small working store
//! plus a command runner:
//! - [`Engine::stage`] writes an input into the engine's working storage
//! - [`Engine::invoke`] runs one command-line-style argument list
//! - [`Engine::retrieve`] reads a produced file back
//!
//! Handles are obtained from an [`EngineProvider`], one source candidate at a time. Keeping the
//! surface this narrow lets tests drive the dispatcher against a fake engine.

use std::fmt;
use std::path::PathBuf;

use crate::Result;

/// Where an engine's executable core can be obtained from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    /// A local executable path, or a bare command name resolved through `PATH`.
    Path(PathBuf),

    /// A remote location the engine is fetched from before use.
    Url(String),
}

impl SourceLocation {
    /// Parse a user-supplied candidate: `http://` / `https://` prefixes are URLs, everything
    /// else is a path or command name.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Url(trimmed.to_owned())
        } else {
            Self::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// One engine run: an ordered argument list whose trailing token names the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    args: Vec<String>,
}

impl Invocation {
    /// Build an invocation from `args` followed by the positional `output` token.
    pub fn new<I, S>(args: I, output: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        args.push(output.into());
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// The trailing positional token (the produced file name).
    pub fn output_name(&self) -> &str {
        self.args.last().map(String::as_str).unwrap_or_default()
    }

    /// The value following the first `-i` flag.
    pub fn input_name(&self) -> Option<&str> {
        self.flag_value("-i")
    }

    /// The value following the first occurrence of `flag`.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|arg| arg == flag)
            .and_then(|idx| self.args.get(idx + 1))
            .map(String::as_str)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.args.iter().any(|arg| arg == token)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Callbacks an engine fires while an invocation runs.
pub trait EngineEvents {
    /// Completion ratio in `[0, 1]`.
    fn on_progress(&mut self, ratio: f32);

    /// One line of engine log output.
    fn on_log(&mut self, _line: &str) {}
}

/// A ready-to-use engine handle.
pub trait Engine {
    fn is_ready(&self) -> bool;

    /// Write `bytes` into working storage under `name`, replacing any previous file.
    fn stage(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Run one invocation to completion. Blocks until the engine signals completion.
    fn invoke(&mut self, invocation: &Invocation, events: &mut dyn EngineEvents) -> Result<()>;

    /// Read a produced file back out of working storage.
    fn retrieve(&mut self, name: &str) -> Result<Vec<u8>>;

    /// Remove a file from working storage. Missing files are not an error.
    fn remove(&mut self, name: &str) -> Result<()>;
}

/// Produces engine handles from source candidates.
pub trait EngineProvider {
    type Engine: Engine;

    /// Initialize an engine against one source candidate.
    fn initialize(&mut self, source: &SourceLocation) -> Result<Self::Engine>;
}

/// Reject names that would escape an engine's working storage.
pub(crate) fn validate_storage_name(name: &str) -> Result<()> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains('\0');
    if ok {
        Ok(())
    } else {
        Err(crate::Error::msg(format!(
            "invalid engine storage name: '{name}'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_urls_and_paths() {
        assert_eq!(
            SourceLocation::parse(" HTTPS://cdn.example/ffmpeg "),
            SourceLocation::Url("HTTPS://cdn.example/ffmpeg".into())
        );
        assert_eq!(
            SourceLocation::parse("ffmpeg"),
            SourceLocation::Path(PathBuf::from("ffmpeg"))
        );
    }

    #[test]
    fn invocation_output_is_the_trailing_token() {
        let inv = Invocation::new(["-i", "input.mov", "-vn"], "audio.mp3");
        assert_eq!(inv.output_name(), "audio.mp3");
        assert_eq!(inv.input_name(), Some("input.mov"));
        assert!(inv.contains("-vn"));
        assert_eq!(inv.to_string(), "-i input.mov -vn audio.mp3");
    }

    #[test]
    fn storage_names_must_be_plain() {
        assert!(validate_storage_name("input.mp4").is_ok());
        for bad in ["", ".", "..", "../etc/passwd", "a/b", "a\\b"] {
            assert!(validate_storage_name(bad).is_err(), "{bad} should be rejected");
        }
    }
}
