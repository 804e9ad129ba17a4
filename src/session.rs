//! The in-progress user interaction.
//!
//! A [`Session`] replaces the loose "current file / current kind / current staged name"
//! globals a page-level front end would keep: everything the dispatcher needs about the user's
//! selection travels in one value that is passed into each operation explicitly.

use crate::loader::Readiness;
use crate::media_kind::{MediaKind, extension_of};
use crate::status::Status;

/// Base name every staged input is written under (the original extension is kept).
const STAGED_BASE: &str = "input";

/// A file the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedInput {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub kind: MediaKind,
}

impl SelectedInput {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            kind,
        }
    }

    /// Build an input whose kind is resolved from the declared mime type, the file name, and
    /// finally the content itself.
    pub fn detect(bytes: Vec<u8>, file_name: impl Into<String>, declared_mime: Option<&str>) -> Self {
        let file_name = file_name.into();
        let kind = MediaKind::resolve(declared_mime, &file_name, &bytes);
        Self {
            bytes,
            file_name,
            kind,
        }
    }
}

/// One user's session: at most one selected input plus the last known engine readiness.
#[derive(Debug, Default)]
pub struct Session {
    input: Option<SelectedInput>,
    staged_name: Option<String>,
    readiness: Readiness,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a new input, recomputing the staged name. Returns the status line to show.
    pub fn select(&mut self, input: SelectedInput) -> Status {
        self.staged_name = Some(staged_name_for(&input.file_name));
        let status = Status::Selected {
            file_name: input.file_name.clone(),
            size_bytes: input.bytes.len(),
        };
        self.input = Some(input);
        status
    }

    /// Drop the current selection.
    pub fn clear(&mut self) -> Status {
        self.input = None;
        self.staged_name = None;
        Status::WaitingForFile
    }

    pub fn input(&self) -> Option<&SelectedInput> {
        self.input.as_ref()
    }

    pub fn staged_name(&self) -> Option<&str> {
        self.staged_name.as_deref()
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness
    }

    pub(crate) fn set_readiness(&mut self, readiness: Readiness) {
        self.readiness = readiness;
    }
}

/// `input.<ext>` with the original (lower-cased) extension, or plain `input`.
pub fn staged_name_for(file_name: &str) -> String {
    match extension_of(file_name) {
        Some(ext) if ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            format!("{STAGED_BASE}.{ext}")
        }
        _ => STAGED_BASE.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_name_preserves_extension() {
        assert_eq!(staged_name_for("clip.MOV"), "input.mov");
        assert_eq!(staged_name_for("voice.wav"), "input.wav");
        assert_eq!(staged_name_for("archive.tar.gz"), "input.gz");
        assert_eq!(staged_name_for("README"), "input");
        assert_eq!(staged_name_for("weird.e x t"), "input");
    }

    #[test]
    fn selecting_a_new_file_recomputes_staged_name() {
        let mut session = Session::new();
        assert!(session.input().is_none());

        session.select(SelectedInput::new(vec![1], "clip.mov", MediaKind::Video));
        assert_eq!(session.staged_name(), Some("input.mov"));

        let status = session.select(SelectedInput::new(vec![2], "voice.wav", MediaKind::Audio));
        assert_eq!(session.staged_name(), Some("input.wav"));
        assert_eq!(session.input().map(|i| i.kind), Some(MediaKind::Audio));
        assert!(status.to_string().starts_with("Selected: voice.wav"));
    }

    #[test]
    fn clearing_returns_to_waiting() {
        let mut session = Session::new();
        session.select(SelectedInput::new(vec![1], "clip.mov", MediaKind::Video));
        assert_eq!(session.clear(), Status::WaitingForFile);
        assert!(session.input().is_none());
        assert!(session.staged_name().is_none());
    }

    #[test]
    fn new_session_is_not_loaded() {
        assert_eq!(Session::new().readiness(), Readiness::NotLoaded);
    }
}
