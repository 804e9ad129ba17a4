use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::Result;

/// The single output of a successful operation.
///
/// The caller decides how to present it (write to disk, send as an HTTP download, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub bytes: Vec<u8>,

    /// Suggested download name (e.g. `cut.mp4`, `audio.aac`).
    pub file_name: String,

    pub mime: &'static str,
}

impl Artifact {
    /// Write the artifact into `dir` under its suggested name and return the written path.
    pub fn write_into(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory '{}'", dir.display()))?;

        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_into_creates_directory_and_file() -> anyhow::Result<()> {
        let root = tempfile::tempdir()?;
        let artifact = Artifact {
            bytes: b"mp4".to_vec(),
            file_name: "cut.mp4".to_owned(),
            mime: "video/mp4",
        };

        let path = artifact.write_into(root.path().join("nested"))?;
        assert_eq!(path, root.path().join("nested").join("cut.mp4"));
        assert_eq!(std::fs::read(path)?, b"mp4");
        Ok(())
    }
}
