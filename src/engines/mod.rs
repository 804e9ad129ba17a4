/// Built-in engine backed by the `ffmpeg` executable.
pub mod ffmpeg;

/// Progress estimation from ffmpeg's stderr stats.
pub mod progress;

/// Fetching engine executables from remote source candidates.
#[cfg(feature = "remote-engine")]
pub mod fetch;
