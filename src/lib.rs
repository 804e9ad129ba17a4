//! `mediacut`: trim media files and extract their audio by driving an external transcoding
//! engine (ffmpeg).
//!
//! This crate provides:
//! - Engine loading with ordered fallback across source candidates
//! - Media kind detection (declared mime, extension, content sniffing)
//! - Argument tables for trim and extract/convert operations
//! - A dispatcher that sequences load → stage → invoke → retrieve for one session
//!
//! All codec work happens inside the engine; this crate decides *what* to ask for and hands
//! back the produced artifact.

// High-level API (most consumers should start here).
pub mod dispatcher;
pub mod opts;
pub mod request;
pub mod session;

// Engine capability interface, loading, and built-in implementations.
pub mod candidates;
pub mod engine;
pub mod engines;
pub mod loader;

// Operation planning.
pub mod args;
pub mod audio_codec;
pub mod media_kind;

// Results and user-facing status.
pub mod artifact;
pub mod status;

pub mod error;

// Logging configuration and control.
#[cfg(feature = "logging")]
pub mod logging;

pub use artifact::Artifact;
pub use audio_codec::AudioCodec;
pub use dispatcher::Dispatcher;
pub use engine::{Engine, EngineEvents, EngineProvider, Invocation, SourceLocation};
pub use engines::ffmpeg::{FfmpegEngine, FfmpegProvider};
pub use error::{Error, Result};
pub use loader::{EngineLoader, Readiness};
pub use media_kind::MediaKind;
pub use opts::EncodingOpts;
pub use request::OperationRequest;
pub use session::{SelectedInput, Session};
pub use status::{NoopStatus, Status, StatusSink, TracingStatus};

#[cfg(feature = "logging")]
pub use logging::{LOG_ENV, init as init_logging, init_with_default as init_logging_with_default};
