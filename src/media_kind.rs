//! Media kind resolution for selected inputs.
//!
//! The dispatcher only needs to know whether an input is *video* or *audio*: that single bit
//! decides which argument table is used. We resolve it from the cheapest signal available:
//! - the declared mime type (browsers and HTTP clients usually send one)
//! - the file extension
//! - a bounded Symphonia probe of the leading bytes
//!
//! When nothing conclusive is found we fall back to [`MediaKind::Video`].

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Upper bound on how many leading bytes we hand to the prober.
const MAX_SNIFF_BYTES: usize = 512 * 1024;

const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "mov", "mkv", "webm", "avi", "wmv", "flv", "mpg", "mpeg", "ts", "m2ts", "3gp",
    "ogv",
];

const AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "wav", "aac", "m4a", "flac", "ogg", "oga", "opus", "wma", "aiff", "aif", "alac", "caf",
];

/// Whether a selected input is a video or an audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A container with (at least) a video stream.
    Video,

    /// An audio-only file.
    Audio,
}

impl MediaKind {
    /// Classify from a declared mime type (`video/*` or `audio/*`).
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        let (top, _) = essence.split_once('/')?;
        match top.to_ascii_lowercase().as_str() {
            "video" => Some(Self::Video),
            "audio" => Some(Self::Audio),
            _ => None,
        }
    }

    /// Classify from a file name's extension.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = extension_of(file_name)?;
        if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Audio)
        } else {
            None
        }
    }

    /// Classify by probing the payload.
    ///
    /// Symphonia only understands audio codecs, so any track it cannot name is taken to be a
    /// video (or data) stream.
    pub fn sniff(bytes: &[u8], hint_extension: Option<&str>) -> Result<Self> {
        let prefix = bytes[..bytes.len().min(MAX_SNIFF_BYTES)].to_vec();
        let mss = MediaSourceStream::new(
            Box::new(Cursor::new(prefix)),
            MediaSourceStreamOptions {
                buffer_len: 256 * 1024,
            },
        );

        let mut hint = Hint::new();
        if let Some(ext) = hint_extension {
            hint.with_extension(ext);
        }

        let format_opts: FormatOptions = Default::default();
        let metadata_opts: MetadataOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &format_opts, &metadata_opts)
            .map_err(|e| anyhow!(e))
            .context("failed to probe media stream")?;

        let tracks = probed.format.tracks();
        if tracks.is_empty() {
            anyhow::bail!("container has no tracks");
        }

        let all_audio = tracks
            .iter()
            .all(|t| t.codec_params.codec != CODEC_TYPE_NULL);

        Ok(if all_audio { Self::Audio } else { Self::Video })
    }

    /// Resolve the media kind of an input: declared mime, then extension, then content.
    pub fn resolve(declared_mime: Option<&str>, file_name: &str, bytes: &[u8]) -> Self {
        if let Some(kind) = declared_mime.and_then(Self::from_mime) {
            return kind;
        }
        if let Some(kind) = Self::from_file_name(file_name) {
            return kind;
        }

        let ext = extension_of(file_name);
        match Self::sniff(bytes, ext.as_deref()) {
            Ok(kind) => kind,
            Err(err) => {
                tracing::debug!(file_name, error = %err, "media kind sniffing failed; assuming video");
                Self::Video
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
        }
    }
}

/// Lower-cased extension of `file_name`, if it has a non-empty one.
pub(crate) fn extension_of(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}
