use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::Result;

/// Encoder choices used when building engine argument lists.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The values below are the committed defaults; they are configuration rather than a
/// guaranteed-correct encoding policy, so callers (and config files) may override any of them.
///
/// Every field is optional in JSON thanks to `#[serde(default)]`:
/// ```json
/// { "aac_bitrate": "256k", "video_preset": "fast" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EncodingOpts {
    /// Video encoder used when trimming video (`-c:v`).
    pub video_codec: String,

    /// Encoder preset passed alongside the video encoder (`-preset`).
    pub video_preset: String,

    /// Audio encoder used for the audio stream of a trimmed video (`-c:a`).
    pub trim_audio_codec: String,

    /// Whether trimmed mp4 output is flagged for fast-start playback (`-movflags faststart`).
    pub fast_start: bool,

    /// `libmp3lame` VBR quality level (`-q:a`, 0 is best).
    pub mp3_quality: String,

    /// AAC target bitrate (`-b:a`).
    pub aac_bitrate: String,

    /// WAV output sample rate in Hz (`-ar`).
    pub wav_sample_rate: u32,

    /// WAV output channel count (`-ac`).
    pub wav_channels: u32,
}

impl Default for EncodingOpts {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_owned(),
            video_preset: "veryfast".to_owned(),
            trim_audio_codec: "aac".to_owned(),
            fast_start: true,
            mp3_quality: "0".to_owned(),
            aac_bitrate: "192k".to_owned(),
            wav_sample_rate: 44_100,
            wav_channels: 2,
        }
    }
}

impl EncodingOpts {
    /// Load options from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_json_yields_defaults() -> anyhow::Result<()> {
        assert_eq!(EncodingOpts::from_json_str("{}")?, EncodingOpts::default());
        Ok(())
    }

    #[test]
    fn partial_json_overrides_only_named_fields() -> anyhow::Result<()> {
        let opts = EncodingOpts::from_json_str(r#"{ "aac_bitrate": "256k", "fast_start": false }"#)?;
        assert_eq!(opts.aac_bitrate, "256k");
        assert!(!opts.fast_start);
        assert_eq!(opts.mp3_quality, "0");
        assert_eq!(opts.wav_sample_rate, 44_100);
        Ok(())
    }

    #[test]
    fn from_json_file_reports_missing_file() {
        let err = EncodingOpts::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }
}
