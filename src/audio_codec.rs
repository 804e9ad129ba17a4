use serde::Deserialize;

/// The audio targets offered by the extract/convert operation.
///
/// Each variant maps to one file extension, one mime type and one row of the encoder table in
/// [`crate::args`]. Using an enum keeps target selection explicit and lets the argument tables be
/// checked for exhaustiveness at build time.
///
/// `ValueEnum` (behind the `cli` feature) lets this enum be used directly as a CLI flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    /// MPEG-1 Layer III via `libmp3lame`.
    Mp3,

    /// 16-bit little-endian PCM in a WAV container.
    Wav,

    /// AAC via ffmpeg's native encoder.
    Aac,
}

impl AudioCodec {
    pub const ALL: [AudioCodec; 3] = [AudioCodec::Mp3, AudioCodec::Wav, AudioCodec::Aac];

    /// File extension of the produced artifact.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Aac => "aac",
        }
    }

    /// Declared mime type of the produced artifact.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
            Self::Aac => "audio/aac",
        }
    }

    /// Engine-side output name, which is also the suggested download name.
    pub fn output_name(&self) -> String {
        format!("audio.{}", self.extension())
    }

    /// Parse a user-supplied target name (case-insensitive, surrounding whitespace ignored).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mp3" => Some(Self::Mp3),
            "wav" => Some(Self::Wav),
            "aac" => Some(Self::Aac),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_table_matches_extensions() {
        assert_eq!(AudioCodec::Mp3.mime(), "audio/mpeg");
        assert_eq!(AudioCodec::Wav.mime(), "audio/wav");
        assert_eq!(AudioCodec::Aac.mime(), "audio/aac");
    }

    #[test]
    fn output_name_uses_the_audio_base() {
        for codec in AudioCodec::ALL {
            assert_eq!(codec.output_name(), format!("audio.{}", codec.extension()));
        }
    }

    #[test]
    fn parse_accepts_known_values_case_insensitively() {
        assert_eq!(AudioCodec::parse(" AAC "), Some(AudioCodec::Aac));
        assert_eq!(AudioCodec::parse("mp3"), Some(AudioCodec::Mp3));
        assert_eq!(AudioCodec::parse("flac"), None);
    }
}
