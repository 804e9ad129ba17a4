use crate::audio_codec::AudioCodec;

/// Start offset used when the user leaves the start field empty.
pub const DEFAULT_TRIM_START: &str = "00:00:00";

/// Duration used when the user leaves the duration field empty.
pub const DEFAULT_TRIM_DURATION: &str = "10";

/// One user-triggered action.
///
/// Requests are built fresh per trigger and consumed immediately by
/// [`crate::dispatcher::Dispatcher::run`]; nothing keeps them around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// Cut `duration` starting at `start`. Both are passed through to the engine uninterpreted.
    Trim { start: String, duration: String },

    /// Extract (from video) or convert (from audio) the audio track to `target`.
    ExtractOrConvert { target: AudioCodec },
}

impl OperationRequest {
    /// Build a trim request, filling empty fields with their defaults.
    pub fn trim(start: impl AsRef<str>, duration: impl AsRef<str>) -> Self {
        Self::Trim {
            start: or_default(start.as_ref(), DEFAULT_TRIM_START),
            duration: or_default(duration.as_ref(), DEFAULT_TRIM_DURATION),
        }
    }

    pub fn extract_or_convert(target: AudioCodec) -> Self {
        Self::ExtractOrConvert { target }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Trim { .. } => "trim",
            Self::ExtractOrConvert { .. } => "extract_or_convert",
        }
    }
}

fn or_default(value: &str, default: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        default.to_owned()
    } else {
        trimmed.to_owned()
    }
}
