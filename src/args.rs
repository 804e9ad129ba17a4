//! Argument tables for the two operations.
//!
//! Every table is an exhaustive `match` over [`MediaKind`] (and [`AudioCodec`] for
//! extract/convert) with no wildcard arms, so adding a kind or a codec fails the build until
//! its row is written.

use crate::audio_codec::AudioCodec;
use crate::engine::Invocation;
use crate::media_kind::MediaKind;
use crate::opts::EncodingOpts;

/// Engine-side base name of trim output.
pub const TRIM_OUTPUT_BASE: &str = "output";

/// Suggested download base name of trim output.
pub const TRIM_ARTIFACT_BASE: &str = "cut";

/// The flag that drops the video stream.
pub const SUPPRESS_VIDEO: &str = "-vn";

/// A fully planned engine run: what to execute and how to label what comes out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub invocation: Invocation,
    /// Suggested file name for the produced artifact.
    pub artifact_name: String,
    pub mime: &'static str,
}

/// Plan a trim of `staged` from `start` for `duration`.
///
/// Audio is always re-encoded to mp3; video is re-encoded to mp4 flagged for fast start.
pub fn trim_plan(
    kind: MediaKind,
    staged: &str,
    start: &str,
    duration: &str,
    opts: &EncodingOpts,
) -> Plan {
    let mut args: Vec<String> = vec![
        "-ss".into(),
        start.into(),
        "-t".into(),
        duration.into(),
        "-i".into(),
        staged.into(),
    ];

    let (ext, mime) = match kind {
        MediaKind::Audio => {
            args.extend(["-c:a", "libmp3lame"].map(String::from));
            args.extend(["-q:a".into(), opts.mp3_quality.clone()]);
            ("mp3", "audio/mpeg")
        }
        MediaKind::Video => {
            args.extend(["-c:v".into(), opts.video_codec.clone()]);
            args.extend(["-preset".into(), opts.video_preset.clone()]);
            args.extend(["-c:a".into(), opts.trim_audio_codec.clone()]);
            if opts.fast_start {
                args.extend(["-movflags", "faststart"].map(String::from));
            }
            ("mp4", "video/mp4")
        }
    };

    Plan {
        invocation: Invocation::new(args, format!("{TRIM_OUTPUT_BASE}.{ext}")),
        artifact_name: format!("{TRIM_ARTIFACT_BASE}.{ext}"),
        mime,
    }
}

/// Plan an audio extraction (video source) or conversion (audio source) of `staged` to
/// `target`.
pub fn extract_plan(
    kind: MediaKind,
    target: AudioCodec,
    staged: &str,
    opts: &EncodingOpts,
) -> Plan {
    let mut args: Vec<String> = vec!["-i".into(), staged.into()];

    match kind {
        MediaKind::Video => args.push(SUPPRESS_VIDEO.into()),
        MediaKind::Audio => {}
    }

    match target {
        AudioCodec::Mp3 => args.extend([
            "-acodec".into(),
            "libmp3lame".into(),
            "-q:a".into(),
            opts.mp3_quality.clone(),
        ]),
        AudioCodec::Wav => args.extend([
            "-acodec".into(),
            "pcm_s16le".into(),
            "-ar".into(),
            opts.wav_sample_rate.to_string(),
            "-ac".into(),
            opts.wav_channels.to_string(),
        ]),
        AudioCodec::Aac => args.extend([
            "-acodec".into(),
            "aac".into(),
            "-b:a".into(),
            opts.aac_bitrate.clone(),
        ]),
    }

    let output = target.output_name();
    Plan {
        invocation: Invocation::new(args, output.clone()),
        artifact_name: output,
        mime: target.mime(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MediaKind; 2] = [MediaKind::Video, MediaKind::Audio];

    #[test]
    fn every_extract_pair_has_exactly_one_output_token() {
        let opts = EncodingOpts::default();
        for kind in KINDS {
            for codec in AudioCodec::ALL {
                let plan = extract_plan(kind, codec, "input.bin", &opts);
                let expected = format!("audio.{}", codec.extension());
                let args = plan.invocation.args();

                assert!(args.len() > 2, "{kind:?}/{codec:?} produced too few args");
                assert_eq!(args.iter().filter(|a| **a == expected).count(), 1);
                assert_eq!(plan.invocation.output_name(), expected);
                assert_eq!(plan.invocation.input_name(), Some("input.bin"));
                assert_eq!(plan.artifact_name, expected);
                assert_eq!(plan.mime, codec.mime());
            }
        }
    }

    #[test]
    fn suppress_video_only_for_video_sources() {
        let opts = EncodingOpts::default();
        for codec in AudioCodec::ALL {
            let video = extract_plan(MediaKind::Video, codec, "input.mov", &opts);
            let audio = extract_plan(MediaKind::Audio, codec, "input.wav", &opts);
            assert!(video.invocation.contains(SUPPRESS_VIDEO));
            assert!(!audio.invocation.contains(SUPPRESS_VIDEO));
        }
    }

    #[test]
    fn extract_encoder_rows_use_configured_values() {
        let opts = EncodingOpts::default();

        let mp3 = extract_plan(MediaKind::Video, AudioCodec::Mp3, "input.mp4", &opts);
        assert_eq!(
            mp3.invocation.args(),
            ["-i", "input.mp4", "-vn", "-acodec", "libmp3lame", "-q:a", "0", "audio.mp3"]
        );

        let wav = extract_plan(MediaKind::Video, AudioCodec::Wav, "input.mp4", &opts);
        assert_eq!(
            wav.invocation.args(),
            [
                "-i", "input.mp4", "-vn", "-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2",
                "audio.wav"
            ]
        );

        let aac = extract_plan(MediaKind::Audio, AudioCodec::Aac, "input.wav", &opts);
        assert_eq!(
            aac.invocation.args(),
            ["-i", "input.wav", "-acodec", "aac", "-b:a", "192k", "audio.aac"]
        );
    }

    #[test]
    fn video_trim_reencodes_to_fast_start_mp4() {
        let plan = trim_plan(
            MediaKind::Video,
            "input.mov",
            "00:00:05",
            "3",
            &EncodingOpts::default(),
        );
        assert_eq!(
            plan.invocation.args(),
            [
                "-ss", "00:00:05", "-t", "3", "-i", "input.mov", "-c:v", "libx264", "-preset",
                "veryfast", "-c:a", "aac", "-movflags", "faststart", "output.mp4"
            ]
        );
        assert_eq!(plan.artifact_name, "cut.mp4");
        assert_eq!(plan.mime, "video/mp4");
    }

    #[test]
    fn audio_trim_always_yields_mp3() {
        let plan = trim_plan(
            MediaKind::Audio,
            "input.flac",
            "00:00:00",
            "10",
            &EncodingOpts::default(),
        );
        assert_eq!(plan.invocation.output_name(), "output.mp3");
        assert_eq!(plan.artifact_name, "cut.mp3");
        assert_eq!(plan.mime, "audio/mpeg");
        assert!(!plan.invocation.contains(SUPPRESS_VIDEO));
        assert_eq!(plan.invocation.flag_value("-c:a"), Some("libmp3lame"));
    }

    #[test]
    fn fast_start_can_be_disabled() {
        let opts = EncodingOpts {
            fast_start: false,
            ..EncodingOpts::default()
        };
        let plan = trim_plan(MediaKind::Video, "input.mp4", "1", "2", &opts);
        assert!(!plan.invocation.contains("-movflags"));
        assert_eq!(plan.invocation.output_name(), "output.mp4");
    }
}
