use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mediacut::{
    AudioCodec, Dispatcher, EncodingOpts, MediaKind, OperationRequest, SelectedInput, Session,
    SourceLocation, Status, StatusSink,
};

fn main() -> Result<()> {
    mediacut::init_logging();
    let params = Params::parse();

    let opts = match &params.common.config {
        Some(path) => EncodingOpts::from_json_file(path)?,
        None => EncodingOpts::default(),
    };

    let candidates = params
        .common
        .engines
        .iter()
        .map(|raw| SourceLocation::parse(raw))
        .collect();

    let loader = mediacut::EngineLoader::new(mediacut::FfmpegProvider::new(), candidates)?;
    let mut dispatcher = Dispatcher::new(loader, opts, BarStatus::new());

    let (input, request) = match &params.command {
        Command::Trim {
            input,
            start,
            duration,
        } => (input, OperationRequest::trim(start, duration)),
        Command::Convert { input, target } => (input, OperationRequest::extract_or_convert(*target)),
    };

    let mut session = Session::new();
    let selected = select_input(input, params.common.kind)?;
    let status = session.select(selected);
    dispatcher.status_sink_mut().on_status(&status);

    let result = dispatcher.run(&mut session, &request);
    dispatcher.status_sink_mut().finish();

    let artifact = result?;
    let path = artifact.write_into(&params.common.out_dir)?;
    println!("{} ({})", path.display(), artifact.mime);
    Ok(())
}

#[derive(Parser, Debug)]
#[command(name = "mediacut")]
#[command(about = "Trim media or extract its audio using ffmpeg")]
struct Params {
    #[command(flatten)]
    common: CommonArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// Engine source candidates, highest priority first (path, command name, or URL).
    #[arg(short = 'e', long = "engine", num_args = 1.., default_values_t = vec!["ffmpeg".to_string()], global = true)]
    engines: Vec<String>,

    /// Directory the result is written into.
    #[arg(short = 'o', long = "out-dir", default_value = ".", global = true)]
    out_dir: PathBuf,

    /// JSON file overriding encoder defaults.
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Treat the input as this kind instead of detecting it.
    #[arg(short = 'k', long = "kind", value_enum, global = true)]
    kind: Option<MediaKind>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Cut a section out of a video or audio file.
    Trim {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Start offset passed to the engine (e.g. `00:00:05` or `5`).
        #[arg(short = 's', long = "start", default_value = "")]
        start: String,

        /// Duration passed to the engine (e.g. `3` or `00:00:03`).
        #[arg(short = 'd', long = "duration", default_value = "")]
        duration: String,
    },

    /// Extract (from video) or convert (from audio) the audio track.
    Convert {
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        #[arg(short = 't', long = "target", value_enum, default_value_t = AudioCodec::Mp3)]
        target: AudioCodec,
    },
}

fn select_input(path: &Path, kind: Option<MediaKind>) -> Result<SelectedInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .context("input path has no usable file name")?
        .to_owned();

    Ok(match kind {
        Some(kind) => SelectedInput::new(bytes, file_name, kind),
        None => SelectedInput::detect(bytes, file_name, None),
    })
}

/// Renders status lines and progress on stderr.
struct BarStatus {
    bar: ProgressBar,
}

impl BarStatus {
    fn new() -> Self {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {percent:>3}% {msg}") {
            bar.set_style(style.progress_chars("#>-"));
        }
        Self { bar }
    }

    fn finish(&mut self) {
        self.bar.finish();
    }
}

impl StatusSink for BarStatus {
    fn on_status(&mut self, status: &Status) {
        self.bar.set_message(status.to_string());
    }

    fn on_progress(&mut self, ratio: f32) {
        self.bar.set_position((ratio * 100.0).round() as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_defaults_to_empty_fields_and_ffmpeg_engine() {
        let params = Params::try_parse_from(["mediacut", "trim", "-i", "clip.mov"])
            .expect("parse trim params");
        assert_eq!(params.common.engines, vec!["ffmpeg"]);
        match params.command {
            Command::Trim { start, duration, .. } => {
                assert!(start.is_empty());
                assert!(duration.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn convert_parses_target_and_engine_candidates() {
        let params = Params::try_parse_from([
            "mediacut",
            "convert",
            "-i",
            "voice.wav",
            "--target",
            "aac",
            "--engine",
            "/opt/ffmpeg/bin/ffmpeg",
            "ffmpeg",
        ])
        .expect("parse convert params");
        assert_eq!(params.common.engines, vec!["/opt/ffmpeg/bin/ffmpeg", "ffmpeg"]);
        assert!(matches!(
            params.command,
            Command::Convert {
                target: AudioCodec::Aac,
                ..
            }
        ));
    }

    #[test]
    fn convert_rejects_unknown_target() {
        let res = Params::try_parse_from(["mediacut", "convert", "-i", "a.wav", "--target", "flac"]);
        assert!(res.is_err());
    }

    #[test]
    fn select_input_honours_kind_override() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("clip.mov");
        std::fs::write(&path, b"not really a movie")?;

        let selected = select_input(&path, Some(MediaKind::Audio))?;
        assert_eq!(selected.kind, MediaKind::Audio);
        assert_eq!(selected.file_name, "clip.mov");

        let detected = select_input(&path, None)?;
        assert_eq!(detected.kind, MediaKind::Video);
        Ok(())
    }
}
