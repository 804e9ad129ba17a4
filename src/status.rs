use std::fmt;

/// User-visible status line transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    WaitingForFile,
    Selected { file_name: String, size_bytes: usize },
    Loading,
    Preparing,
    Cutting,
    Converting,
    Extracting,
    Done,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingForFile => f.write_str("Waiting for file…"),
            Self::Selected {
                file_name,
                size_bytes,
            } => {
                let mb = (*size_bytes as f64 / (1024.0 * 1024.0)).round();
                write!(f, "Selected: {file_name} ({mb} MB)")
            }
            Self::Loading => f.write_str("Loading…"),
            Self::Preparing => f.write_str("Preparing file…"),
            Self::Cutting => f.write_str("Cutting…"),
            Self::Converting => f.write_str("Converting…"),
            Self::Extracting => f.write_str("Extracting…"),
            Self::Done => f.write_str("Done."),
            Self::Error(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Receives status and progress updates from the dispatcher.
pub trait StatusSink {
    fn on_status(&mut self, status: &Status);

    /// Completion ratio, already clamped to `[0, 1]`.
    fn on_progress(&mut self, ratio: f32);
}

/// Discards every update.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStatus;

impl StatusSink for NoopStatus {
    fn on_status(&mut self, _status: &Status) {}

    fn on_progress(&mut self, _ratio: f32) {}
}

/// Logs status transitions through `tracing`. Progress is logged at `trace`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn on_status(&mut self, status: &Status) {
        match status {
            Status::Error(_) => tracing::error!(status = %status, "status"),
            _ => tracing::info!(status = %status, "status"),
        }
    }

    fn on_progress(&mut self, ratio: f32) {
        tracing::trace!(ratio, "progress");
    }
}

impl<S: StatusSink + ?Sized> StatusSink for &mut S {
    fn on_status(&mut self, status: &Status) {
        (**self).on_status(status);
    }

    fn on_progress(&mut self, ratio: f32) {
        (**self).on_progress(ratio);
    }
}

impl<S: StatusSink + ?Sized> StatusSink for Box<S> {
    fn on_status(&mut self, status: &Status) {
        (**self).on_status(status);
    }

    fn on_progress(&mut self, ratio: f32) {
        (**self).on_progress(ratio);
    }
}

/// Clamp a raw ratio into `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp_ratio(ratio: f32) -> f32 {
    if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_lines_render_as_shown_to_users() {
        assert_eq!(Status::WaitingForFile.to_string(), "Waiting for file…");
        assert_eq!(Status::Preparing.to_string(), "Preparing file…");
        assert_eq!(Status::Done.to_string(), "Done.");
        assert_eq!(
            Status::Error("boom".into()).to_string(),
            "Error: boom"
        );
        assert_eq!(
            Status::Selected {
                file_name: "clip.mov".into(),
                size_bytes: 3 * 1024 * 1024,
            }
            .to_string(),
            "Selected: clip.mov (3 MB)"
        );
    }

    #[test]
    fn clamp_ratio_bounds() {
        assert_eq!(clamp_ratio(-0.5), 0.0);
        assert_eq!(clamp_ratio(1.5), 1.0);
        assert_eq!(clamp_ratio(f32::NAN), 0.0);
        assert_eq!(clamp_ratio(0.25), 0.25);
    }
}
