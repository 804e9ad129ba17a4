//! Progress estimation from ffmpeg's stderr.
//!
//! ffmpeg reports the input length once (`Duration: 00:01:02.50, start: ...`) and then keeps
//! rewriting a stats line (`frame=.. time=00:00:12.34 bitrate=..`) separated by `\r`. We turn
//! that into a completion ratio in `[0, 1]`.

use std::io::{self, Read};

/// Tracks how far an invocation has progressed.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    /// Output length cap from `-t`, in seconds.
    cap: Option<f64>,

    /// Input seek offset from `-ss`, in seconds.
    offset: Option<f64>,

    /// Input length from the `Duration:` banner line, in seconds.
    input_duration: Option<f64>,

    last_ratio: f32,
}

impl ProgressTracker {
    pub fn new(cap: Option<f64>, offset: Option<f64>) -> Self {
        Self {
            cap,
            offset,
            input_duration: None,
            last_ratio: 0.0,
        }
    }

    /// Expected output length in seconds, if known.
    pub fn expected_seconds(&self) -> Option<f64> {
        let remaining = self
            .input_duration
            .map(|d| (d - self.offset.unwrap_or(0.0)).max(0.0));

        match (remaining, self.cap) {
            (Some(r), Some(c)) => Some(r.min(c)),
            (Some(r), None) => Some(r),
            (None, Some(c)) => Some(c),
            (None, None) => None,
        }
    }

    /// Feed one stderr line. Returns a new ratio when the line advanced progress.
    pub fn on_line(&mut self, line: &str) -> Option<f32> {
        if self.input_duration.is_none() {
            if let Some(raw) = field_after(line, "Duration:") {
                self.input_duration = parse_timestamp(raw);
                return None;
            }
        }

        let elapsed = parse_timestamp(field_after(line, "time=")?)?;
        let total = self.expected_seconds().filter(|t| *t > 0.0)?;
        let ratio = ((elapsed / total) as f32).clamp(0.0, 1.0);

        // Ratios never move backwards (ffmpeg can emit a lower time while flushing).
        if ratio > self.last_ratio {
            self.last_ratio = ratio;
            Some(ratio)
        } else {
            None
        }
    }
}

/// The token that follows `key` on `line`, up to the next whitespace or comma.
fn field_after<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    let idx = line.find(key)?;
    let rest = line[idx + key.len()..].trim_start();
    let end = rest
        .find(|c: char| c.is_whitespace() || c == ',')
        .unwrap_or(rest.len());
    let token = &rest[..end];
    (!token.is_empty()).then_some(token)
}

/// Parse `HH:MM:SS(.frac)`, `MM:SS(.frac)` or plain seconds. `N/A` and negatives yield `None`.
pub fn parse_timestamp(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('-') {
        return None;
    }

    let mut seconds = 0.0;
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() > 3 {
        return None;
    }

    for part in &parts {
        let value: f64 = part.parse().ok()?;
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        seconds = seconds * 60.0 + value;
    }

    Some(seconds)
}

/// Split a byte stream into lines on either `\n` or `\r`, skipping empty lines.
pub fn for_each_line<R: Read>(mut reader: R, mut on_line: impl FnMut(&str)) -> io::Result<()> {
    let mut buf = [0u8; 8 * 1024];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                emit(&mut pending, &mut on_line);
            } else {
                pending.push(byte);
            }
        }
    }

    emit(&mut pending, &mut on_line);
    Ok(())
}

fn emit(pending: &mut Vec<u8>, on_line: &mut impl FnMut(&str)) {
    if pending.is_empty() {
        return;
    }
    let line = String::from_utf8_lossy(pending);
    let line = line.trim_end();
    if !line.is_empty() {
        on_line(line);
    }
    pending.clear();
}
