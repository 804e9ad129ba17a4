//! High-level API for running operations against the transcoding engine.
//!
//! [`Dispatcher`] wires up the pieces in a fixed order for every request:
//! precondition check → engine load (with fallback) → stage input → plan arguments →
//! invoke → retrieve output.
//!
//! The intent is:
//! - We load the engine once and reuse it for every later operation.
//! - Each operation reads everything it needs from an explicit [`Session`].
//! - Status and progress flow out through a [`StatusSink`] so any front end can render them.
//!
//! `run` takes `&mut self`, so at most one operation is in flight per dispatcher.

use tracing::{debug, error, info, info_span};

use crate::args::{Plan, extract_plan, trim_plan};
use crate::artifact::Artifact;
use crate::engine::{Engine, EngineEvents, EngineProvider, SourceLocation};
use crate::engines::ffmpeg::FfmpegProvider;
use crate::loader::{EngineLoader, Readiness};
use crate::media_kind::MediaKind;
use crate::opts::EncodingOpts;
use crate::request::OperationRequest;
use crate::session::{SelectedInput, Session};
use crate::status::{Status, StatusSink, TracingStatus, clamp_ratio};
use crate::{Error, Result};

/// Runs operation requests against a lazily loaded engine.
pub struct Dispatcher<P: EngineProvider, S: StatusSink = TracingStatus> {
    loader: EngineLoader<P>,
    opts: EncodingOpts,
    status: S,
}

impl Dispatcher<FfmpegProvider, TracingStatus> {
    /// Create a dispatcher backed by the `ffmpeg` executable, trying `candidates` in order.
    pub fn ffmpeg(candidates: Vec<SourceLocation>, opts: EncodingOpts) -> Result<Self> {
        let loader = EngineLoader::new(FfmpegProvider::new(), candidates)?;
        Ok(Self::new(loader, opts, TracingStatus))
    }
}

impl<P: EngineProvider, S: StatusSink> Dispatcher<P, S> {
    pub fn new(loader: EngineLoader<P>, opts: EncodingOpts, status: S) -> Self {
        Self {
            loader,
            opts,
            status,
        }
    }

    /// Run one operation for `session`.
    ///
    /// On failure nothing is returned, the produced output (if any) is removed from engine
    /// storage, and the status sink receives `Error: <message>`. Progress is set to 1 in every
    /// case so front ends can re-enable their controls.
    pub fn run(&mut self, session: &mut Session, request: &OperationRequest) -> Result<Artifact> {
        let span = info_span!("operation", op = request.name());
        let _enter = span.enter();

        let res = match (session.input(), session.staged_name()) {
            (Some(input), Some(staged)) => self.execute(input, staged, request),
            _ => Err(Error::NoFileSelected),
        };

        session.set_readiness(self.loader.readiness());
        self.status.on_progress(1.0);

        match res {
            Ok(artifact) => {
                info!(
                    file_name = %artifact.file_name,
                    mime = artifact.mime,
                    bytes = artifact.bytes.len(),
                    "operation finished"
                );
                self.status.on_status(&Status::Done);
                Ok(artifact)
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "operation failed");
                self.status.on_status(&Status::Error(err.to_string()));
                Err(err)
            }
        }
    }

    fn execute(
        &mut self,
        input: &SelectedInput,
        staged: &str,
        request: &OperationRequest,
    ) -> Result<Artifact> {
        if self.loader.readiness() != Readiness::Ready {
            self.status.on_status(&Status::Loading);
        }
        let engine = self.loader.ensure_ready()?;

        self.status.on_status(&Status::Preparing);
        engine
            .stage(staged, &input.bytes)
            .map_err(|err| Error::StageFailure {
                name: staged.to_owned(),
                reason: err.to_string(),
            })?;
        self.status.on_progress(0.0);

        let (plan, working) = plan_for(input.kind, staged, request, &self.opts);
        debug!(kind = input.kind.as_str(), args = %plan.invocation, "planned invocation");
        self.status.on_status(&working);

        let res = invoke_and_retrieve(engine, &plan, &mut self.status);

        // Release both names so no stale output outlives the operation.
        for name in [plan.invocation.output_name(), staged] {
            if let Err(err) = engine.remove(name) {
                debug!(name, error = %err, "failed to clean engine storage");
            }
        }

        let bytes = res?;
        Ok(Artifact {
            bytes,
            file_name: plan.artifact_name,
            mime: plan.mime,
        })
    }

    /// Access the engine loader.
    pub fn loader(&self) -> &EngineLoader<P> {
        &self.loader
    }

    /// Access the engine loader mutably (e.g. to `reset` it).
    pub fn loader_mut(&mut self) -> &mut EngineLoader<P> {
        &mut self.loader
    }

    pub fn opts(&self) -> &EncodingOpts {
        &self.opts
    }

    pub fn status_sink(&self) -> &S {
        &self.status
    }

    pub fn status_sink_mut(&mut self) -> &mut S {
        &mut self.status
    }
}

/// Pick the argument table row and the working status for `request`.
fn plan_for(
    kind: MediaKind,
    staged: &str,
    request: &OperationRequest,
    opts: &EncodingOpts,
) -> (Plan, Status) {
    match request {
        OperationRequest::Trim { start, duration } => (
            trim_plan(kind, staged, start, duration, opts),
            Status::Cutting,
        ),
        OperationRequest::ExtractOrConvert { target } => {
            let working = match kind {
                MediaKind::Video => Status::Extracting,
                MediaKind::Audio => Status::Converting,
            };
            (extract_plan(kind, *target, staged, opts), working)
        }
    }
}

fn invoke_and_retrieve<E: Engine, S: StatusSink>(
    engine: &mut E,
    plan: &Plan,
    status: &mut S,
) -> Result<Vec<u8>> {
    let mut events = ForwardEvents { status };
    engine
        .invoke(&plan.invocation, &mut events)
        .map_err(|err| match err {
            Error::InvocationFailure { .. } => err,
            other => Error::InvocationFailure {
                reason: other.to_string(),
            },
        })?;

    let output = plan.invocation.output_name();
    let bytes = engine
        .retrieve(output)
        .map_err(|err| Error::RetrievalFailure {
            name: output.to_owned(),
            reason: err.to_string(),
        })?;

    if bytes.is_empty() {
        return Err(Error::RetrievalFailure {
            name: output.to_owned(),
            reason: "engine produced an empty file".to_owned(),
        });
    }

    Ok(bytes)
}

/// Forwards engine callbacks to the status sink.
struct ForwardEvents<'a, S: StatusSink> {
    status: &'a mut S,
}

impl<S: StatusSink> EngineEvents for ForwardEvents<'_, S> {
    fn on_progress(&mut self, ratio: f32) {
        self.status.on_progress(clamp_ratio(ratio));
    }

    fn on_log(&mut self, line: &str) {
        tracing::trace!(target: "mediacut::engine", line);
    }
}
