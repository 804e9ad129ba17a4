//! Engine loading with fallback across source candidates.
//!
//! State machine:
//!
//! ```text
//! NotLoaded ──▶ Loading ──▶ Ready
//!                  │
//!                  └──────▶ Failed ──(next ensure_ready)──▶ Loading
//! ```
//!
//! `Failed` is terminal for one attempt only: the next call to [`EngineLoader::ensure_ready`]
//! starts a fresh pass over the candidates. Once `Ready`, the handle is reused for the rest of
//! the loader's life unless [`EngineLoader::reset`] drops it.

use tracing::{info, warn};

use crate::candidates::first_success;
use crate::engine::{Engine, EngineProvider, SourceLocation};
use crate::{Error, Result};

/// Last known engine readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    NotLoaded,
    Loading,
    Ready,
    Failed,
}

/// Owns the engine handle and the prioritized list of places to load it from.
pub struct EngineLoader<P: EngineProvider> {
    provider: P,
    candidates: Vec<SourceLocation>,
    state: Readiness,
    engine: Option<P::Engine>,
    loaded_from: Option<SourceLocation>,
}

impl<P: EngineProvider> EngineLoader<P> {
    /// Create a loader over `candidates`, highest priority first.
    ///
    /// Fails fast on an empty candidate list so misconfiguration surfaces at startup rather than
    /// on the first user action.
    pub fn new(provider: P, candidates: Vec<SourceLocation>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::msg("at least one engine source candidate is required"));
        }
        Ok(Self {
            provider,
            candidates,
            state: Readiness::NotLoaded,
            engine: None,
            loaded_from: None,
        })
    }

    pub fn readiness(&self) -> Readiness {
        self.state
    }

    pub fn candidates(&self) -> &[SourceLocation] {
        &self.candidates
    }

    /// The candidate the current handle was loaded from.
    pub fn loaded_from(&self) -> Option<&SourceLocation> {
        self.loaded_from.as_ref()
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Return the loaded engine, loading it first if needed.
    ///
    /// Calling this while already `Ready` performs no provider interaction.
    pub fn ensure_ready(&mut self) -> Result<&mut P::Engine> {
        let stale = self.engine.as_ref().is_some_and(|engine| !engine.is_ready());
        if stale {
            warn!("engine handle reports not ready; reloading");
            self.reset();
        }

        if self.engine.is_none() {
            self.load()?;
        }

        self.engine
            .as_mut()
            .ok_or_else(|| Error::msg("engine handle missing after successful load"))
    }

    /// Drop the current handle. The next `ensure_ready` loads again.
    pub fn reset(&mut self) {
        self.engine = None;
        self.loaded_from = None;
        self.state = Readiness::NotLoaded;
    }

    fn load(&mut self) -> Result<()> {
        self.state = Readiness::Loading;

        let provider = &mut self.provider;
        let res = first_success(
            self.candidates.iter(),
            |source| provider.initialize(source),
            |index, source, err| {
                warn!(index, source = %source, error = %err, "engine source candidate failed");
            },
        );

        match res {
            Ok((index, engine)) => {
                let source = self.candidates[index].clone();
                info!(index, source = %source, "engine ready");
                self.engine = Some(engine);
                self.loaded_from = Some(source);
                self.state = Readiness::Ready;
                Ok(())
            }
            Err(errors) => {
                self.state = Readiness::Failed;
                let attempts = self
                    .candidates
                    .iter()
                    .zip(errors)
                    .map(|(source, err)| format!("{source}: {err}"))
                    .collect();
                Err(Error::EngineUnavailable { attempts })
            }
        }
    }
}
