use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use shared::{
    catalog::OptionCatalog,
    domain::{ArtifactRef, SubmissionState},
    validation::{validate, DraftRequest},
};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub mod error;
pub mod refresh;
pub mod result_store;
pub mod transport;

pub use error::{FailurePolicy, SubmitError, TransportError};
pub use refresh::{HttpRefresh, NoopRefresh, RefreshHandle};
pub use result_store::ResultStore;
pub use transport::{GenerationTransport, HttpGenerationTransport, MissingGenerationTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The response was applied; holds the artifacts now in the result store.
    Completed(Vec<ArtifactRef>),
    /// Another submission was in flight, nothing was dispatched.
    Busy,
    /// The request failed and the failure policy is `Silent`.
    FailureAbsorbed,
    /// The response arrived after the controller moved on and was dropped.
    Stale,
}

#[derive(Debug, Clone)]
pub enum SubmissionEvent {
    StateChanged(SubmissionState),
    ResultsChanged(Vec<ArtifactRef>),
    Failed {
        generation: u64,
        error: TransportError,
    },
}

#[derive(Default)]
struct ControllerState {
    state: SubmissionState,
    results: ResultStore,
    latest_generation: u64,
    last_failure: Option<TransportError>,
}

/// Puts the controller back to `Idle` if a `submit` future is dropped while
/// its request is in flight.
struct InFlight<'a> {
    controller: &'a SubmissionController,
    generation: u64,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        {
            let mut inner = self.controller.lock_inner();
            if !inner.state.is_submitting() {
                return;
            }
            inner.state = SubmissionState::Idle;
        }
        warn!(
            generation = self.generation,
            "submission dropped before the response arrived"
        );
        self.controller
            .emit(SubmissionEvent::StateChanged(SubmissionState::Idle));

        // Drop cannot await; hand the refresh to the runtime when there is one.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let refresher = Arc::clone(&self.controller.refresher);
            let generation = self.generation;
            handle.spawn(async move {
                if let Err(err) = refresher.refresh().await {
                    warn!(generation, "refresh after dropped submission failed: {err:#}");
                }
            });
        }
    }
}

/// Drives one draft at a time through validation, dispatch and completion.
///
/// The controller owns the submission state and the result store. Renderers
/// read snapshots through the accessors or follow [`SubmissionEvent`]s from
/// [`SubmissionController::subscribe_events`].
pub struct SubmissionController {
    catalog: OptionCatalog,
    transport: Arc<dyn GenerationTransport>,
    refresher: Arc<dyn RefreshHandle>,
    policy: FailurePolicy,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<SubmissionEvent>,
}

impl SubmissionController {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self::new_with_dependencies(
            OptionCatalog::standard(),
            transport,
            Arc::new(NoopRefresh),
            FailurePolicy::default(),
        )
    }

    pub fn new_with_dependencies(
        catalog: OptionCatalog,
        transport: Arc<dyn GenerationTransport>,
        refresher: Arc<dyn RefreshHandle>,
        policy: FailurePolicy,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            catalog,
            transport,
            refresher,
            policy,
            inner: Mutex::new(ControllerState::default()),
            events,
        }
    }

    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn state(&self) -> SubmissionState {
        self.lock_inner().state
    }

    pub fn results(&self) -> Vec<ArtifactRef> {
        self.lock_inner().results.current().to_vec()
    }

    pub fn last_failure(&self) -> Option<TransportError> {
        self.lock_inner().last_failure.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SubmissionEvent> {
        self.events.subscribe()
    }

    /// Validates `draft` and, if it passes, runs one generation request to
    /// completion.
    ///
    /// Field errors are attached to the draft and returned. On success the
    /// draft is reset to the catalog defaults. A call made while another
    /// submission is in flight returns [`SubmitOutcome::Busy`] without touching
    /// anything.
    pub async fn submit(&self, draft: &mut DraftRequest) -> Result<SubmitOutcome, SubmitError> {
        let (request, generation) = {
            let mut inner = self.lock_inner();
            if inner.state.is_submitting() {
                debug!(
                    generation = inner.latest_generation,
                    "submission already in flight; ignoring submit"
                );
                return Ok(SubmitOutcome::Busy);
            }

            let request = match validate(draft, &self.catalog) {
                Ok(request) => request,
                Err(errors) => {
                    debug!(errors = errors.len(), "draft rejected by validation");
                    draft.set_errors(errors.clone());
                    return Err(SubmitError::Invalid(errors.into()));
                }
            };
            draft.clear_errors();

            // Cleared before dispatch so a pending request never shows stale results.
            inner.results.clear();
            inner.state = SubmissionState::Submitting;
            inner.latest_generation += 1;
            (request, inner.latest_generation)
        };
        self.emit(SubmissionEvent::ResultsChanged(Vec::new()));
        self.emit(SubmissionEvent::StateChanged(SubmissionState::Submitting));

        let in_flight = InFlight {
            controller: self,
            generation,
            settled: false,
        };

        info!(
            generation,
            amount = self.catalog.amount_label(request.amount()),
            resolution = self.catalog.resolution_label(request.resolution()),
            "dispatching image generation request"
        );
        let response = self.transport.generate(&request).await;
        let outcome = self.complete(generation, response, draft);
        in_flight.settle();

        if let Err(err) = self.refresher.refresh().await {
            warn!(generation, "refresh after submission failed: {err:#}");
        }

        outcome
    }

    /// Drops the current results and forgets the last failure. A request
    /// still in flight keeps the controller in `Submitting` until it returns,
    /// and its response is then discarded.
    pub fn reset(&self) {
        {
            let mut inner = self.lock_inner();
            inner.latest_generation += 1;
            inner.results.clear();
            inner.last_failure = None;
        }
        self.emit(SubmissionEvent::ResultsChanged(Vec::new()));
    }

    fn complete(
        &self,
        generation: u64,
        response: Result<Vec<ArtifactRef>, TransportError>,
        draft: &mut DraftRequest,
    ) -> Result<SubmitOutcome, SubmitError> {
        let mut inner = self.lock_inner();
        if generation != inner.latest_generation {
            debug!(
                generation,
                latest = inner.latest_generation,
                stale_error = response.is_err(),
                "discarding stale generation response"
            );
            inner.state = SubmissionState::Idle;
            drop(inner);
            self.emit(SubmissionEvent::StateChanged(SubmissionState::Idle));
            return Ok(SubmitOutcome::Stale);
        }

        match response {
            Ok(artifacts) => {
                inner.results.replace(artifacts.iter().cloned());
                inner.state = SubmissionState::Idle;
                inner.last_failure = None;
                drop(inner);

                draft.reset(&self.catalog);
                info!(
                    generation,
                    artifacts = artifacts.len(),
                    "image generation completed"
                );
                self.emit(SubmissionEvent::ResultsChanged(artifacts.clone()));
                self.emit(SubmissionEvent::StateChanged(SubmissionState::Idle));
                Ok(SubmitOutcome::Completed(artifacts))
            }
            Err(error) => {
                // TODO: open the Pro upgrade prompt when error.is_quota_exhausted().
                warn!(
                    generation,
                    quota_exhausted = error.is_quota_exhausted(),
                    "image generation failed: {error}"
                );
                inner.state = SubmissionState::Failed;
                self.emit(SubmissionEvent::StateChanged(SubmissionState::Failed));
                self.emit(SubmissionEvent::Failed {
                    generation,
                    error: error.clone(),
                });

                inner.last_failure = Some(error.clone());
                inner.state = SubmissionState::Idle;
                drop(inner);
                self.emit(SubmissionEvent::StateChanged(SubmissionState::Idle));

                match self.policy {
                    FailurePolicy::Silent => Ok(SubmitOutcome::FailureAbsorbed),
                    FailurePolicy::Surface => Err(SubmitError::Transport(error)),
                }
            }
        }
    }

    fn lock_inner(&self) -> MutexGuard<'_, ControllerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SubmissionEvent) {
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
