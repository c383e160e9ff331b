//! Gallery view controller
//!
//! Drives one fetch cycle per activation: the view enters `Loading`, asks its
//! [`ImageSource`] for URLs and settles in `Ready`, `Empty` or `Error`. Starting
//! a new cycle cancels the previous one, and a cycle that is no longer current
//! never writes its result.

mod state;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use state::{ViewState, LOAD_FAILED_MESSAGE, UNKNOWN_ERROR_MESSAGE};

use crate::image_source::{fetch_catching_panics, ImageSource};

/// Handle on the cycle currently allowed to write the view state
#[derive(Debug)]
struct Cycle {
    generation: u64,
    token: CancellationToken,
}

/// Owns the view state of one mounted gallery view
pub struct ViewController {
    source: Arc<dyn ImageSource>,
    state: watch::Sender<ViewState>,
    current: Mutex<Option<Cycle>>,
    generation: AtomicU64,
}

impl ViewController {
    /// Mounts a view over `source`; the view starts out `Loading`
    #[must_use]
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        let (state, _) = watch::channel(ViewState::Loading);
        Self {
            source,
            state,
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current view state
    #[must_use]
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state transition
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Runs one fetch cycle to completion and returns the state it leaves the view in
    ///
    /// If a newer cycle starts while this one is in flight, this one is
    /// cancelled and the newer cycle's state is returned instead.
    pub async fn activate(&self) -> ViewState {
        let cycle = self.begin_cycle();
        self.run_cycle(cycle).await
    }

    /// Starts a fetch cycle in the background
    ///
    /// The view is `Loading` by the time this returns. The handle resolves to
    /// the state the cycle leaves the view in.
    pub fn spawn_activation(self: &Arc<Self>) -> JoinHandle<ViewState> {
        let cycle = self.begin_cycle();
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run_cycle(cycle).await })
    }

    /// Cancels the in-flight cycle, if any; its result will be discarded
    pub fn deactivate(&self) {
        if let Some(cycle) = self.lock_current().take() {
            debug!(generation = cycle.generation, "Cancelling in-flight cycle");
            cycle.token.cancel();
        }
    }

    /// Waits until the view leaves `Loading` and returns that state
    ///
    /// Never resolves if no cycle is running and the view is still `Loading`.
    pub async fn settled(&self) -> ViewState {
        let mut receiver = self.subscribe();
        let settled = match receiver.wait_for(|state| !state.is_loading()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Cycle>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin_cycle(&self) -> (u64, CancellationToken) {
        let mut current = self.lock_current();

        if let Some(previous) = current.take() {
            debug!(generation = previous.generation, "Superseding in-flight cycle");
            previous.token.cancel();
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        *current = Some(Cycle {
            generation,
            token: token.clone(),
        });
        self.state.send_replace(ViewState::Loading);

        debug!(generation, "Started fetch cycle");
        (generation, token)
    }

    async fn run_cycle(&self, (generation, token): (u64, CancellationToken)) -> ViewState {
        let result = tokio::select! {
            () = token.cancelled() => {
                debug!(generation, "Fetch cycle cancelled");
                return self.state();
            }
            result = fetch_catching_panics(self.source.as_ref()) => result,
        };

        let next = ViewState::from_fetch_result(result);

        if self.finish_cycle(generation, next.clone()) {
            info!(generation, state = state_name(&next), "Fetch cycle settled");
            next
        } else {
            debug!(generation, "Discarding result of stale cycle");
            self.state()
        }
    }

    /// Publishes `next` if `generation` is still the current cycle
    fn finish_cycle(&self, generation: u64, next: ViewState) -> bool {
        let mut current = self.lock_current();

        match current.as_ref() {
            Some(cycle) if cycle.generation == generation => {
                *current = None;
                self.state.send_replace(next);
                true
            }
            _ => false,
        }
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        let current = self
            .current
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(cycle) = current.take() {
            cycle.token.cancel();
        }
    }
}

const fn state_name(state: &ViewState) -> &'static str {
    match state {
        ViewState::Loading => "loading",
        ViewState::Ready(_) => "ready",
        ViewState::Empty => "empty",
        ViewState::Error(_) => "error",
    }
}
