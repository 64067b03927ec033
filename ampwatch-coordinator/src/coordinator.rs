//! Workload coordinator
//!
//! Owns the lifecycle of one diagnostic workload: creates it on the executor,
//! launches the step loop and the status poller, and folds their reports into
//! a single observable [`WorkloadState`].
//!
//! The state has exactly one writer, the update processor task spawned by
//! [`WorkloadCoordinator::start`]. It drains the update channel, applies each
//! event through [`merge::apply`], and publishes the result on a `watch`
//! channel. Readers (`observe`, `subscribe`) never block on the network.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ampwatch_client::{ExecutorClient, WorkloadClient};
use ampwatch_core::domain::workload::{WorkloadHandle, WorkloadState, WorkloadStatus};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::CoordinatorConfig;
use crate::error::{Result, WorkloadError};
use crate::events::WorkloadEvent;
use crate::merge;
use crate::runtime::{StatusPoller, StepLoop, call_with_timeout};

/// Capacity of the loop-to-coordinator update channel
const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// Everything that belongs to the workload currently being driven
///
/// Registered as soon as `start()` begins, before the executor has assigned
/// an id, so that `cancel()` can reach a start that is still in flight.
struct ActiveRun {
    cancel: CancellationToken,
    /// `None` while the start call is outstanding
    launched: Option<Launched>,
}

struct Launched {
    handle: WorkloadHandle,
    processor: JoinHandle<()>,
}

impl ActiveRun {
    fn starting(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            launched: None,
        }
    }
}

/// Drives a single diagnostic workload and exposes its merged state
pub struct WorkloadCoordinator {
    client: Arc<dyn WorkloadClient>,
    config: CoordinatorConfig,
    state: Arc<watch::Sender<WorkloadState>>,
    in_flight: Arc<AtomicBool>,
    active: Mutex<Option<ActiveRun>>,
}

impl WorkloadCoordinator {
    /// Creates a coordinator on top of any executor client
    pub fn new(client: Arc<dyn WorkloadClient>, config: CoordinatorConfig) -> Self {
        let (state, _) = watch::channel(WorkloadState::pending());
        Self {
            client,
            config,
            state: Arc::new(state),
            in_flight: Arc::new(AtomicBool::new(false)),
            active: Mutex::new(None),
        }
    }

    /// Creates a coordinator that talks HTTP to `config.executor_url`
    pub fn with_executor(config: CoordinatorConfig) -> Self {
        let client = Arc::new(ExecutorClient::new(config.executor_url.clone()));
        Self::new(client, config)
    }

    /// Creates a workload on the executor and starts driving it
    ///
    /// Fails with [`WorkloadError::AlreadyRunning`] while a previous workload
    /// is still active, and with [`WorkloadError::Start`] when the executor
    /// does not hand back a workload id or `cancel()` is called before it
    /// does. No loops are launched on failure.
    pub async fn start(&self) -> Result<WorkloadHandle> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Rejected start: a workload is already running");
            return Err(WorkloadError::AlreadyRunning);
        }

        // The previous run, if any, has already wound down; drop its handle.
        let cancel = CancellationToken::new();
        let previous = self.lock_active().replace(ActiveRun::starting(cancel.clone()));
        if let Some(ActiveRun {
            cancel: previous_cancel,
            launched,
        }) = previous
        {
            previous_cancel.cancel();
            if let Some(launched) = launched {
                debug!(workload_id = %launched.handle.id, "Released previous workload handle");
            }
        }
        self.state.send_replace(WorkloadState::pending());

        let run_id = Uuid::new_v4();
        info!(%run_id, "Starting diagnostic workload");

        let outcome = tokio::select! {
            _ = cancel.cancelled() => return Err(self.abandon_start()),
            result = call_with_timeout(self.config.call_timeout, self.client.start_workload()) => result,
        };

        let started = match outcome {
            Ok(started) => started,
            Err(e) => return Err(self.abort_start(e.to_string())),
        };

        let Some(workload_id) = started.assigned_id() else {
            return Err(self.abort_start("executor returned no workload id".to_string()));
        };
        let handle = WorkloadHandle::new(workload_id);

        // Holding the slot makes the cancellation check and the launch atomic
        // with respect to cancel().
        let mut active = self.lock_active();
        if cancel.is_cancelled() {
            drop(active);
            return Err(self.abandon_start());
        }

        self.state.send_modify(|state| {
            state.status = WorkloadStatus::Running;
            state.current_step = started.first_step.clone();
            state.total_steps = started.total_steps;
            state.message = format!("Workload {} started", handle.id);
        });

        let span = info_span!("workload", %run_id, workload_id = %handle.id);
        let (events_tx, events_rx) = mpsc::channel(UPDATE_CHANNEL_CAPACITY);

        let step_loop = StepLoop::new(
            Arc::clone(&self.client),
            handle.clone(),
            &self.config,
            events_tx.clone(),
            cancel.clone(),
        );
        let poller = StatusPoller::new(
            Arc::clone(&self.client),
            handle.clone(),
            &self.config,
            events_tx,
            cancel.clone(),
        );

        let loops = vec![
            tokio::spawn(step_loop.run().instrument(span.clone())),
            tokio::spawn(poller.run().instrument(span.clone())),
        ];

        let processor = tokio::spawn(
            process_updates(
                events_rx,
                Arc::clone(&self.state),
                cancel.clone(),
                Arc::clone(&self.in_flight),
                loops,
            )
            .instrument(span),
        );

        *active = Some(ActiveRun {
            cancel,
            launched: Some(Launched {
                handle: handle.clone(),
                processor,
            }),
        });
        drop(active);

        info!(
            workload_id = %handle.id,
            total_steps = started.total_steps,
            first_step = ?started.first_step,
            "Workload started"
        );

        Ok(handle)
    }

    /// Stops both loops and releases the handle
    ///
    /// Local only: nothing is sent to the executor. Returns once both loops and
    /// the update processor have exited, so no update is applied afterwards.
    /// A start still waiting on the executor is abandoned and launches nothing.
    pub async fn cancel(&self) {
        let Some(run) = self.lock_active().take() else {
            return;
        };
        run.cancel.cancel();

        let Some(launched) = run.launched else {
            info!("Cancelling workload before the executor assigned an id");
            return;
        };

        info!(workload_id = %launched.handle.id, "Cancelling workload");
        if let Err(e) = launched.processor.await {
            error!("Update processor panicked: {}", e);
            self.in_flight.store(false, Ordering::Release);
        }
    }

    /// Cancels any active workload and clears the state
    pub async fn reset(&self) {
        self.cancel().await;
        self.state.send_replace(WorkloadState::pending());
    }

    /// Current merged state
    pub fn observe(&self) -> WorkloadState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified whenever the merged state changes
    pub fn subscribe(&self) -> watch::Receiver<WorkloadState> {
        self.state.subscribe()
    }

    /// Handle of the workload last started, until cancelled or reset
    pub fn handle(&self) -> Option<WorkloadHandle> {
        self.lock_active()
            .as_ref()
            .and_then(|run| run.launched.as_ref())
            .map(|launched| launched.handle.clone())
    }

    /// True from `start()` until both loops of that workload have exited
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Settings this coordinator drives its loops with
    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    fn abort_start(&self, message: String) -> WorkloadError {
        error!(error = %message, "Failed to start workload");
        let error = WorkloadError::Start(message);
        self.state.send_modify(|state| {
            state.last_error = Some(error.to_string());
        });
        self.release_start();
        error
    }

    /// Start interrupted by `cancel()`; the state is left as it was
    fn abandon_start(&self) -> WorkloadError {
        info!("Workload start cancelled, launching nothing");
        self.release_start();
        WorkloadError::Start("cancelled".to_string())
    }

    fn release_start(&self) {
        {
            let mut active = self.lock_active();
            if active.as_ref().is_some_and(|run| run.launched.is_none()) {
                *active = None;
            }
        }
        self.in_flight.store(false, Ordering::Release);
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<ActiveRun>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WorkloadCoordinator {
    fn drop(&mut self) {
        let active = self
            .active
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(run) = active {
            run.cancel.cancel();
            if let Some(launched) = run.launched {
                debug!(workload_id = %launched.handle.id, "Coordinator dropped, stopping workload");
                launched.processor.abort();
            }
        }
    }
}

/// Single writer of the workload state
///
/// Runs until every loop has dropped its sender, so the channel is only
/// closed after both loops have exited.
async fn process_updates(
    mut events: mpsc::Receiver<WorkloadEvent>,
    state: Arc<watch::Sender<WorkloadState>>,
    cancel: CancellationToken,
    in_flight: Arc<AtomicBool>,
    loops: Vec<JoinHandle<()>>,
) {
    while let Some(event) = events.recv().await {
        if cancel.is_cancelled() {
            debug!(?event, "Dropping event received after cancellation");
            continue;
        }

        let mut terminal = None;
        state.send_if_modified(|current| {
            let changed = merge::apply(current, event);
            if current.is_terminal() {
                terminal = Some(current.status);
            }
            changed
        });

        if let Some(status) = terminal {
            info!(%status, "Workload reached a terminal status, stopping loops");
            cancel.cancel();
        }
    }

    for task in loops {
        if let Err(e) = task.await {
            warn!("Workload loop panicked: {}", e);
        }
    }

    in_flight.store(false, Ordering::Release);
    debug!("Update processor finished");
}
