//! Live telemetry poller.
//!
//! Keeps one printer selected, polls its state on a fixed interval and
//! tracks whether the data on screen is live or stale. After a bounded number
//! of consecutive polls without live data the loop suspends itself until the
//! operator retries or sends a command.
//!
//! # Sessions
//!
//! Every selection (and every retry) starts a new session identified by a
//! generation number. Poll results are applied only while their generation
//! is current, so a slow response for a printer that is no longer selected
//! never lands in the read model. A poll gate keeps at most one poll in
//! flight at a time.

mod cache;
mod commands;
mod error;
mod events;
mod state;
mod view;


pub use cache::{DeviceStatus, SnapshotCache};
pub use commands::{find_quick_command, resolve_command, QuickCommand, QUICK_COMMANDS};
pub use error::PollerError;
pub use events::PollerEvent;
pub use state::{FailureCounter, PollKind, PollOutcome, PollState};
pub use view::DashboardView;

use crate::client::{CommandAck, PrinterApi};
use crate::config::PollingConfig;
use crate::registry::{NewPrinter, Printer, PrinterId, PrinterRegistry, SelectionChange};
use crate::telemetry::TelemetrySnapshot;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Polls telemetry for the selected printer.
///
/// Dropping the poller cancels its interval task.
pub struct TelemetryPoller {
    shared: Arc<Shared>,
}

/// State shared between the poller handle and its interval task.
struct Shared {
    api: Arc<dyn PrinterApi>,
    config: PollingConfig,
    registry: PrinterRegistry,
    cache: SnapshotCache,
    /// History of the selected printer
    history: RwLock<Vec<TelemetrySnapshot>>,
    /// Never held across an await
    control: Mutex<Control>,
    /// Serialises polls; held across the fetches
    poll_gate: tokio::sync::Mutex<()>,
    loading: AtomicBool,
    events: broadcast::Sender<PollerEvent>,
}

/// Session bookkeeping guarded by `Shared::control`.
struct Control {
    generation: u64,
    phase: PollState,
    auto_refresh: bool,
    failures: FailureCounter,
    schedule: Option<Schedule>,
}

/// Handle to the running interval task.
struct Schedule {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl Control {
    fn stop_schedule(&mut self) -> Option<Schedule> {
        let schedule = self.schedule.take()?;
        schedule.cancel.cancel();
        Some(schedule)
    }
}

impl TelemetryPoller {
    /// Create a poller with nothing selected.
    pub fn new(api: Arc<dyn PrinterApi>, config: PollingConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let control = Control {
            generation: 0,
            phase: PollState::Idle,
            auto_refresh: config.auto_refresh,
            failures: FailureCounter::new(config.failure_ceiling),
            schedule: None,
        };

        Self {
            shared: Arc::new(Shared {
                api,
                config,
                registry: PrinterRegistry::new(),
                cache: SnapshotCache::new(),
                history: RwLock::new(Vec::new()),
                control: Mutex::new(control),
                poll_gate: tokio::sync::Mutex::new(()),
                loading: AtomicBool::new(false),
                events,
            }),
        }
    }

    pub fn registry(&self) -> &PrinterRegistry {
        &self.shared.registry
    }

    pub fn config(&self) -> &PollingConfig {
        &self.shared.config
    }

    /// Subscribe to read model changes.
    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.shared.events.subscribe()
    }

    pub fn state(&self) -> PollState {
        self.shared.lock_control().phase
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.shared.lock_control().failures.count()
    }

    pub fn auto_refresh(&self) -> bool {
        self.shared.lock_control().auto_refresh
    }

    pub fn is_loading(&self) -> bool {
        self.shared.loading.load(Ordering::Relaxed)
    }

    pub fn device_status(&self, id: &PrinterId) -> DeviceStatus {
        self.shared.cache.status(id)
    }

    pub fn snapshot(&self, id: &PrinterId) -> Option<TelemetrySnapshot> {
        self.shared.cache.snapshot(id)
    }

    /// History of the selected printer, as last fetched.
    pub fn history(&self) -> Vec<TelemetrySnapshot> {
        self.shared
            .history
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Build the read model for the current selection.
    pub fn view(&self) -> DashboardView {
        let selected = self.shared.registry.selected();
        let (state, consecutive_failures, auto_refresh) = {
            let control = self.shared.lock_control();
            (control.phase, control.failures.count(), control.auto_refresh)
        };
        let (snapshot, status) = selected
            .as_ref()
            .map(|printer| {
                (
                    self.shared.cache.snapshot(&printer.id),
                    self.shared.cache.status(&printer.id),
                )
            })
            .unwrap_or_default();

        DashboardView {
            printers: self.shared.registry.printers(),
            selected,
            snapshot,
            status,
            history: self.history(),
            loading: self.is_loading(),
            auto_refresh,
            state,
            consecutive_failures,
        }
    }

    /// Reload the printer list and reconcile the selection.
    ///
    /// A backend error is logged and yields no new printers: the list, the
    /// selection and the running session stay as they were. When the
    /// selection changes the poll session follows it.
    pub async fn load_devices(&self, preferred: Option<&PrinterId>) -> SelectionChange {
        let printers = match self.shared.api.list_printers().await {
            Ok(printers) => printers,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load printers, keeping current selection");
                let selected = self.shared.registry.selected_id();
                return SelectionChange {
                    previous: selected.clone(),
                    current: selected,
                };
            }
        };

        let change = self.shared.registry.replace(printers, preferred);
        tracing::info!(
            printers = self.shared.registry.printer_count(),
            selected = ?change.current,
            "Printer list loaded"
        );

        if change.changed() {
            match &change.current {
                Some(id) => self.start_session(id.clone()).await,
                None => self.enter_idle(),
            }
        }

        change
    }

    /// Switch to a listed printer.
    ///
    /// Cancels the previous session, resets the failure counter and performs
    /// one immediate fetch before arming the interval.
    pub async fn select_device(&self, id: &PrinterId) -> Result<Printer, PollerError> {
        let printer = self.shared.registry.select(id)?;
        self.start_session(printer.id.clone()).await;
        Ok(printer)
    }

    /// Drop the selection and stop polling.
    pub fn clear_selection(&self) {
        self.shared.registry.clear_selection();
        self.enter_idle();
    }

    /// Flip auto-refresh, returning the new setting.
    pub fn toggle_auto_refresh(&self) -> bool {
        let enabled = !self.auto_refresh();
        self.set_auto_refresh(enabled)
    }

    /// Enable or pause the interval.
    ///
    /// Pausing keeps the failure counter and cached data. Resuming does not
    /// fetch immediately; it lands in `Suspended` if the counter is still at
    /// the ceiling.
    pub fn set_auto_refresh(&self, enabled: bool) -> bool {
        let selected = self.shared.registry.selected_id();
        let mut control = self.shared.lock_control();
        if control.auto_refresh == enabled {
            return enabled;
        }
        control.auto_refresh = enabled;

        if !enabled {
            control.stop_schedule();
            if control.phase != PollState::Idle {
                self.shared.set_phase(&mut control, PollState::Paused);
            }
            tracing::info!("Auto-refresh paused");
            return enabled;
        }

        tracing::info!("Auto-refresh enabled");
        if control.phase == PollState::Idle {
            return enabled;
        }
        let generation = control.generation;
        drop(control);

        if let Some(id) = selected {
            Shared::arm(&self.shared, &id, generation);
        }
        enabled
    }

    /// Reset the failure counter and poll immediately, re-enabling
    /// auto-refresh.
    pub async fn retry(&self) -> Result<(), PollerError> {
        let printer_id = self.selected_id()?;
        let generation = {
            let mut control = self.shared.lock_control();
            control.stop_schedule();
            control.generation += 1;
            control.failures.reset();
            control.auto_refresh = true;
            self.shared.set_phase(&mut control, PollState::Polling);
            control.generation
        };

        tracing::info!(printer_id = %printer_id, "Retrying telemetry");
        self.shared
            .poll(&printer_id, generation, PollKind::Retry)
            .await;
        Shared::arm(&self.shared, &printer_id, generation);
        Ok(())
    }

    /// Send a command to the selected printer and refresh right away.
    ///
    /// A failed send is returned and leaves polling untouched. Once the
    /// command is accepted the failure counter ends at zero whatever the
    /// follow-up fetch returns, and a suspended loop is re-armed.
    pub async fn send_command(&self, command: &str) -> Result<CommandAck, PollerError> {
        let command = command.trim();
        if command.is_empty() {
            return Err(PollerError::EmptyCommand);
        }
        let printer_id = self.selected_id()?;

        let ack = self
            .shared
            .api
            .send_command(&printer_id, command)
            .await
            .map_err(|source| {
                tracing::warn!(printer_id = %printer_id, command, error = %source, "Command failed");
                PollerError::Command {
                    command: command.to_string(),
                    source,
                }
            })?;
        tracing::info!(printer_id = %printer_id, command, "Command sent");
        metrics::counter!("printwatch_commands_total").increment(1);

        let generation = {
            let mut control = self.shared.lock_control();
            control.failures.reset();
            control.generation
        };

        self.shared
            .poll(&printer_id, generation, PollKind::Command)
            .await;

        let rearm = {
            let mut control = self.shared.lock_control();
            if control.generation != generation {
                false
            } else {
                control.failures.reset();
                control.phase == PollState::Suspended
            }
        };
        if rearm {
            tracing::info!(printer_id = %printer_id, "Resuming telemetry after command");
            Shared::arm(&self.shared, &printer_id, generation);
        }

        Ok(ack)
    }

    /// Register a printer and select it.
    ///
    /// Failures leave the active session untouched.
    pub async fn create_device(&self, new_printer: NewPrinter) -> Result<Printer, PollerError> {
        let new_printer = new_printer.normalized();
        new_printer.validate()?;

        let created = self
            .shared
            .api
            .create_printer(&new_printer)
            .await
            .map_err(PollerError::CreatePrinter)?;
        tracing::info!(
            printer_id = %created.id,
            name = %created.name,
            address = %created.address(),
            "Printer created"
        );

        self.load_devices(Some(&created.id)).await;
        Ok(created)
    }

    /// Cancel the interval task and wait for it to finish.
    pub async fn shutdown(&self) {
        let schedule = {
            let mut control = self.shared.lock_control();
            control.generation += 1;
            control.stop_schedule()
        };
        if let Some(schedule) = schedule {
            if let Err(e) = schedule.task.await {
                tracing::warn!(error = %e, "Telemetry schedule ended abnormally");
            }
        }
    }

    fn selected_id(&self) -> Result<PrinterId, PollerError> {
        self.shared
            .registry
            .selected_id()
            .ok_or(PollerError::NoPrinterSelected)
    }

    async fn start_session(&self, printer_id: PrinterId) {
        let generation = {
            let mut control = self.shared.lock_control();
            control.stop_schedule();
            control.generation += 1;
            control.failures.reset();
            let phase = if control.auto_refresh {
                PollState::Polling
            } else {
                PollState::Paused
            };
            self.shared.set_phase(&mut control, phase);
            self.shared.replace_history(Vec::new());
            control.generation
        };

        tracing::info!(printer_id = %printer_id, generation, "Printer selected");
        self.shared.emit(PollerEvent::SelectionChanged {
            printer_id: Some(printer_id.clone()),
        });

        self.shared
            .poll(&printer_id, generation, PollKind::Initial)
            .await;
        Shared::arm(&self.shared, &printer_id, generation);
    }

    fn enter_idle(&self) {
        let mut control = self.shared.lock_control();
        control.stop_schedule();
        control.generation += 1;
        control.failures.reset();
        self.shared.set_phase(&mut control, PollState::Idle);
        self.shared.replace_history(Vec::new());
        drop(control);

        tracing::info!("No printer selected, telemetry idle");
        self.shared
            .emit(PollerEvent::SelectionChanged { printer_id: None });
    }
}

impl Drop for TelemetryPoller {
    fn drop(&mut self) {
        let mut control = self.shared.lock_control();
        control.generation += 1;
        control.stop_schedule();
    }
}

impl Shared {
    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PollerEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn set_phase(&self, control: &mut Control, phase: PollState) {
        if control.phase == phase {
            return;
        }
        tracing::debug!(from = ?control.phase, to = ?phase, "Poll state changed");
        control.phase = phase;
        self.emit(PollerEvent::StateChanged {
            state: phase,
            failures: control.failures.count(),
        });
    }

    fn replace_history(&self, entries: Vec<TelemetrySnapshot>) {
        *self.history.write().unwrap_or_else(PoisonError::into_inner) = entries;
    }

    /// Start the interval task for `generation` unless something newer took
    /// over or the loop must stay down.
    fn arm(shared: &Arc<Shared>, printer_id: &PrinterId, generation: u64) {
        let mut control = shared.lock_control();
        if control.generation != generation || control.schedule.is_some() {
            return;
        }
        if control.failures.is_exhausted() {
            shared.set_phase(&mut control, PollState::Suspended);
            return;
        }
        if !control.auto_refresh {
            shared.set_phase(&mut control, PollState::Paused);
            return;
        }

        let cancel = CancellationToken::new();
        let period = shared.config.interval();
        let task = tokio::spawn(run_schedule(
            Arc::clone(shared),
            printer_id.clone(),
            generation,
            cancel.clone(),
            Instant::now() + period,
        ));
        control.schedule = Some(Schedule { cancel, task });
        shared.set_phase(&mut control, PollState::Polling);
    }

    /// Fetch state and history once and apply them.
    ///
    /// Returns `None` when the session was superseded before the results
    /// could be applied.
    async fn poll(
        &self,
        printer_id: &PrinterId,
        generation: u64,
        kind: PollKind,
    ) -> Option<PollOutcome> {
        let _gate = self.poll_gate.lock().await;
        if !self.is_current(generation) {
            tracing::debug!(printer_id = %printer_id, ?kind, "Skipping poll for superseded session");
            return None;
        }

        if kind.is_manual() {
            self.loading.store(true, Ordering::Relaxed);
        }

        let start = std::time::Instant::now();
        let outcome = PollOutcome::classify(self.api.fetch_state(printer_id).await);
        metrics::histogram!("printwatch_poll_latency_seconds")
            .record(start.elapsed().as_secs_f64());
        metrics::counter!("printwatch_polls_total", "outcome" => outcome.label()).increment(1);

        let applied = self.apply_state(printer_id, generation, kind, &outcome);

        match self
            .api
            .fetch_history(printer_id, self.config.history_limit)
            .await
        {
            Ok(entries) => self.apply_history(printer_id, generation, entries),
            Err(e) => {
                tracing::warn!(printer_id = %printer_id, error = %e, "Failed to fetch printer history");
            }
        }

        if kind.is_manual() {
            self.loading.store(false, Ordering::Relaxed);
        }

        applied.then_some(outcome)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.lock_control().generation == generation
    }

    fn apply_state(
        &self,
        printer_id: &PrinterId,
        generation: u64,
        kind: PollKind,
        outcome: &PollOutcome,
    ) -> bool {
        let mut control = self.lock_control();
        if control.generation != generation {
            tracing::debug!(printer_id = %printer_id, "Discarding telemetry for superseded session");
            return false;
        }

        match outcome {
            PollOutcome::Live(snapshot) => {
                control.failures.record(true);
                if let Some(since) = self.cache.store(printer_id.clone(), snapshot.clone()) {
                    tracing::info!(printer_id = %printer_id, stale_since = %since, "Printer telemetry recovered");
                }
                self.emit(PollerEvent::SnapshotUpdated {
                    printer_id: printer_id.clone(),
                });
            }
            PollOutcome::NoData | PollOutcome::Failed(_) => {
                if kind.counts_failure() {
                    control.failures.record(false);
                    self.suspend_if_exhausted(&mut control, printer_id);
                }
                let failures = control.failures.count();

                match outcome {
                    PollOutcome::Failed(e) => tracing::warn!(
                        printer_id = %printer_id,
                        error = %e,
                        failures,
                        "Telemetry poll failed"
                    ),
                    _ => tracing::debug!(
                        printer_id = %printer_id,
                        failures,
                        "Printer returned no live telemetry"
                    ),
                }

                if let Some(since) = self.cache.mark_stale(printer_id, Utc::now()) {
                    tracing::warn!(printer_id = %printer_id, "Printer telemetry is stale");
                    self.emit(PollerEvent::StaleDetected {
                        printer_id: printer_id.clone(),
                        since,
                    });
                }
            }
        }
        true
    }

    fn apply_history(&self, printer_id: &PrinterId, generation: u64, entries: Vec<TelemetrySnapshot>) {
        let control = self.lock_control();
        if control.generation != generation {
            return;
        }
        let count = entries.len();
        self.replace_history(entries);
        drop(control);

        self.emit(PollerEvent::HistoryUpdated {
            printer_id: printer_id.clone(),
            entries: count,
        });
    }

    /// Stop the interval once the failure ceiling is reached.
    ///
    /// Runs under the control lock where the failure is recorded, so a
    /// schedule armed while this poll was in flight is stopped too. A paused
    /// loop stays paused and lands in `Suspended` when resumed.
    fn suspend_if_exhausted(&self, control: &mut Control, printer_id: &PrinterId) {
        if !control.failures.is_exhausted() {
            return;
        }
        let stopped = control.stop_schedule().is_some();
        if !control.auto_refresh || control.phase == PollState::Suspended {
            return;
        }

        self.set_phase(control, PollState::Suspended);
        tracing::warn!(
            printer_id = %printer_id,
            failures = control.failures.count(),
            stopped,
            "Telemetry polling suspended, retry or send a command to resume"
        );
        metrics::counter!("printwatch_suspensions_total").increment(1);
    }
}

/// Interval loop for one session.
async fn run_schedule(
    shared: Arc<Shared>,
    printer_id: PrinterId,
    generation: u64,
    cancel: CancellationToken,
    first_tick: Instant,
) {
    let mut interval = tokio::time::interval_at(first_tick, shared.config.interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(
        printer_id = %printer_id,
        interval_ms = shared.config.interval_ms,
        "Telemetry schedule started"
    );

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!(printer_id = %printer_id, "Telemetry schedule stopped");
                break;
            }
            _ = interval.tick() => {
                let applied = shared.poll(&printer_id, generation, PollKind::Scheduled).await;
                if applied.is_none() || cancel.is_cancelled() {
                    break;
                }
            }
        }
    }
}
