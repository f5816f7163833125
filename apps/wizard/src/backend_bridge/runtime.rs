//! Runtime bridge between the controller's command queue and backend event intake.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use client_core::ArtBackend;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::domain::TaskId;
use tokio::{
    task::JoinHandle as TaskHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::events::{UiError, UiErrorContext, UiEvent},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeOptions {
    pub poll_interval: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

pub fn launch(
    backend: Arc<dyn ArtBackend>,
    options: BridgeOptions,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                forward(
                    &ui_tx,
                    UiEvent::Error(UiError::transport(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: failed to build runtime: {err}"),
                    )),
                );
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let mut poller: Option<TaskHandle<()>> = None;

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Submit(submission) => {
                        let backend = Arc::clone(&backend);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let event = match backend.submit(submission).await {
                                Ok(task_id) => UiEvent::SubmissionAccepted { task_id },
                                Err(err) => UiEvent::SubmissionFailed(UiError::from_client_error(
                                    UiErrorContext::Submission,
                                    &err,
                                )),
                            };
                            deliver(ui_tx, event).await;
                        });
                    }
                    BackendCommand::StartPolling { task_id } => {
                        if let Some(previous) = poller.take() {
                            previous.abort();
                        }
                        poller = Some(spawn_poller(
                            Arc::clone(&backend),
                            task_id,
                            options.poll_interval,
                            ui_tx.clone(),
                        ));
                    }
                    BackendCommand::StopPolling => match poller.take() {
                        Some(handle) => {
                            handle.abort();
                            tracing::debug!("poll loop cancelled");
                        }
                        None => tracing::debug!("stop requested with no active poll loop"),
                    },
                    BackendCommand::Resume { task_id, words } => {
                        let backend = Arc::clone(&backend);
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let event = match backend.resume(&task_id, &words).await {
                                Ok(()) => UiEvent::ResumeAccepted { task_id },
                                Err(err) => UiEvent::ResumeFailed {
                                    task_id,
                                    error: UiError::from_client_error(UiErrorContext::Resume, &err),
                                },
                            };
                            deliver(ui_tx, event).await;
                        });
                    }
                    BackendCommand::SchedulePreviewSwap { style, delay } => {
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            time::sleep(delay).await;
                            deliver(ui_tx, UiEvent::PreviewSwapReady { style }).await;
                        });
                    }
                }
            }

            if let Some(handle) = poller.take() {
                handle.abort();
            }
            tracing::debug!("backend command queue closed; worker exiting");
        });
    })
}

/// Polls one task on a fixed period. Fetches are sequential; failures are reported and the loop keeps going.
fn spawn_poller(
    backend: Arc<dyn ArtBackend>,
    task_id: TaskId,
    period: Duration,
    ui_tx: Sender<UiEvent>,
) -> TaskHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let event = match backend.fetch_status(&task_id).await {
                Ok(response) => UiEvent::StatusFetched {
                    task_id: task_id.clone(),
                    response,
                },
                Err(err) => {
                    tracing::warn!(%task_id, "status fetch failed: {err}");
                    UiEvent::StatusFetchFailed {
                        task_id: task_id.clone(),
                        reason: err.to_string(),
                    }
                }
            };
            if !forward(&ui_tx, event) {
                tracing::debug!(%task_id, "ui receiver gone; stopping poll loop");
                break;
            }
        }
    })
}

/// Waits for queue room: submit and resume outcomes settle the controller and must not be dropped.
async fn deliver(ui_tx: Sender<UiEvent>, event: UiEvent) {
    let sent = tokio::task::spawn_blocking(move || ui_tx.send(event).is_ok()).await;
    if !matches!(sent, Ok(true)) {
        tracing::debug!("ui receiver gone; dropping backend outcome");
    }
}

/// Returns false once the UI side has hung up. Used for repeating events where a later one supersedes.
fn forward(ui_tx: &Sender<UiEvent>, event: UiEvent) -> bool {
    match ui_tx.try_send(event) {
        Ok(()) => true,
        Err(TrySendError::Full(_)) => {
            tracing::warn!("ui event queue is full; dropping backend event");
            true
        }
        Err(TrySendError::Disconnected(_)) => false,
    }
}

#[cfg(test)]
#[path = "../tests/runtime_tests.rs"]
mod tests;
