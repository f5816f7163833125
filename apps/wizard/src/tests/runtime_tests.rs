use super::*;

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use client_core::{ClientError, Submission, SubmissionInput};
use crossbeam_channel::bounded;
use shared::protocol::{TaskStatus, TaskStatusResponse};

const FAST_POLL: Duration = Duration::from_millis(20);
const WAIT: Duration = Duration::from_secs(2);

#[derive(Default)]
struct FakeBackend {
    statuses: Mutex<VecDeque<client_core::Result<TaskStatusResponse>>>,
    fetches: AtomicUsize,
    resume_error: Option<(u16, &'static str)>,
}

impl FakeBackend {
    fn with_statuses(statuses: Vec<client_core::Result<TaskStatusResponse>>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            ..Self::default()
        }
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

fn server_error(status: u16, body: &str) -> ClientError {
    ClientError::Request {
        status,
        status_text: "Internal Server Error".to_string(),
        body: body.to_string(),
    }
}

#[async_trait]
impl ArtBackend for FakeBackend {
    async fn submit(&self, submission: Submission) -> client_core::Result<TaskId> {
        match submission.input {
            SubmissionInput::UntappdHistory => Err(ClientError::Request {
                status: 400,
                status_text: "Bad Request".to_string(),
                body: "Untappd account not linked".to_string(),
            }),
            _ => Ok(TaskId::new("task-1")),
        }
    }

    async fn fetch_status(&self, _task_id: &TaskId) -> client_core::Result<TaskStatusResponse> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let next = self
            .statuses
            .lock()
            .expect("statuses lock")
            .pop_front();
        next.unwrap_or_else(|| Ok(TaskStatusResponse::new(TaskStatus::Queued)))
    }

    async fn resume(&self, _task_id: &TaskId, _words: &str) -> client_core::Result<()> {
        match self.resume_error {
            Some((status, body)) => Err(server_error(status, body)),
            None => Ok(()),
        }
    }
}

struct Harness {
    backend: Arc<FakeBackend>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    worker: JoinHandle<()>,
}

fn start(backend: FakeBackend) -> Harness {
    start_with(backend, FAST_POLL, 64)
}

fn start_with(backend: FakeBackend, poll_interval: Duration, ui_capacity: usize) -> Harness {
    let backend = Arc::new(backend);
    let (cmd_tx, cmd_rx) = bounded(16);
    let (ui_tx, ui_rx) = bounded(ui_capacity);
    let worker = launch(
        backend.clone(),
        BridgeOptions { poll_interval },
        cmd_rx,
        ui_tx,
    );
    Harness {
        backend,
        cmd_tx,
        ui_rx,
        worker,
    }
}

fn manual_submission() -> Submission {
    Submission {
        style: "dali".to_string(),
        model_provider: "google".to_string(),
        theme: "Beer".to_string(),
        input: SubmissionInput::Manual {
            words: "hops, malt".to_string(),
        },
    }
}

#[test]
fn accepted_submission_is_forwarded() {
    let harness = start(FakeBackend::default());
    harness
        .cmd_tx
        .send(BackendCommand::Submit(manual_submission()))
        .expect("send submit");

    match harness.ui_rx.recv_timeout(WAIT).expect("submit event") {
        UiEvent::SubmissionAccepted { task_id } => assert_eq!(task_id.as_str(), "task-1"),
        _ => panic!("expected submission acceptance"),
    }
}

#[test]
fn rejected_submission_keeps_server_message() {
    let harness = start(FakeBackend::default());
    let submission = Submission {
        input: SubmissionInput::UntappdHistory,
        ..manual_submission()
    };
    harness
        .cmd_tx
        .send(BackendCommand::Submit(submission))
        .expect("send submit");

    match harness.ui_rx.recv_timeout(WAIT).expect("submit event") {
        UiEvent::SubmissionFailed(err) => {
            assert_eq!(err.context(), UiErrorContext::Submission);
            assert!(err.message().contains("Untappd account not linked"));
        }
        _ => panic!("expected submission failure"),
    }
}

#[test]
fn polling_survives_a_failed_fetch() {
    let mut generating = TaskStatusResponse::new(TaskStatus::GeneratingArt);
    generating.progress = Some(70.0);
    let harness = start(FakeBackend::with_statuses(vec![
        Err(server_error(500, "boom")),
        Ok(generating),
    ]));

    harness
        .cmd_tx
        .send(BackendCommand::StartPolling {
            task_id: TaskId::new("task-1"),
        })
        .expect("start polling");

    match harness.ui_rx.recv_timeout(WAIT).expect("first poll") {
        UiEvent::StatusFetchFailed { task_id, reason } => {
            assert_eq!(task_id.as_str(), "task-1");
            assert!(reason.contains("boom"));
        }
        _ => panic!("expected a failed fetch first"),
    }
    match harness.ui_rx.recv_timeout(WAIT).expect("second poll") {
        UiEvent::StatusFetched { response, .. } => {
            assert_eq!(response.status, TaskStatus::GeneratingArt);
            assert_eq!(response.progress_percent(), Some(70));
        }
        _ => panic!("expected a status after the failure"),
    }
}

#[test]
fn stop_polling_halts_fetches() {
    let harness = start(FakeBackend::default());
    harness
        .cmd_tx
        .send(BackendCommand::StartPolling {
            task_id: TaskId::new("task-1"),
        })
        .expect("start polling");
    harness.ui_rx.recv_timeout(WAIT).expect("first poll");

    harness
        .cmd_tx
        .send(BackendCommand::StopPolling)
        .expect("stop polling");
    thread::sleep(FAST_POLL * 3);
    while harness.ui_rx.try_recv().is_ok() {}
    let settled = harness.backend.fetch_count();

    thread::sleep(FAST_POLL * 5);
    assert_eq!(harness.backend.fetch_count(), settled);
    assert!(harness.ui_rx.try_recv().is_err());
}

#[test]
fn first_fetch_waits_one_period() {
    let harness = start_with(FakeBackend::default(), Duration::from_millis(300), 64);
    harness
        .cmd_tx
        .send(BackendCommand::StartPolling {
            task_id: TaskId::new("task-1"),
        })
        .expect("start polling");

    thread::sleep(Duration::from_millis(50));
    assert_eq!(harness.backend.fetch_count(), 0);
    harness.ui_rx.recv_timeout(WAIT).expect("first poll");
}

#[test]
fn resume_failure_is_reported_with_resume_context() {
    let harness = start(FakeBackend {
        resume_error: Some((404, "Task not found")),
        ..FakeBackend::default()
    });
    harness
        .cmd_tx
        .send(BackendCommand::Resume {
            task_id: TaskId::new("task-1"),
            words: "citrus, hazy".to_string(),
        })
        .expect("send resume");

    match harness.ui_rx.recv_timeout(WAIT).expect("resume event") {
        UiEvent::ResumeFailed { task_id, error } => {
            assert_eq!(task_id.as_str(), "task-1");
            assert_eq!(error.context(), UiErrorContext::Resume);
            assert!(!error.cancels_polling());
        }
        _ => panic!("expected resume failure"),
    }
}

#[test]
fn preview_swap_fires_after_delay() {
    let harness = start(FakeBackend::default());
    harness
        .cmd_tx
        .send(BackendCommand::SchedulePreviewSwap {
            style: "picasso".to_string(),
            delay: Duration::from_millis(30),
        })
        .expect("schedule swap");

    assert!(harness.ui_rx.try_recv().is_err());
    match harness.ui_rx.recv_timeout(WAIT).expect("swap event") {
        UiEvent::PreviewSwapReady { style } => assert_eq!(style, "picasso"),
        _ => panic!("expected preview swap"),
    }
}

#[test]
fn worker_exits_when_command_queue_closes() {
    let harness = start(FakeBackend::default());
    harness
        .cmd_tx
        .send(BackendCommand::StartPolling {
            task_id: TaskId::new("task-1"),
        })
        .expect("start polling");

    drop(harness.cmd_tx);
    harness.worker.join().expect("worker thread");
}

#[test]
fn submit_outcome_waits_for_a_full_queue() {
    let harness = start_with(FakeBackend::default(), Duration::from_millis(5), 1);
    harness
        .cmd_tx
        .send(BackendCommand::StartPolling {
            task_id: TaskId::new("task-1"),
        })
        .expect("start polling");
    thread::sleep(Duration::from_millis(50));

    harness
        .cmd_tx
        .send(BackendCommand::Submit(manual_submission()))
        .expect("send submit");
    thread::sleep(Duration::from_millis(100));

    let accepted = (0..200).any(|_| {
        matches!(
            harness.ui_rx.recv_timeout(WAIT),
            Ok(UiEvent::SubmissionAccepted { .. })
        )
    });
    assert!(accepted, "submission outcome was dropped while the queue was full");
}
