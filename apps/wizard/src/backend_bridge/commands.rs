//! Backend commands queued from the controller to the backend worker.

use std::time::Duration;

use client_core::Submission;
use shared::domain::TaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    Submit(Submission),
    StartPolling {
        task_id: TaskId,
    },
    StopPolling,
    Resume {
        task_id: TaskId,
        words: String,
    },
    SchedulePreviewSwap {
        style: String,
        delay: Duration,
    },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Submit(_) => "submit",
            BackendCommand::StartPolling { .. } => "start_polling",
            BackendCommand::StopPolling => "stop_polling",
            BackendCommand::Resume { .. } => "resume",
            BackendCommand::SchedulePreviewSwap { .. } => "schedule_preview_swap",
        }
    }
}
