//! UI/backend events and error modeling for the wizard controller.

use client_core::{ClientError, SelectedFile};
use shared::{domain::TaskId, protocol::TaskStatusResponse};

use crate::controller::state::OptionGroupKind;

pub enum UiEvent {
    OptionSelected {
        group: OptionGroupKind,
        value: String,
    },
    /// Stands in for the `untappd_connected` redirect flag.
    UntappdLinked,
    FileSelected(Option<SelectedFile>),
    ManualTextChanged(String),
    CustomThemeChanged(String),
    ResumeWordsChanged(String),
    GoToStep(u8),
    SettingsOpened,
    SettingsClosed,
    SubmitRequested,
    ResumeRequested,
    RestartRequested,
    FrameRendered,
    PreviewSwapReady {
        style: String,
    },
    SubmissionAccepted {
        task_id: TaskId,
    },
    SubmissionFailed(UiError),
    StatusFetched {
        task_id: TaskId,
        response: TaskStatusResponse,
    },
    StatusFetchFailed {
        task_id: TaskId,
        reason: String,
    },
    ResumeAccepted {
        task_id: TaskId,
    },
    ResumeFailed {
        task_id: TaskId,
        error: UiError,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    /// A client-side precondition failed; nothing was sent.
    Validation,
    Request,
    Transport,
    ServerReported,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Navigation,
    Submission,
    Polling,
    Resume,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn validation(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context,
            message: message.into(),
        }
    }

    pub fn server_reported(message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::ServerReported,
            context: UiErrorContext::Polling,
            message: message.into(),
        }
    }

    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = if err.is_transport() {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Request
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    /// A failure reaching the backend worker or the server.
    pub fn transport(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Transport,
            context,
            message: message.into(),
        }
    }

    /// Transport failures of a resume request end the poll loop.
    pub fn cancels_polling(&self) -> bool {
        self.context == UiErrorContext::Resume && self.category == UiErrorCategory::Transport
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
