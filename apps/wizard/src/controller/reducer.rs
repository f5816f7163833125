//! Pure state transitions: one event in, updated wizard/view state and backend commands out.

use std::time::Duration;

use client_core::{Submission, SubmissionInput};
use shared::{
    domain::{style_details, InputMode, TaskId},
    protocol::{TaskStatus, TaskStatusResponse},
};
use tracing::{debug, error, info, warn};

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{UiError, UiErrorContext, UiEvent},
        state::{GenerationTask, OptionGroupKind, WizardState, STEP_COUNT},
    },
    ui::view::{
        display_words, status_word_preview, ResultView, Section, Tone, ViewState,
        PROMPT_PLACEHOLDER, REASONING_PLACEHOLDER,
    },
};

/// Minimum trimmed length of any free-text word list.
pub const MIN_WORDS_LEN: usize = 3;
pub const DEFAULT_PREVIEW_FADE: Duration = Duration::from_millis(150);
pub const DEFAULT_STATUS_WORD_PREVIEW: usize = 3;

pub const MSG_SELECT_IMAGE: &str = "Please select an image first.";
pub const MSG_MIN_WORDS: &str = "Please enter at least 3 descriptive words.";
pub const MSG_CUSTOM_THEME: &str =
    "Please enter a custom theme description in Settings (Top Left).";
pub const MSG_NO_FILE: &str = "No file found. Please go back to Step 1.";
pub const MSG_TASK_RUNNING: &str = "A creation is already in progress.";

pub const STATUS_UPLOADING: &str = "Uploading & Analyzing...";
pub const STATUS_PROCESSING_WORDS: &str = "Processing words...";
pub const STATUS_FETCHING_HISTORY: &str = "Fetching Untappd history...";
pub const STATUS_ANALYZING: &str = "Reading text from image...";
pub const STATUS_RESUMING: &str = "Resuming creation...";

fn initial_status(mode: InputMode) -> (&'static str, u8) {
    match mode {
        InputMode::Upload => (STATUS_UPLOADING, 0),
        InputMode::Manual => (STATUS_PROCESSING_WORDS, 30),
        InputMode::Untappd => (STATUS_FETCHING_HISTORY, 20),
    }
}

fn has_min_words(text: &str) -> bool {
    text.trim().chars().count() >= MIN_WORDS_LEN
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub preview_fade: Duration,
    /// How many words the "generating" status line names.
    pub status_word_preview: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            preview_fade: DEFAULT_PREVIEW_FADE,
            status_word_preview: DEFAULT_STATUS_WORD_PREVIEW,
        }
    }
}

pub struct Controller {
    state: WizardState,
    view: ViewState,
    task: Option<GenerationTask>,
    submission_in_flight: bool,
    polling: bool,
    resume_armed: bool,
    options: ControllerOptions,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(ControllerOptions::default())
    }
}

impl Controller {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            state: WizardState::default(),
            view: ViewState::default(),
            task: None,
            submission_in_flight: false,
            polling: false,
            resume_armed: false,
            options,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn task(&self) -> Option<&GenerationTask> {
        self.task.as_ref()
    }

    pub fn is_polling(&self) -> bool {
        self.polling
    }

    pub fn is_resume_armed(&self) -> bool {
        self.resume_armed
    }

    /// True once the active task reached a terminal status or its poll loop was cancelled.
    pub fn is_settled(&self) -> bool {
        !self.submission_in_flight
            && self
                .task
                .as_ref()
                .map_or(true, |task| task.is_terminal() || !self.polling)
    }

    pub fn handle(&mut self, event: UiEvent) -> Vec<BackendCommand> {
        match event {
            UiEvent::OptionSelected { group, value } => self.select_option(group, &value),
            UiEvent::UntappdLinked => {
                self.select_option(OptionGroupKind::InputMode, InputMode::Untappd.as_str())
            }
            UiEvent::FileSelected(file) => {
                self.state.selected_file = file;
                Vec::new()
            }
            UiEvent::ManualTextChanged(text) => {
                self.state.manual_text = text;
                Vec::new()
            }
            UiEvent::CustomThemeChanged(text) => {
                self.state.custom_theme = text;
                Vec::new()
            }
            UiEvent::ResumeWordsChanged(text) => {
                self.state.resume_words = text;
                Vec::new()
            }
            UiEvent::GoToStep(step) => {
                if let Err(err) = self.go_to_step(step) {
                    self.show_alert(&err);
                }
                Vec::new()
            }
            UiEvent::SettingsOpened => {
                self.view.settings_open = true;
                Vec::new()
            }
            UiEvent::SettingsClosed => {
                self.view.settings_open = false;
                Vec::new()
            }
            UiEvent::SubmitRequested => self.submit(),
            UiEvent::ResumeRequested => self.resume(),
            UiEvent::RestartRequested => {
                self.restart();
                Vec::new()
            }
            UiEvent::FrameRendered => {
                self.view.alert = None;
                self.view.scroll_to_top = false;
                Vec::new()
            }
            UiEvent::PreviewSwapReady { style } => {
                self.finish_preview_swap(&style);
                Vec::new()
            }
            UiEvent::SubmissionAccepted { task_id } => self.start_task(task_id),
            UiEvent::SubmissionFailed(err) => {
                self.fail_submission(&err);
                Vec::new()
            }
            UiEvent::StatusFetched { task_id, response } => self.apply_status(&task_id, &response),
            UiEvent::StatusFetchFailed { task_id, reason } => {
                warn!(%task_id, %reason, "status poll failed; retrying on next tick");
                Vec::new()
            }
            UiEvent::ResumeAccepted { task_id } => {
                debug!(%task_id, "resume acknowledged");
                Vec::new()
            }
            UiEvent::ResumeFailed { task_id, error } => self.fail_resume(&task_id, &error),
            UiEvent::Error(err) => {
                error!(context = ?err.context(), "{}", err.message());
                self.show_alert(&err);
                Vec::new()
            }
        }
    }

    /// Step-level precondition for moving forward from `step`.
    pub fn validate(&self, step: u8) -> Result<(), UiError> {
        if step != 1 {
            return Ok(());
        }
        match self.state.mode() {
            InputMode::Upload if self.state.selected_file.is_none() => Err(UiError::validation(
                UiErrorContext::Navigation,
                MSG_SELECT_IMAGE,
            )),
            InputMode::Manual if !has_min_words(&self.state.manual_text) => Err(
                UiError::validation(UiErrorContext::Navigation, MSG_MIN_WORDS),
            ),
            _ => Ok(()),
        }
    }

    pub fn go_to_step(&mut self, step: u8) -> Result<(), UiError> {
        if !(1..=STEP_COUNT).contains(&step) {
            return Err(UiError::validation(
                UiErrorContext::Navigation,
                format!("There is no step {step}."),
            ));
        }
        if step > self.state.current_step {
            self.validate(self.state.current_step)?;
        }
        self.state.current_step = step;
        self.view.section = Section::Step(step);
        self.view.scroll_to_top = true;
        Ok(())
    }

    fn show_alert(&mut self, err: &UiError) {
        self.view.alert = Some(err.message().to_string());
    }

    fn select_option(&mut self, group: OptionGroupKind, value: &str) -> Vec<BackendCommand> {
        if !self.state.group_mut(group).select(value) {
            debug!(group = group.label(), value, "ignoring unknown option");
            return Vec::new();
        }
        match group {
            OptionGroupKind::InputMode => {
                self.view.input_panel = self.state.mode().into();
                Vec::new()
            }
            OptionGroupKind::Theme => {
                self.view.custom_theme_visible = self.state.uses_custom_theme();
                Vec::new()
            }
            OptionGroupKind::Style => self.schedule_preview_swap(value),
            OptionGroupKind::ModelProvider => Vec::new(),
        }
    }

    fn schedule_preview_swap(&mut self, style: &str) -> Vec<BackendCommand> {
        if style_details(style).is_none() {
            return Vec::new();
        }
        self.view.preview.dimmed = true;
        self.view.preview.pending = Some(style.to_string());
        vec![BackendCommand::SchedulePreviewSwap {
            style: style.to_string(),
            delay: self.options.preview_fade,
        }]
    }

    fn finish_preview_swap(&mut self, style: &str) {
        if self.view.preview.pending.as_deref() != Some(style) {
            debug!(style, "dropping stale preview swap");
            return;
        }
        if let Some(details) = style_details(style) {
            self.view.preview.image = details.image.to_string();
            self.view.preview.description = details.description.to_string();
        }
        self.view.preview.dimmed = false;
        self.view.preview.pending = None;
    }

    fn resolve_theme(&self) -> Result<String, UiError> {
        if !self.state.uses_custom_theme() {
            return Ok(self.state.theme.value().to_string());
        }
        let theme = self.state.custom_theme.trim();
        if theme.is_empty() {
            return Err(UiError::validation(
                UiErrorContext::Submission,
                MSG_CUSTOM_THEME,
            ));
        }
        Ok(theme.to_string())
    }

    fn submit(&mut self) -> Vec<BackendCommand> {
        if !self.is_settled() {
            self.show_alert(&UiError::validation(
                UiErrorContext::Submission,
                MSG_TASK_RUNNING,
            ));
            return Vec::new();
        }

        let theme = match self.resolve_theme() {
            Ok(theme) => theme,
            Err(err) => {
                self.show_alert(&err);
                return Vec::new();
            }
        };

        let input = match self.state.mode() {
            InputMode::Upload => match self.state.selected_file.clone() {
                Some(file) => SubmissionInput::Upload(file),
                None => {
                    self.show_alert(&UiError::validation(
                        UiErrorContext::Submission,
                        MSG_NO_FILE,
                    ));
                    let _ = self.go_to_step(1);
                    return Vec::new();
                }
            },
            InputMode::Manual => {
                if !has_min_words(&self.state.manual_text) {
                    self.show_alert(&UiError::validation(
                        UiErrorContext::Submission,
                        MSG_MIN_WORDS,
                    ));
                    return Vec::new();
                }
                SubmissionInput::Manual {
                    words: self.state.manual_text.trim().to_string(),
                }
            }
            InputMode::Untappd => SubmissionInput::UntappdHistory,
        };

        let submission = Submission {
            style: self.state.style.value().to_string(),
            model_provider: self.state.model_provider.value().to_string(),
            theme,
            input,
        };
        let mode = submission.mode();

        self.task = None;
        self.resume_armed = false;
        self.view.result = None;
        self.view.section = Section::Progress;
        self.view.reset_tones();
        let (status_text, progress) = initial_status(mode);
        self.view.status_text = status_text.to_string();
        self.view.progress_percent = progress;
        self.submission_in_flight = true;

        info!(%mode, style = %submission.style, "queueing generation request");
        vec![BackendCommand::Submit(submission)]
    }

    fn start_task(&mut self, task_id: TaskId) -> Vec<BackendCommand> {
        if !self.submission_in_flight {
            warn!(%task_id, "ignoring acceptance for a submission that is no longer pending");
            return Vec::new();
        }
        self.submission_in_flight = false;
        self.task = Some(GenerationTask::new(task_id.clone()));
        self.polling = true;
        info!(%task_id, "polling generation task");
        vec![BackendCommand::StartPolling { task_id }]
    }

    fn fail_submission(&mut self, err: &UiError) {
        self.submission_in_flight = false;
        error!(category = ?err.category(), "generation request failed: {}", err.message());
        let message = format!("Error: {}", err.message());
        self.view.status_text = message.clone();
        self.view.status_tone = Tone::Alarm;
        self.view.section = Section::Step(self.state.current_step);
        self.view.alert = Some(message);
    }

    fn apply_status(
        &mut self,
        task_id: &TaskId,
        response: &TaskStatusResponse,
    ) -> Vec<BackendCommand> {
        let polling = self.polling;
        let Some(task) = self.task.as_mut() else {
            debug!(%task_id, "ignoring status without an active task");
            return Vec::new();
        };
        if &task.task_id != task_id || !polling || task.is_terminal() {
            debug!(%task_id, "ignoring stale status");
            return Vec::new();
        }

        task.apply(response);
        self.view.progress_percent = task.progress_percent;

        let mut stop = false;
        match response.status {
            TaskStatus::AnalyzingImage => {
                self.view.status_text = STATUS_ANALYZING.to_string();
                self.view.status_tone = Tone::Normal;
            }
            TaskStatus::WaitingForInput => {
                self.view.section = Section::ManualInput;
                if !self.resume_armed {
                    debug!(%task_id, "arming resume control");
                }
                self.resume_armed = true;
            }
            TaskStatus::GeneratingArt => {
                let preview =
                    status_word_preview(task.words.as_ref(), self.options.status_word_preview);
                self.view.status_text = format!("Dreaming of {preview}...");
                self.view.status_tone = Tone::Normal;
            }
            TaskStatus::Completed => {
                let image_url = task.image_url.clone().unwrap_or_default();
                self.view.result = Some(ResultView {
                    image_src: image_url.clone(),
                    download_href: image_url,
                    reasoning: task
                        .reasoning
                        .clone()
                        .unwrap_or_else(|| REASONING_PLACEHOLDER.to_string()),
                    prompt: task
                        .generated_prompt
                        .clone()
                        .unwrap_or_else(|| PROMPT_PLACEHOLDER.to_string()),
                    words: display_words(task.words.as_ref()),
                });
                self.view.section = Section::Result;
                info!(%task_id, "generation completed");
                stop = true;
            }
            TaskStatus::Failed => {
                let message = task.error.as_deref().unwrap_or("unknown error");
                let failure = UiError::server_reported(message);
                warn!(%task_id, "generation failed: {}", failure.message());
                self.view.status_text = format!("Error: {}", failure.message());
                self.view.status_tone = Tone::Alarm;
                self.view.progress_tone = Tone::Alarm;
                stop = true;
            }
            TaskStatus::Queued | TaskStatus::Other => {}
        }

        if stop {
            self.stop_polling()
        } else {
            Vec::new()
        }
    }

    /// Emits at most one `StopPolling` per poll loop.
    fn stop_polling(&mut self) -> Vec<BackendCommand> {
        self.resume_armed = false;
        if !self.polling {
            return Vec::new();
        }
        self.polling = false;
        vec![BackendCommand::StopPolling]
    }

    fn resume(&mut self) -> Vec<BackendCommand> {
        if !self.resume_armed {
            debug!("resume control is not armed");
            return Vec::new();
        }
        let Some(task_id) = self.task.as_ref().map(|task| task.task_id.clone()) else {
            return Vec::new();
        };
        if !has_min_words(&self.state.resume_words) {
            self.show_alert(&UiError::validation(UiErrorContext::Resume, MSG_MIN_WORDS));
            return Vec::new();
        }

        let words = self.state.resume_words.trim().to_string();
        self.resume_armed = false;
        self.view.section = Section::Progress;
        self.view.status_text = STATUS_RESUMING.to_string();
        self.view.status_tone = Tone::Normal;
        info!(%task_id, "resuming task with manual words");
        vec![BackendCommand::Resume { task_id, words }]
    }

    fn fail_resume(&mut self, task_id: &TaskId, err: &UiError) -> Vec<BackendCommand> {
        if self.task.as_ref().map(|task| &task.task_id) != Some(task_id) {
            return Vec::new();
        }
        error!(%task_id, category = ?err.category(), "resume failed: {}", err.message());
        self.view.status_text = format!("Error Resuming: {}", err.message());
        self.view.status_tone = Tone::Alarm;
        if err.cancels_polling() {
            return self.stop_polling();
        }
        Vec::new()
    }

    fn restart(&mut self) {
        if !self.is_settled() {
            self.show_alert(&UiError::validation(
                UiErrorContext::General,
                MSG_TASK_RUNNING,
            ));
            return;
        }
        self.task = None;
        self.resume_armed = false;
        self.state.current_step = 1;
        self.view.result = None;
        self.view.reset_tones();
        self.view.status_text.clear();
        self.view.progress_percent = 0;
        self.view.section = Section::Step(1);
        self.view.scroll_to_top = true;
    }
}

#[cfg(test)]
#[path = "../tests/reducer_tests.rs"]
mod tests;
