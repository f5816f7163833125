//! Event loop that owns the controller, pumps backend events, and paints frames.

use std::io;

use anyhow::{bail, Result};
use crossbeam_channel::{never, select, Receiver, Sender};
use shared::protocol::TaskStatus;

use crate::{
    backend_bridge::commands::BackendCommand,
    controller::{
        events::{UiError, UiErrorContext, UiEvent},
        orchestration::dispatch_backend_commands,
        reducer::Controller,
    },
    ui::{terminal::Surface, view::Section},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Completed { image_url: String },
    Failed { message: String },
    /// The submission never became a task.
    Rejected { message: String },
}

pub struct WizardApp<S: Surface> {
    controller: Controller,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    surface: S,
    last_alert: Option<String>,
}

impl<S: Surface> WizardApp<S> {
    pub fn new(
        controller: Controller,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        surface: S,
    ) -> Self {
        Self {
            controller,
            cmd_tx,
            ui_rx,
            surface,
            last_alert: None,
        }
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn last_alert(&self) -> Option<&str> {
        self.last_alert.as_deref()
    }

    pub fn dispatch(&mut self, event: UiEvent) -> io::Result<()> {
        let cmds = self.controller.handle(event);
        let mut queue_alert = None;
        dispatch_backend_commands(&self.cmd_tx, cmds, &mut queue_alert);
        if let Some(message) = queue_alert {
            self.controller.handle(UiEvent::Error(UiError::transport(
                UiErrorContext::General,
                message,
            )));
        }
        self.render()
    }

    pub fn render(&mut self) -> io::Result<()> {
        self.surface
            .paint(self.controller.state(), self.controller.view())?;
        let view = self.controller.view();
        if let Some(alert) = &view.alert {
            self.last_alert = Some(alert.clone());
        }
        if view.alert.is_some() || view.scroll_to_top {
            self.controller.handle(UiEvent::FrameRendered);
        }
        Ok(())
    }

    pub fn outcome(&self) -> Option<Outcome> {
        if !self.controller.is_settled() {
            return None;
        }
        let view = self.controller.view();
        match self.controller.task() {
            Some(task) if task.status == TaskStatus::Completed => Some(Outcome::Completed {
                image_url: task.image_url.clone().unwrap_or_default(),
            }),
            Some(_) => Some(Outcome::Failed {
                message: view.status_text.clone(),
            }),
            None if view.section == Section::Progress => None,
            None => Some(Outcome::Rejected {
                message: self
                    .last_alert
                    .clone()
                    .unwrap_or_else(|| view.status_text.clone()),
            }),
        }
    }

    /// Pumps events until the task settles. Lines from `input_rx` answer a manual-words request;
    /// a line typed before the request is held until the backend asks. Once input has closed,
    /// a repeated request is answered with the words already sent.
    pub fn run_until_settled(&mut self, input_rx: &Receiver<String>) -> Result<Outcome> {
        let events = self.ui_rx.clone();
        let mut input_open = true;
        let mut pending_words: Option<String> = None;
        let mut last_answer: Option<String> = None;
        loop {
            if let Some(outcome) = self.outcome() {
                return Ok(outcome);
            }
            if self.controller.is_resume_armed() {
                if let Some(words) = pending_words.take() {
                    if self.answer(&words)? {
                        last_answer = Some(words);
                    }
                    continue;
                }
                if !input_open {
                    let Some(words) = last_answer.clone() else {
                        bail!("input closed while the task is waiting for words");
                    };
                    tracing::debug!("words requested again; re-sending the previous answer");
                    self.answer(&words)?;
                    continue;
                }
            }

            let input = if input_open {
                input_rx.clone()
            } else {
                never()
            };

            select! {
                recv(events) -> event => match event {
                    Ok(event) => self.dispatch(event)?,
                    Err(_) => bail!("backend worker stopped before the task finished"),
                },
                recv(input) -> line => match line {
                    Ok(line) if line.trim().is_empty() => {}
                    Ok(line) if self.controller.is_resume_armed() => {
                        if self.answer(&line)? {
                            last_answer = Some(line);
                        }
                    }
                    Ok(line) => {
                        tracing::debug!(%line, "holding input until words are requested");
                        pending_words = Some(line);
                    }
                    Err(_) => input_open = false,
                },
            }
        }
    }

    /// Returns true when the words were accepted and a resume request went out.
    fn answer(&mut self, words: &str) -> io::Result<bool> {
        self.dispatch(UiEvent::ResumeWordsChanged(words.to_string()))?;
        self.dispatch(UiEvent::ResumeRequested)?;
        Ok(!self.controller.is_resume_armed())
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
