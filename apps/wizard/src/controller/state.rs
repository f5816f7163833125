//! Wizard-owned state: input selections and the single active generation task.

use client_core::SelectedFile;
use shared::{
    domain::{
        InputMode, TaskId, CUSTOM_THEME, DEFAULT_MODEL_PROVIDER, DEFAULT_STYLE, DEFAULT_THEME,
        MODEL_PROVIDERS, STYLE_CATALOGUE, THEME_OPTIONS,
    },
    protocol::{TaskStatus, TaskStatusResponse, TaskWords},
};

/// Steps: input, style, generate.
pub const STEP_COUNT: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionGroupKind {
    InputMode,
    Style,
    Theme,
    ModelProvider,
}

impl OptionGroupKind {
    pub fn label(self) -> &'static str {
        match self {
            OptionGroupKind::InputMode => "input mode",
            OptionGroupKind::Style => "style",
            OptionGroupKind::Theme => "theme",
            OptionGroupKind::ModelProvider => "model",
        }
    }
}

/// A set of buttons of which exactly one is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    options: Vec<String>,
    selected: usize,
}

impl OptionGroup {
    /// Falls back to the first option when `default` is not one of `options`.
    pub fn new<I, S>(options: I, default: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        let selected = options
            .iter()
            .position(|option| option == default)
            .unwrap_or(0);
        Self { options, selected }
    }

    /// Selects `value`, deselecting everything else. Unknown values leave the group untouched.
    pub fn select(&mut self, value: &str) -> bool {
        match self.options.iter().position(|option| option == value) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// The hidden value carried by the group.
    pub fn value(&self) -> &str {
        self.options
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or_default()
    }

    pub fn is_selected(&self, value: &str) -> bool {
        self.value() == value
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, bool)> {
        self.options
            .iter()
            .enumerate()
            .map(move |(index, option)| (option.as_str(), index == self.selected))
    }

    pub fn selected_count(&self) -> usize {
        self.options().filter(|(_, selected)| *selected).count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: u8,
    pub input_mode: OptionGroup,
    pub style: OptionGroup,
    pub theme: OptionGroup,
    pub model_provider: OptionGroup,
    pub selected_file: Option<SelectedFile>,
    pub manual_text: String,
    pub custom_theme: String,
    pub resume_words: String,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: 1,
            input_mode: OptionGroup::new(
                InputMode::ALL.map(InputMode::as_str),
                InputMode::Upload.as_str(),
            ),
            style: OptionGroup::new(STYLE_CATALOGUE.map(|style| style.key), DEFAULT_STYLE),
            theme: OptionGroup::new(THEME_OPTIONS, DEFAULT_THEME),
            model_provider: OptionGroup::new(MODEL_PROVIDERS, DEFAULT_MODEL_PROVIDER),
            selected_file: None,
            manual_text: String::new(),
            custom_theme: String::new(),
            resume_words: String::new(),
        }
    }
}

impl WizardState {
    pub fn group(&self, kind: OptionGroupKind) -> &OptionGroup {
        match kind {
            OptionGroupKind::InputMode => &self.input_mode,
            OptionGroupKind::Style => &self.style,
            OptionGroupKind::Theme => &self.theme,
            OptionGroupKind::ModelProvider => &self.model_provider,
        }
    }

    pub fn group_mut(&mut self, kind: OptionGroupKind) -> &mut OptionGroup {
        match kind {
            OptionGroupKind::InputMode => &mut self.input_mode,
            OptionGroupKind::Style => &mut self.style,
            OptionGroupKind::Theme => &mut self.theme,
            OptionGroupKind::ModelProvider => &mut self.model_provider,
        }
    }

    pub fn mode(&self) -> InputMode {
        InputMode::from_value(self.input_mode.value()).unwrap_or(InputMode::Upload)
    }

    pub fn uses_custom_theme(&self) -> bool {
        self.theme.is_selected(CUSTOM_THEME)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationTask {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub progress_percent: u8,
    pub words: Option<TaskWords>,
    pub image_url: Option<String>,
    pub reasoning: Option<String>,
    pub generated_prompt: Option<String>,
    pub error: Option<String>,
}

impl GenerationTask {
    pub fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            status: TaskStatus::Queued,
            progress_percent: 0,
            words: None,
            image_url: None,
            reasoning: None,
            generated_prompt: None,
            error: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Folds one poll response into the task. Absent optional fields keep their last value.
    pub fn apply(&mut self, response: &TaskStatusResponse) {
        self.status = response.status;
        if let Some(progress) = response.progress_percent() {
            self.progress_percent = progress;
        }
        if response.words.is_some() {
            self.words = response.words.clone();
        }
        if response.image_url.is_some() {
            self.image_url = response.image_url.clone();
        }
        if response.reasoning.is_some() {
            self.reasoning = response.reasoning.clone();
        }
        if response.generated_prompt.is_some() {
            self.generated_prompt = response.generated_prompt.clone();
        }
        if response.error.is_some() {
            self.error = response.error.clone();
        }
    }
}
