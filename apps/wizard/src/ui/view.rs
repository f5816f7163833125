//! View model painted by a rendering surface. The controller writes it; renderers only read it.

use shared::{
    domain::{style_details, InputMode, DEFAULT_STYLE},
    protocol::TaskWords,
};

use crate::controller::state::STEP_COUNT;

pub const WORD_SEPARATOR: &str = " • ";
pub const REASONING_PLACEHOLDER: &str = "Reasoning unavailable.";
pub const PROMPT_PLACEHOLDER: &str = "...";
pub const STATUS_WORDS_PLACEHOLDER: &str = "beers";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Step(u8),
    Progress,
    ManualInput,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Alarm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPanel {
    Upload,
    Manual,
    Untappd,
}

impl From<InputMode> for InputPanel {
    fn from(mode: InputMode) -> Self {
        match mode {
            InputMode::Upload => InputPanel::Upload,
            InputMode::Manual => InputPanel::Manual,
            InputMode::Untappd => InputPanel::Untappd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylePreview {
    pub image: String,
    pub description: String,
    pub dimmed: bool,
    /// Style whose swap is scheduled but has not fired yet.
    pub pending: Option<String>,
}

impl Default for StylePreview {
    fn default() -> Self {
        let (image, description) = style_details(DEFAULT_STYLE)
            .map(|style| (style.image.to_string(), style.description.to_string()))
            .unwrap_or_default();
        Self {
            image,
            description,
            dimmed: false,
            pending: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub image_src: String,
    pub download_href: String,
    pub reasoning: String,
    pub prompt: String,
    pub words: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub section: Section,
    pub input_panel: InputPanel,
    pub custom_theme_visible: bool,
    pub settings_open: bool,
    pub preview: StylePreview,
    pub status_text: String,
    pub status_tone: Tone,
    pub progress_percent: u8,
    pub progress_tone: Tone,
    pub result: Option<ResultView>,
    /// One-shot message; cleared once a frame has shown it.
    pub alert: Option<String>,
    pub scroll_to_top: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            section: Section::Step(1),
            input_panel: InputPanel::Upload,
            custom_theme_visible: false,
            settings_open: false,
            preview: StylePreview::default(),
            status_text: String::new(),
            status_tone: Tone::Normal,
            progress_percent: 0,
            progress_tone: Tone::Normal,
            result: None,
            alert: None,
            scroll_to_top: false,
        }
    }
}

impl ViewState {
    pub fn is_step_visible(&self, step: u8) -> bool {
        self.section == Section::Step(step)
    }

    pub fn visible_step_count(&self) -> usize {
        (1..=STEP_COUNT)
            .filter(|step| self.is_step_visible(*step))
            .count()
    }

    pub fn reset_tones(&mut self) {
        self.status_tone = Tone::Normal;
        self.progress_tone = Tone::Normal;
    }
}

/// Text for the "generating" status line, using at most `limit` words.
pub fn status_word_preview(words: Option<&TaskWords>, limit: usize) -> String {
    let preview = words
        .map(|words| words.flatten().into_iter().take(limit).collect::<Vec<_>>())
        .unwrap_or_default();
    if preview.is_empty() {
        STATUS_WORDS_PLACEHOLDER.to_string()
    } else {
        preview.join(", ")
    }
}

pub fn display_words(words: Option<&TaskWords>) -> String {
    words
        .map(|words| words.flatten().join(WORD_SEPARATOR))
        .unwrap_or_default()
}
