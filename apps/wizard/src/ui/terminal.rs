//! Line-oriented terminal surface. Prints a frame only when the visible content changed.

use std::io::{self, Write};

use crate::{
    controller::state::{OptionGroupKind, WizardState},
    ui::view::{InputPanel, Section, Tone, ViewState},
};

const PROGRESS_WIDTH: usize = 20;
const ALARM: &str = "\x1b[31m";
const ACCENT: &str = "\x1b[33m";
const RESET: &str = "\x1b[0m";

pub trait Surface {
    fn paint(&mut self, state: &WizardState, view: &ViewState) -> io::Result<()>;
}

pub struct TerminalSurface<W: Write> {
    out: W,
    color: bool,
    last_frame: Vec<String>,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            last_frame: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn tint(&self, tone: Tone, text: &str) -> String {
        match (self.color, tone) {
            (false, _) => text.to_string(),
            (true, Tone::Normal) => format!("{ACCENT}{text}{RESET}"),
            (true, Tone::Alarm) => format!("{ALARM}{text}{RESET}"),
        }
    }

    fn frame(&self, state: &WizardState, view: &ViewState) -> Vec<String> {
        let mut lines = Vec::new();
        match view.section {
            Section::Step(step) => {
                lines.push(format!("== Step {step} =="));
                match step {
                    1 => lines.push(input_panel_line(state, view.input_panel)),
                    2 => {
                        lines.push(group_line(state, OptionGroupKind::Style));
                        let dim = if view.preview.dimmed { " (loading)" } else { "" };
                        lines.push(format!("preview: {}{dim}", view.preview.image));
                        lines.push(view.preview.description.clone());
                    }
                    _ => {
                        lines.push(group_line(state, OptionGroupKind::Theme));
                        if view.custom_theme_visible {
                            lines.push(format!("custom theme: {}", state.custom_theme.trim()));
                        }
                        lines.push(group_line(state, OptionGroupKind::ModelProvider));
                    }
                }
            }
            Section::Progress => {
                lines.push(progress_bar(view.progress_percent, view.progress_tone, self));
                lines.push(self.tint(view.status_tone, &view.status_text));
            }
            Section::ManualInput => {
                lines.push(progress_bar(view.progress_percent, view.progress_tone, self));
                lines.push(
                    "The backend needs a few descriptive words to continue (comma separated):"
                        .to_string(),
                );
            }
            Section::Result => {
                if let Some(result) = &view.result {
                    lines.push("== Your artwork ==".to_string());
                    lines.push(format!("image: {}", result.image_src));
                    lines.push(format!("download: {}", result.download_href));
                    lines.push(format!("words: {}", result.words));
                    lines.push(format!("reasoning: {}", result.reasoning));
                    lines.push(format!("prompt: {}", result.prompt));
                }
            }
        }
        if view.settings_open {
            lines.push(format!(
                "[settings] {} | {}",
                group_line(state, OptionGroupKind::Theme),
                group_line(state, OptionGroupKind::ModelProvider)
            ));
        }
        if let Some(alert) = &view.alert {
            lines.push(self.tint(Tone::Alarm, &format!("! {alert}")));
        }
        lines
    }
}

impl<W: Write> Surface for TerminalSurface<W> {
    fn paint(&mut self, state: &WizardState, view: &ViewState) -> io::Result<()> {
        let frame = self.frame(state, view);
        if frame == self.last_frame {
            return Ok(());
        }
        if view.scroll_to_top {
            writeln!(self.out)?;
        }
        for line in &frame {
            writeln!(self.out, "{line}")?;
        }
        self.out.flush()?;
        self.last_frame = frame;
        Ok(())
    }
}

fn group_line(state: &WizardState, kind: OptionGroupKind) -> String {
    let options = state
        .group(kind)
        .options()
        .map(|(value, selected)| {
            if selected {
                format!("[{value}]")
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}: {options}", kind.label())
}

fn input_panel_line(state: &WizardState, panel: InputPanel) -> String {
    let detail = match panel {
        InputPanel::Upload => match &state.selected_file {
            Some(file) => format!("file: {} ({} bytes)", file.filename, file.bytes.len()),
            None => "file: none selected".to_string(),
        },
        InputPanel::Manual => format!("words: {}", state.manual_text.trim()),
        InputPanel::Untappd => "using your linked Untappd history".to_string(),
    };
    format!("{} | {detail}", group_line(state, OptionGroupKind::InputMode))
}

fn progress_bar<W: Write>(percent: u8, tone: Tone, surface: &TerminalSurface<W>) -> String {
    let filled = usize::from(percent.min(100)) * PROGRESS_WIDTH / 100;
    let bar = format!(
        "[{}{}] {percent:>3}%",
        "#".repeat(filled),
        "-".repeat(PROGRESS_WIDTH - filled)
    );
    surface.tint(tone, &bar)
}
