use std::{
    fs,
    io::{self, BufRead, IsTerminal},
    path::{Path, PathBuf},
    sync::Arc,
    thread,
};

mod backend_bridge;
mod config;
mod controller;
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{ArtBackend, ArtClient, SelectedFile};
use crossbeam_channel::{bounded, unbounded, Receiver};
use shared::domain::{InputMode, TaskId};
use tracing_subscriber::EnvFilter;

use crate::{
    config::{load_settings, Settings, DEFAULT_CONFIG_FILE},
    controller::{events::UiEvent, reducer::Controller, state::OptionGroupKind},
    ui::{
        app::{Outcome, WizardApp},
        terminal::TerminalSurface,
    },
};

const COMMAND_QUEUE_CAPACITY: usize = 64;
const EVENT_QUEUE_CAPACITY: usize = 256;

#[derive(Parser, Debug)]
#[command(about = "Turn a beer menu, a few words, or your Untappd history into artwork")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk the wizard non-interactively and follow the task to completion.
    Run(RunArgs),
    /// Print the current status of a task as JSON.
    Status { task_id: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Upload,
    Manual,
    Untappd,
}

impl From<ModeArg> for InputMode {
    fn from(value: ModeArg) -> Self {
        match value {
            ModeArg::Upload => InputMode::Upload,
            ModeArg::Manual => InputMode::Manual,
            ModeArg::Untappd => InputMode::Untappd,
        }
    }
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    #[arg(long, value_enum, default_value = "upload")]
    mode: ModeArg,
    #[arg(long)]
    file: Option<PathBuf>,
    #[arg(long)]
    words: Option<String>,
    #[arg(long)]
    style: Option<String>,
    #[arg(long)]
    theme: Option<String>,
    #[arg(long)]
    custom_theme: Option<String>,
    #[arg(long)]
    model: Option<String>,
    /// Behave as if the Untappd login redirect just came back.
    #[arg(long)]
    untappd_connected: bool,
    #[arg(long)]
    no_color: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut settings = load_settings(&config_path)?;
    if let Some(server_url) = cli.server_url {
        settings.server_url = server_url;
    }

    let client = ArtClient::with_timeout(&settings.server_url, settings.request_timeout)
        .context("failed to build backend client")?;

    match cli.command {
        Command::Status { task_id } => print_status(client, TaskId::new(task_id)),
        Command::Run(args) => run_wizard(Arc::new(client), &settings, args),
    }
}

fn print_status(client: ArtClient, task_id: TaskId) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build runtime")?;
    let status = runtime
        .block_on(client.fetch_status(&task_id))
        .with_context(|| format!("failed to fetch status for task {task_id}"))?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

fn read_selected_file(path: &Path) -> Result<SelectedFile> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to read image '{}'", path.display()))?;
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let mime_type = mime_guess::from_path(path).first().map(|mime| mime.to_string());
    Ok(SelectedFile {
        filename,
        mime_type,
        bytes,
    })
}

/// Feeds stdin lines to the event loop without blocking it.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn run_wizard(backend: Arc<dyn ArtBackend>, settings: &Settings, args: RunArgs) -> Result<()> {
    let (cmd_tx, cmd_rx) = bounded(COMMAND_QUEUE_CAPACITY);
    let (ui_tx, ui_rx) = bounded(EVENT_QUEUE_CAPACITY);
    let worker = backend_bridge::runtime::launch(backend, settings.bridge_options(), cmd_rx, ui_tx);

    let color = !args.no_color && io::stdout().is_terminal();
    let surface = TerminalSurface::new(io::stdout(), color);
    let mut app = WizardApp::new(
        Controller::new(settings.controller_options()),
        cmd_tx,
        ui_rx,
        surface,
    );

    app.render()?;
    if args.untappd_connected {
        app.dispatch(UiEvent::UntappdLinked)?;
    }
    let mode = InputMode::from(args.mode);
    app.dispatch(UiEvent::OptionSelected {
        group: OptionGroupKind::InputMode,
        value: mode.as_str().to_string(),
    })?;
    if let Some(path) = &args.file {
        app.dispatch(UiEvent::FileSelected(Some(read_selected_file(path)?)))?;
    }
    if let Some(words) = args.words {
        app.dispatch(UiEvent::ManualTextChanged(words))?;
    }

    for step in 2..=controller::state::STEP_COUNT {
        app.dispatch(UiEvent::GoToStep(step))?;
        if app.controller().state().current_step != step {
            bail!(
                "{}",
                app.last_alert().unwrap_or("cannot continue to the next step")
            );
        }
        if step == 2 {
            if let Some(style) = &args.style {
                select(&mut app, OptionGroupKind::Style, style)?;
            }
        }
    }

    app.dispatch(UiEvent::SettingsOpened)?;
    if let Some(theme) = &args.theme {
        select(&mut app, OptionGroupKind::Theme, theme)?;
    }
    if let Some(custom_theme) = args.custom_theme {
        app.dispatch(UiEvent::CustomThemeChanged(custom_theme))?;
    }
    if let Some(model) = &args.model {
        select(&mut app, OptionGroupKind::ModelProvider, model)?;
    }
    app.dispatch(UiEvent::SettingsClosed)?;

    app.dispatch(UiEvent::SubmitRequested)?;
    let input_rx = spawn_input_reader();
    let outcome = app.run_until_settled(&input_rx)?;

    drop(app);
    let _ = worker.join();

    match outcome {
        Outcome::Completed { image_url } => {
            println!("{image_url}");
            Ok(())
        }
        Outcome::Failed { message } | Outcome::Rejected { message } => bail!("{message}"),
    }
}

fn select<S: ui::terminal::Surface>(
    app: &mut WizardApp<S>,
    group: OptionGroupKind,
    value: &str,
) -> Result<()> {
    app.dispatch(UiEvent::OptionSelected {
        group,
        value: value.to_string(),
    })?;
    if !app.controller().state().group(group).is_selected(value) {
        let known = app
            .controller()
            .state()
            .group(group)
            .options()
            .map(|(option, _)| option)
            .collect::<Vec<_>>()
            .join(", ");
        bail!("unknown {} '{value}' (expected one of: {known})", group.label());
    }
    Ok(())
}
