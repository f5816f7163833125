//! Command orchestration helpers from controller output to the backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    alert: &mut Option<String>,
) {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "backend command queue is full");
            *alert = Some("UI command queue is full; please retry".to_string());
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend command processor disconnected");
            *alert = Some(
                "Backend command processor disconnected (possible startup/runtime failure); restart the wizard"
                    .to_string(),
            );
        }
    }
}

pub fn dispatch_backend_commands(
    cmd_tx: &Sender<BackendCommand>,
    cmds: Vec<BackendCommand>,
    alert: &mut Option<String>,
) {
    for cmd in cmds {
        dispatch_backend_command(cmd_tx, cmd, alert);
    }
}
