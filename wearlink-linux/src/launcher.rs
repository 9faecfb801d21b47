//! Remote launcher and local command handler backed by external programs.

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};
use wearlink_core::{CommandDirective, CommandHandler, CompanionService, LaunchError, RemoteLauncher};

/// Opens a URI with `program <uri>`. Zero exit status counts as launched.
pub struct CommandLauncher {
    program: String,
}

impl CommandLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl RemoteLauncher for CommandLauncher {
    async fn start_remote(&self, uri: &str) -> Result<(), LaunchError> {
        let status = Command::new(&self.program)
            .arg(uri)
            .status()
            .await
            .map_err(|e| LaunchError(format!("{}: {e}", self.program)))?;
        if status.success() {
            Ok(())
        } else {
            Err(LaunchError(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Runs `program <package> <class> <play|pause|toggle>` for each local command.
pub struct ServiceCommand {
    program: Option<String>,
}

impl ServiceCommand {
    pub fn new(program: Option<String>) -> Self {
        Self { program }
    }
}

pub fn directive_arg(directive: CommandDirective) -> &'static str {
    match directive.play {
        Some(true) => "play",
        Some(false) => "pause",
        None => "toggle",
    }
}

#[async_trait]
impl CommandHandler for ServiceCommand {
    async fn on_command(&self, service: &CompanionService, directive: CommandDirective) {
        let Some(program) = &self.program else {
            debug!(package = %service.package_name, "no service command configured");
            return;
        };
        let result = Command::new(program)
            .arg(&service.package_name)
            .arg(&service.class_name)
            .arg(directive_arg(directive))
            .status()
            .await;
        match result {
            Ok(status) if status.success() => info!(program = %program, "companion service started"),
            Ok(status) => error!(program = %program, %status, "companion service command failed"),
            Err(e) => error!(program = %program, error = %e, "companion service command failed"),
        }
    }
}
