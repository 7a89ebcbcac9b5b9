//! `rpctl user`: account details and SSH key.

use super::{note, Context};
use clap::Subcommand;
use rpctl_retries::{RpctlError, RpctlResult};
use rpctl_services::UserService;
use std::path::PathBuf;

/// User subcommands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Show balance, spend and key.
    Info,
    /// Replace the account's SSH public key.
    SetSshKey {
        /// Path to the public key file.
        #[arg(long, default_value = "~/.ssh/id_ed25519.pub")]
        key_file: String,
    },
}

/// Run a user subcommand.
pub async fn run(ctx: &Context, command: UserCommand) -> RpctlResult<()> {
    let service = UserService::new(ctx.graphql()?);

    match command {
        UserCommand::Info => ctx.print_value(&service.info().await?),
        UserCommand::SetSshKey { key_file } => {
            let path = expand_home(&key_file);
            let key = std::fs::read_to_string(&path).map_err(|e| {
                RpctlError::validation(format!("Cannot read {}: {e}", path.display()))
            })?;
            service.set_ssh_key(&key).await?;
            note(format!("SSH key from {} installed.", path.display()));
            Ok(())
        }
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
