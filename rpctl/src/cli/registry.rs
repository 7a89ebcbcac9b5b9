//! `rpctl registry`: container registry credentials.

use super::{confirm, note, Context};
use clap::Subcommand;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use rpctl_api::models::RegistryAuthParams;
use rpctl_retries::{RpctlError, RpctlResult};
use rpctl_services::RegistryService;

/// Registry subcommands.
#[derive(Debug, Subcommand)]
pub enum RegistryCommand {
    /// List registry credentials.
    List,
    /// Show one credential.
    Get {
        /// Credential ID.
        auth_id: String,
    },
    /// Store a credential.
    Create {
        /// Credential name.
        #[arg(long)]
        name: String,
        /// Registry username.
        #[arg(long)]
        username: String,
        /// Registry password; prompted for when omitted.
        #[arg(long, env = "RPCTL_REGISTRY_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Delete a credential.
    Delete {
        /// Credential ID.
        auth_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
}

/// Run a registry subcommand.
pub async fn run(ctx: &Context, command: RegistryCommand) -> RpctlResult<()> {
    let service = RegistryService::new(ctx.rest()?);

    match command {
        RegistryCommand::List => ctx.print_list(&service.list().await?),
        RegistryCommand::Get { auth_id } => ctx.print_one(&service.get(&auth_id).await?),
        RegistryCommand::Create {
            name,
            username,
            password,
        } => {
            let password = match password {
                Some(password) => password,
                None => Password::with_theme(&ColorfulTheme::default())
                    .with_prompt(format!("Password for {username}"))
                    .interact()
                    .map_err(|e| RpctlError::validation(format!("Prompt failed: {e}")))?,
            };
            let params = RegistryAuthParams {
                name,
                username,
                password,
            };
            let auth = service.create(&params).await?;
            note(format!("Registry credential {} created.", auth.id));
            ctx.print_one(&auth)
        }
        RegistryCommand::Delete {
            auth_id,
            confirm: yes,
        } => {
            if !confirm(&format!("Delete registry credential {auth_id}?"), yes)? {
                note("Aborted.");
                return Ok(());
            }
            service.delete(&auth_id).await?;
            note(format!("Registry credential {auth_id} deleted."));
            Ok(())
        }
    }
}
