//! `rpctl template`.

use super::{confirm, note, Context};
use clap::{Args, Subcommand};
use rpctl_api::models::{parse_env, parse_ports, TemplateParams};
use rpctl_retries::RpctlResult;
use rpctl_services::TemplateService;

/// Template subcommands.
#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List templates.
    List {
        /// Only serverless templates.
        #[arg(long)]
        serverless: bool,
    },
    /// Show one template.
    Get {
        /// Template ID.
        template_id: String,
    },
    /// Create a template.
    Create(TemplateArgs),
    /// Replace a template's settings.
    Update {
        /// Template ID.
        template_id: String,
        #[command(flatten)]
        args: TemplateArgs,
    },
    /// Delete a template.
    Delete {
        /// Template ID.
        template_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
}

/// Template fields.
#[derive(Debug, Clone, Args)]
pub struct TemplateArgs {
    /// Template name.
    #[arg(long)]
    pub name: String,
    /// Container image.
    #[arg(long)]
    pub image: String,
    /// Container disk in GB.
    #[arg(long)]
    pub container_disk: Option<u32>,
    /// Volume in GB.
    #[arg(long)]
    pub volume_disk: Option<u32>,
    /// Volume mount path.
    #[arg(long)]
    pub volume_mount: Option<String>,
    /// Ports to expose.
    #[arg(long)]
    pub ports: Option<String>,
    /// Environment variable as KEY=VALUE; repeatable.
    #[arg(long)]
    pub env: Vec<String>,
    /// Mark as a serverless template.
    #[arg(long)]
    pub serverless: bool,
    /// Registry credential ID for private images.
    #[arg(long)]
    pub registry_auth: Option<String>,
}

impl TemplateArgs {
    fn into_params(self) -> RpctlResult<TemplateParams> {
        let mut params = TemplateParams::new(self.name, self.image);
        if let Some(gb) = self.container_disk {
            params.container_disk_in_gb = gb;
        }
        if let Some(gb) = self.volume_disk {
            params.volume_in_gb = gb;
        }
        if let Some(path) = self.volume_mount {
            params.volume_mount_path = path;
        }
        if let Some(ports) = self.ports {
            params.ports = parse_ports(&ports);
        }
        params.env = parse_env(&self.env)?;
        params.is_serverless = self.serverless;
        params.container_registry_auth_id = self.registry_auth;
        Ok(params)
    }
}

/// Run a template subcommand.
pub async fn run(ctx: &Context, command: TemplateCommand) -> RpctlResult<()> {
    let service = TemplateService::new(ctx.rest()?);

    match command {
        TemplateCommand::List { serverless } => ctx.print_list(&service.list(serverless).await?),
        TemplateCommand::Get { template_id } => ctx.print_one(&service.get(&template_id).await?),
        TemplateCommand::Create(args) => {
            let template = service.create(&args.into_params()?).await?;
            note(format!("Template {} created.", template.id));
            ctx.print_one(&template)
        }
        TemplateCommand::Update { template_id, args } => {
            ctx.print_one(&service.update(&template_id, &args.into_params()?).await?)
        }
        TemplateCommand::Delete {
            template_id,
            confirm: yes,
        } => {
            if !confirm(&format!("Delete template {template_id}?"), yes)? {
                note("Aborted.");
                return Ok(());
            }
            service.delete(&template_id).await?;
            note(format!("Template {template_id} deleted."));
            Ok(())
        }
    }
}
