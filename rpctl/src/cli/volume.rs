//! `rpctl volume`: network volumes.

use super::{confirm, note, Context};
use clap::Subcommand;
use rpctl_api::models::{VolumeCreateParams, VolumeUpdateParams};
use rpctl_retries::RpctlResult;
use rpctl_services::VolumeService;

/// Volume subcommands.
#[derive(Debug, Subcommand)]
pub enum VolumeCommand {
    /// List network volumes.
    List,
    /// Show one volume.
    Get {
        /// Volume ID.
        volume_id: String,
    },
    /// Create a volume.
    Create {
        /// Volume name.
        #[arg(long)]
        name: String,
        /// Size in GB.
        #[arg(long)]
        size: u32,
        /// Datacenter ID.
        #[arg(long)]
        region: String,
    },
    /// Rename or grow a volume.
    Update {
        /// Volume ID.
        volume_id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New size in GB; volumes cannot shrink.
        #[arg(long)]
        size: Option<u32>,
    },
    /// Delete a volume.
    Delete {
        /// Volume ID.
        volume_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
}

/// Run a volume subcommand.
pub async fn run(ctx: &Context, command: VolumeCommand) -> RpctlResult<()> {
    let service = VolumeService::new(ctx.rest()?);

    match command {
        VolumeCommand::List => ctx.print_list(&service.list().await?),
        VolumeCommand::Get { volume_id } => ctx.print_one(&service.get(&volume_id).await?),
        VolumeCommand::Create { name, size, region } => {
            let params = VolumeCreateParams {
                name,
                size,
                data_center_id: region,
            };
            let volume = service.create(&params).await?;
            note(format!("Volume {} created.", volume.id));
            ctx.print_one(&volume)
        }
        VolumeCommand::Update {
            volume_id,
            name,
            size,
        } => {
            let params = VolumeUpdateParams { name, size };
            ctx.print_one(&service.update(&volume_id, &params).await?)
        }
        VolumeCommand::Delete {
            volume_id,
            confirm: yes,
        } => {
            if !confirm(&format!("Delete volume {volume_id}? Its data is lost."), yes)? {
                note("Aborted.");
                return Ok(());
            }
            service.delete(&volume_id).await?;
            note(format!("Volume {volume_id} deleted."));
            Ok(())
        }
    }
}
