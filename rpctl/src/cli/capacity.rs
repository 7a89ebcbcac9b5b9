//! `rpctl capacity`: GPU and CPU types, pricing and regions.

use super::Context;
use clap::Subcommand;
use rpctl_api::models::CloudType;
use rpctl_retries::RpctlResult;
use rpctl_services::{CapacityService, CloudFilter, GpuQuery, GpuSort};

/// Capacity subcommands.
#[derive(Debug, Subcommand)]
pub enum CapacityCommand {
    /// List GPU types with pricing and stock.
    List {
        /// all, secure or community.
        #[arg(long, default_value = "all")]
        cloud: CloudFilter,
        /// Minimum VRAM in GB.
        #[arg(long)]
        min_vram: Option<u32>,
        /// Hide types with no stock.
        #[arg(long)]
        available: bool,
        /// price, vram, name or availability.
        #[arg(long, default_value = "price")]
        sort: GpuSort,
    },
    /// Check one GPU type's availability.
    Check {
        /// GPU type ID, e.g. "NVIDIA A40".
        gpu_type: String,
        /// Number of GPUs wanted.
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// SECURE or COMMUNITY; defaults to the profile setting.
        #[arg(long)]
        cloud_type: Option<CloudType>,
    },
    /// List datacenters.
    Regions {
        /// Only datacenters offering a GPU whose ID or name contains this.
        #[arg(long)]
        gpu: Option<String>,
    },
    /// List CPU types.
    Cpu,
}

/// Run a capacity subcommand.
pub async fn run(ctx: &Context, command: CapacityCommand) -> RpctlResult<()> {
    let service = CapacityService::new(ctx.graphql()?);

    match command {
        CapacityCommand::List {
            cloud,
            min_vram,
            available,
            sort,
        } => {
            let query = GpuQuery {
                cloud,
                min_vram,
                available_only: available,
                sort,
            };
            ctx.print_list(&service.list_gpu_types(&query).await?)
        }
        CapacityCommand::Check {
            gpu_type,
            count,
            cloud_type,
        } => {
            let cloud = match cloud_type {
                Some(cloud) => cloud,
                None => ctx.settings.cloud_type()?,
            };
            let gpu = service
                .check_gpu(&gpu_type, count, cloud == CloudType::Secure)
                .await?;
            ctx.print_one(&gpu)
        }
        CapacityCommand::Regions { gpu } => ctx.print_list(&service.list_regions(gpu.as_deref()).await?),
        CapacityCommand::Cpu => ctx.print_list(&service.list_cpu_types().await?),
    }
}
