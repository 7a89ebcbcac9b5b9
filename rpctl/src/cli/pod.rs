//! `rpctl pod`: create, inspect, wait on and bulk-manage pods.

use super::{confirm, note, report_batch, Context};
use crate::output::{render_value, OutputFormat};
use clap::{Args, Subcommand};
use rpctl_api::models::{parse_env, parse_ports, CloudType, ComputeType, PodCreateParams};
use rpctl_retries::RpctlResult;
use rpctl_services::{
    BatchOptions, BulkAction, PodService, PollOptions, DEFAULT_POLL_INTERVAL, DEFAULT_POLL_TIMEOUT,
    DEFAULT_WORKERS,
};
use std::time::Duration;

/// Pod subcommands.
#[derive(Debug, Subcommand)]
pub enum PodCommand {
    /// List pods.
    List {
        /// Filter by status (running, exited, ...) or `all`.
        #[arg(long, default_value = "all")]
        status: String,
    },
    /// Show one pod.
    Get {
        /// Pod ID.
        pod_id: String,
    },
    /// Create a pod.
    Create(CreateArgs),
    /// Start (resume) a stopped pod.
    Start {
        /// Pod ID.
        pod_id: String,
    },
    /// Stop a pod.
    Stop {
        /// Pod ID.
        pod_id: String,
    },
    /// Restart a pod.
    Restart {
        /// Pod ID.
        pod_id: String,
    },
    /// Terminate a pod.
    Delete {
        /// Pod ID.
        pod_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
    /// Wait until a pod is running.
    Wait {
        /// Pod ID.
        pod_id: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Stop every running pod.
    StopAll(BulkArgs),
    /// Terminate every pod.
    DeleteAll(BulkArgs),
}

/// Timing for `pod wait` and `pod create --wait`.
#[derive(Debug, Clone, Args)]
pub struct WaitArgs {
    /// Give up after this many seconds.
    #[arg(long, default_value_t = DEFAULT_POLL_TIMEOUT.as_secs())]
    pub timeout: u64,
    /// Seconds between checks.
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    pub interval: u64,
}

impl WaitArgs {
    /// Poll options that report status changes on stderr.
    pub fn poll_options(&self, label: String) -> PollOptions {
        PollOptions::new(label)
            .timeout(Duration::from_secs(self.timeout))
            .interval(Duration::from_secs(self.interval.max(1)))
            .on_progress(|label, status| note(format!("{label}: {status}")))
    }
}

/// Flags for `stop-all` and `delete-all`.
#[derive(Debug, Clone, Args)]
pub struct BulkArgs {
    /// Skip the confirmation prompt.
    #[arg(long)]
    pub confirm: bool,
    /// Run through the bounded worker pool instead of one at a time.
    #[arg(long)]
    pub parallel: bool,
    /// Concurrent workers with --parallel (capped at 20).
    #[arg(long, default_value_t = DEFAULT_WORKERS)]
    pub workers: usize,
    /// Abort on the first failure.
    #[arg(long)]
    pub stop_on_error: bool,
    /// Exit 0 even if some pods failed.
    #[arg(long)]
    pub allow_failures: bool,
}

/// Flags for `pod create`.
#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Container image.
    #[arg(long)]
    pub image: String,
    /// Pod name.
    #[arg(long, default_value = "rpctl-pod")]
    pub name: String,
    /// GPU type ID; repeat for fallbacks.
    #[arg(long)]
    pub gpu: Vec<String>,
    /// Number of GPUs.
    #[arg(long, default_value_t = 1)]
    pub gpu_count: u32,
    /// CPU flavor ID; makes this a CPU pod.
    #[arg(long)]
    pub cpu: Vec<String>,
    /// SECURE or COMMUNITY; defaults to the profile setting.
    #[arg(long)]
    pub cloud_type: Option<CloudType>,
    /// Container disk in GB.
    #[arg(long)]
    pub container_disk: Option<u32>,
    /// Persistent volume in GB.
    #[arg(long)]
    pub volume_disk: Option<u32>,
    /// Volume mount path.
    #[arg(long)]
    pub volume_mount: Option<String>,
    /// Network volume ID.
    #[arg(long)]
    pub network_volume: Option<String>,
    /// Ports to expose, e.g. `8888/http,22/tcp`.
    #[arg(long)]
    pub ports: Option<String>,
    /// Environment variable as KEY=VALUE; repeatable.
    #[arg(long)]
    pub env: Vec<String>,
    /// Template ID.
    #[arg(long)]
    pub template: Option<String>,
    /// Use spot (interruptible) pricing.
    #[arg(long)]
    pub spot: bool,
    /// Datacenter ID; repeatable.
    #[arg(long)]
    pub region: Vec<String>,
    /// Minimum vCPUs per GPU.
    #[arg(long)]
    pub min_vcpu: Option<u32>,
    /// Minimum RAM per GPU in GB.
    #[arg(long)]
    pub min_ram: Option<u32>,
    /// Docker start command.
    #[arg(long)]
    pub docker_start_cmd: Option<String>,
    /// Docker entrypoint override.
    #[arg(long)]
    pub entrypoint: Option<String>,
    /// Request a public IP.
    #[arg(long)]
    pub public_ip: bool,
    /// Allowed CUDA version; repeatable.
    #[arg(long)]
    pub cuda_version: Vec<String>,
    /// Print the request instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
    /// Wait for the pod to be running.
    #[arg(long)]
    pub wait: bool,
    #[command(flatten)]
    pub wait_args: WaitArgs,
}

impl CreateArgs {
    fn into_params(self, default_cloud: CloudType) -> RpctlResult<PodCreateParams> {
        let mut params = PodCreateParams::new(self.image);
        params.name = self.name;
        params.cloud_type = self.cloud_type.unwrap_or(default_cloud);
        params.gpu_count = self.gpu_count;
        params.gpu_type_ids = self.gpu;
        if !self.cpu.is_empty() {
            params.compute_type = ComputeType::Cpu;
            params.cpu_flavor_ids = self.cpu;
        }
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
        if let Some(n) = self.min_vcpu {
            params.min_vcpu_per_gpu = n;
        }
        if let Some(gb) = self.min_ram {
            params.min_ram_per_gpu = gb;
        }
        params.env = parse_env(&self.env)?;
        params.network_volume_id = self.network_volume;
        params.template_id = self.template;
        params.interruptible = self.spot;
        params.data_center_ids = self.region;
        params.support_public_ip = self.public_ip;
        params.allowed_cuda_versions = self.cuda_version;
        params.docker_start_cmd = self.docker_start_cmd.map(split_command).unwrap_or_default();
        params.docker_entrypoint = self.entrypoint.map(split_command).unwrap_or_default();
        Ok(params)
    }
}

fn split_command(cmd: String) -> Vec<String> {
    cmd.split_whitespace().map(str::to_string).collect()
}

/// Run a pod subcommand.
pub async fn run(ctx: &Context, command: PodCommand) -> RpctlResult<()> {
    let service = PodService::new(ctx.rest()?);

    match command {
        PodCommand::List { status } => ctx.print_list(&service.list(Some(status.as_str())).await?),
        PodCommand::Get { pod_id } => ctx.print_one(&service.get(&pod_id).await?),
        PodCommand::Create(args) => create(ctx, &service, args).await,
        PodCommand::Start { pod_id } => {
            service.start(&pod_id).await?;
            note(format!("Pod {pod_id} started."));
            Ok(())
        }
        PodCommand::Stop { pod_id } => {
            service.stop(&pod_id).await?;
            note(format!("Pod {pod_id} stopped."));
            Ok(())
        }
        PodCommand::Restart { pod_id } => {
            service.restart(&pod_id).await?;
            note(format!("Pod {pod_id} restarted."));
            Ok(())
        }
        PodCommand::Delete { pod_id, confirm: yes } => {
            if !confirm(&format!("Terminate pod {pod_id}? This cannot be undone."), yes)? {
                note("Aborted.");
                return Ok(());
            }
            service.delete(&pod_id).await?;
            note(format!("Pod {pod_id} terminated."));
            Ok(())
        }
        PodCommand::Wait { pod_id, wait } => {
            let pod = service
                .wait_until_running(&pod_id, &wait.poll_options(format!("pod {pod_id}")))
                .await?;
            note(format!("Pod {pod_id} is running."));
            ctx.print_one(&pod)
        }
        PodCommand::StopAll(args) => bulk(ctx, &service, BulkAction::Stop, args).await,
        PodCommand::DeleteAll(args) => bulk(ctx, &service, BulkAction::Delete, args).await,
    }
}

async fn create(ctx: &Context, service: &PodService, args: CreateArgs) -> RpctlResult<()> {
    let wait = args.wait.then(|| args.wait_args.clone());
    let dry_run = args.dry_run;
    let params = args.into_params(ctx.settings.cloud_type()?)?;

    if dry_run {
        params.validate()?;
        let format = match ctx.format {
            OutputFormat::Table => OutputFormat::Json,
            other => other,
        };
        println!("{}", render_value(&params, format)?);
        return Ok(());
    }

    let pod = service.create(&params).await?;
    note(format!("Pod {} created.", pod.id));
    let pod = match wait {
        Some(wait) => {
            let label = format!("pod {}", pod.id);
            service.wait_until_running(&pod.id, &wait.poll_options(label)).await?
        }
        None => pod,
    };
    ctx.print_one(&pod)
}

async fn bulk(ctx: &Context, service: &PodService, action: BulkAction, args: BulkArgs) -> RpctlResult<()> {
    let (filter, verb, question) = match action {
        BulkAction::Stop => ("running", "Stopped", "Stop"),
        BulkAction::Delete => ("all", "Terminated", "Terminate"),
    };
    let pods = service.list(Some(filter)).await?;
    if pods.is_empty() {
        note(match action {
            BulkAction::Stop => "No running pods to stop.",
            BulkAction::Delete => "No pods to terminate.",
        });
        return Ok(());
    }

    if !confirm(&format!("{question} {} pod(s)?", pods.len()), args.confirm)? {
        note("Aborted.");
        return Ok(());
    }

    let ids: Vec<String> = pods.into_iter().map(|p| p.id).collect();
    let options = BatchOptions::new()
        .max_workers(args.workers)
        .stop_on_error(args.stop_on_error);
    let result = service.bulk(action, ids, options, args.parallel).await?;

    if ctx.format != OutputFormat::Table {
        ctx.print_value(&serde_json::json!({
            "succeeded": result.succeeded,
            "failed": result
                .failed
                .iter()
                .map(|(id, err)| serde_json::json!({"id": id, "error": err.to_string()}))
                .collect::<Vec<_>>(),
        }))?;
    }
    report_batch(verb, &result, args.allow_failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Harness {
        #[command(subcommand)]
        command: PodCommand,
    }

    fn parse(args: &[&str]) -> PodCommand {
        Harness::try_parse_from(std::iter::once("pod").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    #[test]
    fn test_bulk_flags() {
        let PodCommand::StopAll(args) = parse(&["stop-all", "--parallel", "--workers", "50", "--confirm"])
        else {
            panic!("expected stop-all");
        };
        assert!(args.parallel && args.confirm);
        assert_eq!(args.workers, 50);
        assert!(!args.stop_on_error && !args.allow_failures);
    }

    #[test]
    fn test_wait_defaults() {
        let PodCommand::Wait { pod_id, wait } = parse(&["wait", "abc"]) else {
            panic!("expected wait");
        };
        assert_eq!(pod_id, "abc");
        assert_eq!(wait.timeout, 300);
        assert_eq!(wait.interval, 5);
    }

    #[test]
    fn test_create_args_to_params() {
        let PodCommand::Create(args) = parse(&[
            "create",
            "--image",
            "runpod/base",
            "--cpu",
            "cpu3c",
            "--env",
            "A=1",
            "--ports",
            "22/tcp",
            "--docker-start-cmd",
            "bash -c sleep",
        ]) else {
            panic!("expected create");
        };
        let params = args.into_params(CloudType::Community).unwrap();
        assert_eq!(params.compute_type, ComputeType::Cpu);
        assert_eq!(params.cloud_type, CloudType::Community);
        assert_eq!(params.env.get("A").map(String::as_str), Some("1"));
        assert_eq!(params.ports, vec!["22/tcp"]);
        assert_eq!(params.docker_start_cmd, vec!["bash", "-c", "sleep"]);
        params.validate().unwrap();
    }

    #[test]
    fn test_bad_env_rejected() {
        let PodCommand::Create(args) = parse(&["create", "--image", "x", "--env", "NOEQUALS"]) else {
            panic!("expected create");
        };
        assert_eq!(args.into_params(CloudType::Secure).unwrap_err().exit_code(), 7);
    }
}
