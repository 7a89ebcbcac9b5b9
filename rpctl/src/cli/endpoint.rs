//! `rpctl endpoint`: serverless endpoints and their jobs.

use super::pod::WaitArgs;
use super::{confirm, note, Context};
use clap::{Args, Subcommand};
use rpctl_api::models::{EndpointCreateParams, EndpointUpdateParams};
use rpctl_retries::{RpctlError, RpctlResult};
use rpctl_services::EndpointService;
use serde_json::Value;
use std::path::PathBuf;

/// Endpoint subcommands.
#[derive(Debug, Subcommand)]
pub enum EndpointCommand {
    /// List endpoints.
    List,
    /// Show one endpoint.
    Get {
        /// Endpoint ID.
        endpoint_id: String,
    },
    /// Create an endpoint.
    Create(CreateArgs),
    /// Change an endpoint's settings.
    Update {
        /// Endpoint ID.
        endpoint_id: String,
        /// New name.
        #[arg(long)]
        name: Option<String>,
        /// New template ID.
        #[arg(long)]
        template: Option<String>,
        /// Minimum workers.
        #[arg(long)]
        workers_min: Option<u32>,
        /// Maximum workers.
        #[arg(long)]
        workers_max: Option<u32>,
        /// Idle timeout in seconds.
        #[arg(long)]
        idle_timeout: Option<u32>,
    },
    /// Delete an endpoint.
    Delete {
        /// Endpoint ID.
        endpoint_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
    /// Worker and queue health.
    Health {
        /// Endpoint ID.
        endpoint_id: String,
    },
    /// Submit a job.
    Run {
        /// Endpoint ID.
        endpoint_id: String,
        /// Job input as JSON.
        #[arg(long, conflicts_with = "input_file")]
        input: Option<String>,
        /// Read job input from a JSON file.
        #[arg(long)]
        input_file: Option<PathBuf>,
        /// Queue the job and return at once.
        #[arg(long = "async")]
        run_async: bool,
    },
    /// Show a job's status.
    Status {
        /// Endpoint ID.
        endpoint_id: String,
        /// Job ID.
        job_id: String,
        /// Poll until the job finishes.
        #[arg(long)]
        wait: bool,
        #[command(flatten)]
        wait_args: WaitArgs,
    },
    /// Drop every queued job.
    PurgeQueue {
        /// Endpoint ID.
        endpoint_id: String,
        /// Skip the confirmation prompt.
        #[arg(long)]
        confirm: bool,
    },
}

/// Flags for `endpoint create`.
#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    /// Endpoint name.
    #[arg(long)]
    pub name: String,
    /// Template ID.
    #[arg(long)]
    pub template: String,
    /// GPU pool ID; repeatable.
    #[arg(long)]
    pub gpu: Vec<String>,
    /// GPUs per worker.
    #[arg(long, default_value_t = 1)]
    pub gpu_count: u32,
    /// Minimum workers.
    #[arg(long, default_value_t = 0)]
    pub workers_min: u32,
    /// Maximum workers.
    #[arg(long, default_value_t = 3)]
    pub workers_max: u32,
    /// Idle timeout in seconds.
    #[arg(long, default_value_t = 5)]
    pub idle_timeout: u32,
    /// Network volume ID.
    #[arg(long)]
    pub network_volume: Option<String>,
    /// Enable FlashBoot.
    #[arg(long)]
    pub flashboot: bool,
    /// Datacenter ID; repeatable.
    #[arg(long)]
    pub region: Vec<String>,
}

impl From<CreateArgs> for EndpointCreateParams {
    fn from(args: CreateArgs) -> Self {
        let mut params = EndpointCreateParams::new(args.name, args.template);
        if !args.gpu.is_empty() {
            params.gpu_type_ids = args.gpu;
        }
        params.gpu_count = args.gpu_count;
        params.workers_min = args.workers_min;
        params.workers_max = args.workers_max;
        params.idle_timeout = args.idle_timeout;
        params.network_volume_id = args.network_volume;
        params.flashboot = args.flashboot;
        params.data_center_ids = args.region;
        params
    }
}

/// Run an endpoint subcommand.
pub async fn run(ctx: &Context, command: EndpointCommand) -> RpctlResult<()> {
    let service = EndpointService::new(ctx.rest()?);

    match command {
        EndpointCommand::List => ctx.print_list(&service.list().await?),
        EndpointCommand::Get { endpoint_id } => ctx.print_one(&service.get(&endpoint_id).await?),
        EndpointCommand::Create(args) => {
            let endpoint = service.create(&args.into()).await?;
            note(format!("Endpoint {} created.", endpoint.id));
            ctx.print_one(&endpoint)
        }
        EndpointCommand::Update {
            endpoint_id,
            name,
            template,
            workers_min,
            workers_max,
            idle_timeout,
        } => {
            let params = EndpointUpdateParams {
                name,
                template_id: template,
                workers_min,
                workers_max,
                idle_timeout,
            };
            ctx.print_one(&service.update(&endpoint_id, &params).await?)
        }
        EndpointCommand::Delete {
            endpoint_id,
            confirm: yes,
        } => {
            if !confirm(&format!("Delete endpoint {endpoint_id}?"), yes)? {
                note("Aborted.");
                return Ok(());
            }
            service.delete(&endpoint_id).await?;
            note(format!("Endpoint {endpoint_id} deleted."));
            Ok(())
        }
        EndpointCommand::Health { endpoint_id } => ctx.print_value(&service.health(&endpoint_id).await?),
        EndpointCommand::Run {
            endpoint_id,
            input,
            input_file,
            run_async,
        } => {
            let input = read_input(input, input_file)?;
            let job = service.run(&endpoint_id, input, !run_async).await?;
            ctx.print_value(&job)
        }
        EndpointCommand::Status {
            endpoint_id,
            job_id,
            wait,
            wait_args,
        } => {
            let job = if wait {
                let options = wait_args.poll_options(format!("job {job_id}"));
                service.wait_for_job(&endpoint_id, &job_id, &options).await?
            } else {
                service.job_status(&endpoint_id, &job_id).await?
            };
            ctx.print_value(&job)
        }
        EndpointCommand::PurgeQueue {
            endpoint_id,
            confirm: yes,
        } => {
            if !confirm(&format!("Purge the queue of endpoint {endpoint_id}?"), yes)? {
                note("Aborted.");
                return Ok(());
            }
            ctx.print_value(&service.purge_queue(&endpoint_id).await?)
        }
    }
}

/// Parse job input from a flag or a file. No input means `{}`.
fn read_input(inline: Option<String>, file: Option<PathBuf>) -> RpctlResult<Value> {
    let text = match (inline, file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path).map_err(|e| {
            RpctlError::validation(format!("Cannot read {}: {e}", path.display()))
        })?,
        (None, None) => return Ok(Value::Object(Default::default())),
    };
    serde_json::from_str(&text)
        .map_err(|e| RpctlError::validation(format!("Invalid JSON input: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_read_input_variants() {
        assert_eq!(read_input(None, None).unwrap(), json!({}));
        assert_eq!(
            read_input(Some(r#"{"prompt": "hi"}"#.into()), None).unwrap(),
            json!({"prompt": "hi"})
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"n": 2}}"#).unwrap();
        assert_eq!(
            read_input(None, Some(file.path().to_path_buf())).unwrap(),
            json!({"n": 2})
        );
    }

    #[test]
    fn test_bad_input_is_validation_error() {
        let err = read_input(Some("{not json".into()), None).unwrap_err();
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_create_args_keep_default_gpu_pool() {
        let args = CreateArgs {
            name: "sd".into(),
            template: "tpl".into(),
            gpu: Vec::new(),
            gpu_count: 1,
            workers_min: 0,
            workers_max: 2,
            idle_timeout: 5,
            network_volume: None,
            flashboot: true,
            region: Vec::new(),
        };
        let params = EndpointCreateParams::from(args);
        assert_eq!(params.gpu_type_ids, vec!["AMPERE_24"]);
        assert_eq!(params.workers_max, 2);
        assert!(params.flashboot);
    }
}
