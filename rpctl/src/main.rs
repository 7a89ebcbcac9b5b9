//! rpctl - manage RunPod pods, serverless endpoints, volumes and capacity.

mod cli;
mod output;
mod settings;

use clap::{Parser, Subcommand};
use cli::capacity::CapacityCommand;
use cli::config::ConfigCommand;
use cli::endpoint::EndpointCommand;
use cli::pod::PodCommand;
use cli::registry::RegistryCommand;
use cli::template::TemplateCommand;
use cli::user::UserCommand;
use cli::volume::VolumeCommand;
use cli::{Context, GlobalOptions};
use output::OutputFormat;
use rpctl_retries::RpctlResult;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// RunPod CLI: manage pods, endpoints, volumes and capacity.
#[derive(Debug, Parser)]
#[command(name = "rpctl", version, about, arg_required_else_help = true)]
struct Cli {
    /// Config profile to use.
    #[arg(long, global = true, env = "RPCTL_PROFILE")]
    profile: Option<String>,

    /// Output format.
    #[arg(short, long, global = true, value_enum)]
    output: Option<OutputFormat>,

    /// Shorthand for `--output json`.
    #[arg(long, global = true)]
    json: bool,

    /// Debug logging on stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Manage configuration and profiles.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Manage GPU and CPU pods.
    #[command(subcommand)]
    Pod(PodCommand),
    /// Manage serverless endpoints.
    #[command(subcommand)]
    Endpoint(EndpointCommand),
    /// Manage templates.
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Manage network volumes.
    #[command(subcommand)]
    Volume(VolumeCommand),
    /// Manage container registry credentials.
    #[command(subcommand)]
    Registry(RegistryCommand),
    /// Query GPU and CPU availability and pricing.
    #[command(subcommand)]
    Capacity(CapacityCommand),
    /// Show account details.
    #[command(subcommand)]
    User(UserCommand),
}

impl Cli {
    fn global_options(&self) -> GlobalOptions {
        GlobalOptions {
            profile: self.profile.clone(),
            output: self.output.or(self.json.then_some(OutputFormat::Json)),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Cli) -> RpctlResult<()> {
    let options = args.global_options();
    let context = || Context::load(&options);

    match args.command {
        Commands::Config(command) => cli::config::run(&options, command),
        Commands::Pod(command) => cli::pod::run(&context()?, command).await,
        Commands::Endpoint(command) => cli::endpoint::run(&context()?, command).await,
        Commands::Template(command) => cli::template::run(&context()?, command).await,
        Commands::Volume(command) => cli::volume::run(&context()?, command).await,
        Commands::Registry(command) => cli::registry::run(&context()?, command).await,
        Commands::Capacity(command) => cli::capacity::run(&context()?, command).await,
        Commands::User(command) => cli::user::run(&context()?, command).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();
    init_tracing(args.verbose);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_json_shorthand() {
        let cli = Cli::try_parse_from(["rpctl", "--json", "pod", "list"]).unwrap();
        assert_eq!(cli.global_options().output, Some(OutputFormat::Json));

        let cli = Cli::try_parse_from(["rpctl", "pod", "list", "-o", "yaml", "--json"]).unwrap();
        assert_eq!(cli.global_options().output, Some(OutputFormat::Yaml));
    }

    #[test]
    fn test_global_profile_after_subcommand() {
        let cli = Cli::try_parse_from(["rpctl", "capacity", "list", "--profile", "lab"]).unwrap();
        assert_eq!(cli.profile.as_deref(), Some("lab"));
    }
}
