//! Command handlers.
//!
//! Each submodule owns one `rpctl <noun>` group: its clap arguments and
//! an async `run` that returns an [`RpctlError`] for `main` to map to an
//! exit code.

pub mod capacity;
pub mod config;
pub mod endpoint;
pub mod pod;
pub mod registry;
pub mod template;
pub mod user;
pub mod volume;

use crate::output::{render_list, render_one, render_value, OutputFormat, Tabular};
use crate::settings::Settings;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Confirm;
use rpctl_api::{GraphQLClient, RestClient};
use rpctl_retries::{RpctlError, RpctlResult};
use rpctl_services::BatchResult;
use serde::Serialize;
use std::sync::Arc;

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// `--profile`.
    pub profile: Option<String>,
    /// `--output`, or `json` when `--json` was given.
    pub output: Option<OutputFormat>,
}

/// Loaded settings plus the resolved output format.
#[derive(Debug, Clone)]
pub struct Context {
    /// Settings for the active profile.
    pub settings: Settings,
    /// Output format for this run.
    pub format: OutputFormat,
}

impl Context {
    /// Load settings for `options`.
    pub fn load(options: &GlobalOptions) -> RpctlResult<Self> {
        let settings = Settings::load(options.profile.as_deref())?;
        let format = match options.output {
            Some(format) => format,
            None => settings.output_format()?,
        };
        Ok(Self { settings, format })
    }

    /// REST client for the active profile.
    pub fn rest(&self) -> RpctlResult<Arc<RestClient>> {
        Ok(Arc::new(RestClient::new(self.settings.api_key()?)?))
    }

    /// GraphQL client for the active profile.
    pub fn graphql(&self) -> RpctlResult<Arc<GraphQLClient>> {
        Ok(Arc::new(GraphQLClient::new(self.settings.api_key()?)?))
    }

    /// Print a list.
    pub fn print_list<T: Serialize + Tabular>(&self, items: &[T]) -> RpctlResult<()> {
        println!("{}", render_list(items, self.format)?);
        Ok(())
    }

    /// Print one resource.
    pub fn print_one<T: Serialize + Tabular>(&self, item: &T) -> RpctlResult<()> {
        println!("{}", render_one(item, self.format)?);
        Ok(())
    }

    /// Print an arbitrary value.
    pub fn print_value<T: Serialize>(&self, value: &T) -> RpctlResult<()> {
        println!("{}", render_value(value, self.format)?);
        Ok(())
    }
}

/// Progress or status note on stderr, kept out of parseable output.
pub fn note(message: impl AsRef<str>) {
    eprintln!("{}", message.as_ref());
}

/// Ask a yes/no question unless `skip` is set.
pub fn confirm(prompt: &str, skip: bool) -> RpctlResult<bool> {
    if skip {
        return Ok(true);
    }
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| RpctlError::validation(format!("Confirmation failed: {e}")))
}

/// Print a batch summary and one line per failure.
///
/// Returns [`RpctlError::PartialFailure`] when any item failed, unless
/// `allow_failures` is set.
pub fn report_batch(
    verb: &str,
    result: &BatchResult<String, String>,
    allow_failures: bool,
) -> RpctlResult<()> {
    note(format!(
        "{verb} {} of {} pod(s); {} failed.",
        result.succeeded.len(),
        result.total(),
        result.failed.len()
    ));
    for (pod_id, error) in &result.failed {
        note(format!("  {pod_id}: {error}"));
    }
    if allow_failures {
        return Ok(());
    }
    result.check()
}
