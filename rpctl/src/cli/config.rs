//! `rpctl config`: create and inspect the config file and its profiles.

use super::{note, GlobalOptions};
use crate::output::{render_value, OutputFormat};
use crate::settings::{config_path, SettingKey, Settings, DEFAULT_PROFILE};
use clap::Subcommand;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use rpctl_api::models::CloudType;
use rpctl_retries::{RpctlError, RpctlResult};
use serde_json::json;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create the config file and a first profile.
    Init {
        /// API key; prompted for when omitted.
        #[arg(long, env = "RUNPOD_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
        /// Profile name.
        #[arg(long, default_value = DEFAULT_PROFILE)]
        name: String,
        /// Default cloud type (secure or community).
        #[arg(long, default_value = "secure")]
        cloud_type: CloudType,
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },
    /// Show the active configuration with the API key redacted.
    Show,
    /// Store an API key on a profile.
    SetKey {
        /// API key; prompted for when omitted.
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Set a value on the active profile.
    Set {
        /// Setting name.
        #[arg(value_enum)]
        key: SettingKey,
        /// New value.
        value: String,
    },
    /// List profiles.
    ListProfiles,
    /// Add a profile.
    AddProfile {
        /// Profile name.
        name: String,
        /// Default cloud type for the profile.
        #[arg(long)]
        cloud_type: Option<CloudType>,
    },
    /// Make a profile the active one.
    UseProfile {
        /// Profile name.
        name: String,
    },
}

/// Run a config subcommand.
pub fn run(options: &GlobalOptions, command: ConfigCommand) -> RpctlResult<()> {
    let format = options.output.unwrap_or_default();
    match command {
        ConfigCommand::Init {
            api_key,
            name,
            cloud_type,
            force,
        } => init(api_key, &name, cloud_type, force),
        ConfigCommand::Show => show(options, format),
        ConfigCommand::SetKey { api_key } => {
            let mut settings = Settings::load(options.profile.as_deref())?;
            let api_key = match api_key {
                Some(key) => key,
                None => prompt_secret(&format!(
                    "API key for profile '{}'",
                    settings.active_profile()
                ))?,
            };
            settings.set_api_key(&api_key)?;
            settings.save()?;
            note(format!("API key stored for profile '{}'.", settings.active_profile()));
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut settings = Settings::load(options.profile.as_deref())?;
            settings.set(key, &value)?;
            settings.save()?;
            note(format!("Updated profile '{}'.", settings.active_profile()));
            Ok(())
        }
        ConfigCommand::ListProfiles => {
            let settings = Settings::load(options.profile.as_deref())?;
            let data = json!({
                "active": settings.active_profile(),
                "profiles": settings.profiles(),
            });
            if format == OutputFormat::Table {
                for name in settings.profiles() {
                    let marker = if name == settings.active_profile() { "*" } else { " " };
                    println!("{marker} {name}");
                }
                return Ok(());
            }
            println!("{}", render_value(&data, format)?);
            Ok(())
        }
        ConfigCommand::AddProfile { name, cloud_type } => {
            let mut settings = Settings::load(None)?;
            settings.add_profile(&name, cloud_type)?;
            settings.save()?;
            note(format!("Profile '{name}' added."));
            Ok(())
        }
        ConfigCommand::UseProfile { name } => {
            let mut settings = Settings::load(None)?;
            settings.use_profile(&name)?;
            settings.save()?;
            note(format!("Active profile is now '{name}'."));
            Ok(())
        }
    }
}

fn init(api_key: Option<String>, name: &str, cloud_type: CloudType, force: bool) -> RpctlResult<()> {
    let path = config_path()?;
    if path.exists() && !force {
        return Err(RpctlError::config(format!(
            "Config file already exists: {}. Use --force to overwrite.",
            path.display()
        )));
    }

    let api_key = match api_key {
        Some(key) => key,
        None => prompt_secret("RunPod API key")?,
    };
    let mut settings = Settings::create_default(path, name, cloud_type);
    settings.set_api_key(&api_key)?;
    settings.save()?;

    note(format!(
        "Configuration saved to {}. Active profile: {name}",
        settings.path().display()
    ));
    note("Try: rpctl capacity list");
    Ok(())
}

fn show(options: &GlobalOptions, format: OutputFormat) -> RpctlResult<()> {
    let settings = Settings::load(options.profile.as_deref())?;
    let data = json!({
        "active_profile": settings.active_profile(),
        "cloud_type": settings.cloud_type()?,
        "output_format": settings.output_format()?.to_string(),
        "api_key": if settings.has_api_key() { "set" } else { "not set" },
        "config_path": settings.path().display().to_string(),
    });
    println!("{}", render_value(&data, format)?);
    Ok(())
}

fn prompt_secret(prompt: &str) -> RpctlResult<String> {
    Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .interact()
        .map_err(|e| RpctlError::validation(format!("Prompt failed: {e}")))
}
