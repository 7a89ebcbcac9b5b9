//! Configuration file and profile resolution.
//!
//! The config lives at `$XDG_CONFIG_HOME/rpctl/config.yaml`, or under the
//! platform config directory when `XDG_CONFIG_HOME` is unset. Values
//! resolve profile first, then `defaults`, then the built-in default.

use crate::output::OutputFormat;
use anyhow::Context;
use rpctl_api::models::CloudType;
use rpctl_retries::{RpctlError, RpctlResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides any stored API key.
pub const API_KEY_ENV: &str = "RUNPOD_API_KEY";

/// Directory name under the config root.
pub const CONFIG_DIR_NAME: &str = "rpctl";

/// Config file name.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Profile created by `config init` when none is named.
pub const DEFAULT_PROFILE: &str = "default";

/// Current config schema version.
pub const CONFIG_VERSION: u32 = 1;

// ============================================================================
// File Schema
// ============================================================================

/// On-disk layout of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Schema version.
    pub version: u32,
    /// Profile used when `--profile` is not given.
    pub active_profile: String,
    /// Fallback values for every profile.
    pub defaults: ProfileValues,
    /// Named profiles.
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            active_profile: DEFAULT_PROFILE.to_string(),
            defaults: ProfileValues::default(),
            profiles: BTreeMap::new(),
        }
    }
}

/// Values that a profile or the `defaults` block may set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileValues {
    /// `secure` or `community`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cloud_type: Option<String>,
    /// `table`, `json` or `yaml`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
}

/// A named profile.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Profile-level overrides.
    #[serde(flatten)]
    pub values: ProfileValues,
    /// Stored API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("values", &self.values)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Keys accepted by `config set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum SettingKey {
    /// Default cloud type.
    CloudType,
    /// Default output format.
    OutputFormat,
}

// ============================================================================
// Settings
// ============================================================================

/// Loaded configuration plus the profile in effect for this run.
#[derive(Debug, Clone)]
pub struct Settings {
    data: ConfigFile,
    path: PathBuf,
    profile: String,
}

/// Resolve the config file path from an optional `XDG_CONFIG_HOME`.
pub fn config_path_from(xdg_config_home: Option<PathBuf>) -> RpctlResult<PathBuf> {
    let root = xdg_config_home
        .filter(|p| !p.as_os_str().is_empty())
        .or_else(dirs::config_dir)
        .ok_or_else(|| RpctlError::config("Could not determine a config directory."))?;
    Ok(root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// The config file path for this environment.
pub fn config_path() -> RpctlResult<PathBuf> {
    config_path_from(std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from))
}

impl Settings {
    /// Load from the default path. `profile` overrides the active profile.
    pub fn load(profile: Option<&str>) -> RpctlResult<Self> {
        Self::load_from(&config_path()?, profile)
    }

    /// Load from `path`.
    pub fn load_from(path: &Path, profile: Option<&str>) -> RpctlResult<Self> {
        if !path.exists() {
            return Err(RpctlError::config(format!(
                "Config file not found: {}. Run 'rpctl config init'.",
                path.display()
            )));
        }
        let text = fs::read_to_string(path)
            .map_err(|e| RpctlError::config(format!("Failed to read {}: {e}", path.display())))?;
        let data: ConfigFile = if text.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(&text).map_err(|e| {
                RpctlError::config(format!("Invalid config file {}: {e}", path.display()))
            })?
        };

        let profile = profile
            .map(str::to_string)
            .unwrap_or_else(|| data.active_profile.clone());
        Ok(Self {
            data,
            path: path.to_path_buf(),
            profile,
        })
    }

    /// A fresh config with one profile, not yet written.
    pub fn create_default(path: PathBuf, profile: &str, cloud_type: CloudType) -> Self {
        let cloud = cloud_type_name(cloud_type).to_string();
        let mut profiles = BTreeMap::new();
        profiles.insert(
            profile.to_string(),
            Profile {
                values: ProfileValues {
                    cloud_type: Some(cloud.clone()),
                    output_format: None,
                },
                api_key: None,
            },
        );
        Self {
            data: ConfigFile {
                version: CONFIG_VERSION,
                active_profile: profile.to_string(),
                defaults: ProfileValues {
                    cloud_type: Some(cloud),
                    output_format: Some(OutputFormat::Table.to_string()),
                },
                profiles,
            },
            path,
            profile: profile.to_string(),
        }
    }

    /// Write the config, creating its directory.
    pub fn save(&self) -> RpctlResult<()> {
        self.write().map_err(|e| RpctlError::config(format!("{e:#}")))
    }

    fn write(&self) -> anyhow::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        let text = serde_yaml::to_string(&self.data).context("Failed to serialize config")?;
        fs::write(&self.path, text)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    /// Path this config was loaded from or will be saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Profile in effect for this run.
    pub fn active_profile(&self) -> &str {
        &self.profile
    }

    /// Profile names, sorted.
    pub fn profiles(&self) -> Vec<&str> {
        self.data.profiles.keys().map(String::as_str).collect()
    }

    /// Resolve the API key: `RUNPOD_API_KEY`, then the active profile.
    pub fn api_key(&self) -> RpctlResult<String> {
        self.api_key_with(std::env::var(API_KEY_ENV).ok())
    }

    fn api_key_with(&self, env_key: Option<String>) -> RpctlResult<String> {
        env_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| {
                self.data
                    .profiles
                    .get(&self.profile)
                    .and_then(|p| p.api_key.clone())
                    .filter(|k| !k.trim().is_empty())
            })
            .ok_or_else(|| {
                RpctlError::authentication(format!(
                    "No API key found for profile '{}'. Run 'rpctl config set-key' or set {API_KEY_ENV}.",
                    self.profile
                ))
            })
    }

    /// Whether an API key is available.
    pub fn has_api_key(&self) -> bool {
        self.api_key().is_ok()
    }

    /// Look up `key`: active profile, then `defaults`.
    pub fn get(&self, key: SettingKey) -> Option<&str> {
        fn pick(key: SettingKey, values: &ProfileValues) -> Option<&str> {
            match key {
                SettingKey::CloudType => values.cloud_type.as_deref(),
                SettingKey::OutputFormat => values.output_format.as_deref(),
            }
        }
        self.data
            .profiles
            .get(&self.profile)
            .and_then(|p| pick(key, &p.values))
            .or_else(|| pick(key, &self.data.defaults))
    }

    /// Configured cloud type, falling back to secure.
    pub fn cloud_type(&self) -> RpctlResult<CloudType> {
        self.get(SettingKey::CloudType)
            .map_or(Ok(CloudType::default()), str::parse)
    }

    /// Configured output format, falling back to table.
    pub fn output_format(&self) -> RpctlResult<OutputFormat> {
        self.get(SettingKey::OutputFormat)
            .map_or(Ok(OutputFormat::default()), str::parse)
    }

    /// Set `key` on the active profile. The value is validated first.
    pub fn set(&mut self, key: SettingKey, value: &str) -> RpctlResult<()> {
        let value = match key {
            SettingKey::CloudType => cloud_type_name(value.parse()?).to_string(),
            SettingKey::OutputFormat => value.parse::<OutputFormat>()?.to_string(),
        };
        let profile = self.profile_mut();
        match key {
            SettingKey::CloudType => profile.values.cloud_type = Some(value),
            SettingKey::OutputFormat => profile.values.output_format = Some(value),
        }
        Ok(())
    }

    /// Store an API key on the active profile.
    pub fn set_api_key(&mut self, api_key: &str) -> RpctlResult<()> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(RpctlError::validation("API key cannot be empty."));
        }
        self.profile_mut().api_key = Some(api_key.to_string());
        Ok(())
    }

    /// Add a profile. Fails if it already exists.
    pub fn add_profile(&mut self, name: &str, cloud_type: Option<CloudType>) -> RpctlResult<()> {
        if self.data.profiles.contains_key(name) {
            return Err(RpctlError::config(format!("Profile '{name}' already exists.")));
        }
        let values = ProfileValues {
            cloud_type: cloud_type.map(|c| cloud_type_name(c).to_string()),
            output_format: None,
        };
        self.data.profiles.insert(
            name.to_string(),
            Profile {
                values,
                api_key: None,
            },
        );
        Ok(())
    }

    /// Make `name` the saved active profile.
    pub fn use_profile(&mut self, name: &str) -> RpctlResult<()> {
        if !self.data.profiles.contains_key(name) {
            return Err(RpctlError::config(format!(
                "Profile '{name}' not found. Available: {}",
                self.profiles().join(", ")
            )));
        }
        self.data.active_profile = name.to_string();
        self.profile = name.to_string();
        Ok(())
    }

    fn profile_mut(&mut self) -> &mut Profile {
        self.data.profiles.entry(self.profile.clone()).or_default()
    }
}

fn cloud_type_name(cloud_type: CloudType) -> &'static str {
    match cloud_type {
        CloudType::Secure => "secure",
        CloudType::Community => "community",
    }
}
