//! Rendering results as tables, JSON or YAML.

use comfy_table::{Cell, Color, ContentArrangement, Table};
use rpctl_api::models::{
    CpuType, Datacenter, Endpoint, GpuType, Pod, RegistryAuth, Template, Volume,
};
use rpctl_retries::{RpctlError, RpctlResult};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Table => "table",
            Self::Json => "json",
            Self::Yaml => "yaml",
        })
    }
}

impl FromStr for OutputFormat {
    type Err = RpctlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            other => Err(RpctlError::validation(format!(
                "Invalid output format '{other}'. Use table, json or yaml."
            ))),
        }
    }
}

// ============================================================================
// Table Rows
// ============================================================================

/// A type that renders as one table row.
pub trait Tabular {
    /// Column headers.
    const HEADERS: &'static [&'static str];

    /// Cell values, one per header.
    fn row(&self) -> Vec<String>;
}

fn opt<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn price(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |p| format!("${p:.2}/hr"))
}

impl Tabular for Pod {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Status", "GPU", "Image", "Cost"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.status().to_string(),
            self.gpu_label(),
            self.image_name.clone(),
            price(Some(self.cost_per_hr)),
        ]
    }
}

impl Tabular for Endpoint {
    const HEADERS: &'static [&'static str] =
        &["ID", "Name", "Template", "GPUs", "Workers", "Idle Timeout"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.template_id.clone(),
            self.gpu_type_ids.join(", "),
            format!("{}-{}", self.workers_min, self.workers_max),
            format!("{}s", self.idle_timeout),
        ]
    }
}

impl Tabular for Template {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Image", "Serverless", "Disk"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.image_name.clone(),
            if self.is_serverless { "yes" } else { "no" }.to_string(),
            format!("{} GB", self.container_disk_in_gb),
        ]
    }
}

impl Tabular for Volume {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Size", "Datacenter"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            format!("{} GB", self.size),
            self.data_center_id.clone(),
        ]
    }
}

impl Tabular for RegistryAuth {
    const HEADERS: &'static [&'static str] = &["ID", "Name"];

    fn row(&self) -> Vec<String> {
        vec![self.id.clone(), self.name.clone()]
    }
}

impl Tabular for GpuType {
    const HEADERS: &'static [&'static str] = &[
        "ID", "Name", "VRAM", "Secure", "Community", "On-Demand", "Stock",
    ];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.display_name.clone(),
            format!("{} GB", self.memory_in_gb),
            price(self.price(true)),
            price(self.price(false)),
            price(self.on_demand_price()),
            opt(self.stock_status()),
        ]
    }
}

impl Tabular for CpuType {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Manufacturer", "Cores", "Threads/Core"];

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.display_name.clone(),
            opt(self.manufacturer.as_deref()),
            opt(self.cores),
            opt(self.threads_per_core),
        ]
    }
}

impl Tabular for Datacenter {
    const HEADERS: &'static [&'static str] = &["ID", "Name", "Location", "Storage", "GPUs"];

    fn row(&self) -> Vec<String> {
        let gpus: Vec<&str> = self
            .gpu_availability
            .iter()
            .filter(|g| g.available)
            .map(|g| g.gpu_type_display_name.as_str())
            .collect();
        vec![
            self.id.clone(),
            opt(self.name.as_deref()),
            opt(self.location.as_deref()),
            if self.storage_support { "yes" } else { "no" }.to_string(),
            if gpus.is_empty() { "-".to_string() } else { gpus.join(", ") },
        ]
    }
}

// ============================================================================
// Rendering
// ============================================================================

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(headers.iter().map(|h| Cell::new(h).fg(Color::Cyan)));
    table
}

fn serialize<T: Serialize + ?Sized>(value: &T, format: OutputFormat) -> RpctlResult<String> {
    match format {
        OutputFormat::Yaml => serde_yaml::to_string(value)
            .map(|s| s.trim_end().to_string())
            .map_err(|e| RpctlError::api(format!("Failed to render YAML: {e}"))),
        OutputFormat::Json | OutputFormat::Table => Ok(serde_json::to_string_pretty(value)?),
    }
}

/// Render a list, one row per item.
pub fn render_list<T: Serialize + Tabular>(items: &[T], format: OutputFormat) -> RpctlResult<String> {
    if format != OutputFormat::Table {
        return serialize(items, format);
    }
    if items.is_empty() {
        return Ok("No results.".to_string());
    }
    let mut table = new_table(T::HEADERS);
    for item in items {
        table.add_row(item.row());
    }
    Ok(table.to_string())
}

/// Render one item as a field/value table.
pub fn render_one<T: Serialize + Tabular>(item: &T, format: OutputFormat) -> RpctlResult<String> {
    if format != OutputFormat::Table {
        return serialize(item, format);
    }
    let mut table = new_table(&["Field", "Value"]);
    for (header, value) in T::HEADERS.iter().zip(item.row()) {
        table.add_row(vec![Cell::new(header).fg(Color::Cyan), Cell::new(value)]);
    }
    Ok(table.to_string())
}

/// Render any serializable value. Tables show its top-level fields.
pub fn render_value<T: Serialize>(value: &T, format: OutputFormat) -> RpctlResult<String> {
    if format != OutputFormat::Table {
        return serialize(value, format);
    }
    let map = match serde_json::to_value(value)? {
        Value::Object(map) => map,
        other => return Ok(scalar(&other)),
    };
    let mut table = new_table(&["Field", "Value"]);
    for (key, field) in &map {
        table.add_row(vec![Cell::new(key).fg(Color::Cyan), Cell::new(scalar(field))]);
    }
    Ok(table.to_string())
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
