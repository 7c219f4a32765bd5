//! Configuration for the connectivity dashboard.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::io::RawTable;
use crate::schema::{SchemaMapping, SchemaPreset};
use crate::session::AccessGate;

/// Main configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upload layout selection
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Access gate
    #[serde(default)]
    pub access: AccessConfig,

    /// Report output
    #[serde(default)]
    pub output: OutputConfig,
}

/// Upload layout selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Named layout, or `auto` to detect from the header row
    #[serde(default)]
    pub preset: SchemaPreset,

    /// Full column mapping; takes precedence over `preset` when set
    #[serde(default)]
    pub mapping: Option<SchemaMapping>,
}

impl SchemaConfig {
    /// Layout selection for a fixed preset.
    pub fn preset(preset: SchemaPreset) -> Self {
        Self { preset, mapping: None }
    }

    /// Resolve the mapping for an uploaded table.
    pub fn resolve(&self, table: &RawTable) -> SchemaMapping {
        match &self.mapping {
            Some(mapping) => mapping.clone(),
            None => self.preset.resolve(table),
        }
    }
}

/// Shared-secret gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Shared secret. When unset the gate is open.
    #[serde(default)]
    pub secret: Option<String>,
}

impl AccessConfig {
    /// Build the gate for this configuration.
    pub fn gate(&self) -> AccessGate {
        AccessGate::new(self.secret.clone())
    }
}

/// Report rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Dashboard layout for the terminal
    #[default]
    Text,
    /// Result record as JSON
    Json,
}

/// Report output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Rendering format
    #[serde(default)]
    pub format: OutputFormat,

    /// Include the filtered raw rows below the dashboard
    #[serde(default)]
    pub show_raw: bool,

    /// Width in characters of the longest bar in the bucket chart
    #[serde(default = "default_chart_width")]
    pub chart_width: usize,

    /// Optional path to also save the result record as JSON
    #[serde(default)]
    pub json_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            show_raw: false,
            chart_width: default_chart_width(),
            json_path: None,
        }
    }
}

fn default_chart_width() -> usize { 40 }

impl Config {
    /// Load configuration from a YAML or JSON file.
    /// Format is auto-detected from file extension (.yaml, .yml, or .json).
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        let config: Config = match ext {
            "json" => serde_json::from_str(&contents)?,
            // YAML is a superset of JSON
            _ => serde_yaml::from_str(&contents)?,
        };
        Ok(config)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Serialize configuration to YAML.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(secret) = &self.access.secret {
            if secret.is_empty() {
                anyhow::bail!("access.secret must not be empty (omit it to disable the gate)");
            }
        }

        if self.output.chart_width == 0 {
            anyhow::bail!("output.chart_width must be > 0");
        }

        if let Some(mapping) = &self.schema.mapping {
            let columns = mapping.required_columns();
            if columns.iter().any(|c| c.is_empty()) {
                anyhow::bail!("schema.mapping column names must not be empty");
            }
            for (i, column) in columns.iter().enumerate() {
                if columns[..i].contains(column) {
                    anyhow::bail!("schema.mapping uses column '{}' for two fields", column);
                }
            }
        }
        Ok(())
    }
}

/// Commented sample configuration written by `generate-config`.
pub const SAMPLE_CONFIG: &str = r#"# Dialer connectivity dashboard configuration

# === SCHEMA: Which export layout uploads use ===
schema:
  # auto          - detect from the header row
  # lead_status   - Leadid, Attempt, Campaign, 1-Con/Non Con, 2-Con/Non Con, Status
  # number_bucket - Numb, Attempt, Campaign, 1-Con/Non Con, 2-Con/Non Con, Bucket
  preset: auto

  # Full column mapping for other layouts (overrides preset)
  # mapping:
  #   name: custom
  #   identifier: "Lead ID"
  #   attempt: "Attempt"
  #   campaign: "Campaign"
  #   first_outcome: "1-Con/Non Con"
  #   second_outcome: "2-Con/Non Con"
  #   bucket:
  #     kind: derived          # or: kind: column / column: "Bucket"
  #     status_column: "Status"
  #     pending_value: "pending"
  #   normalize_outcomes: false
  #   coerce_identifier: false

# === ACCESS: Shared secret required before any upload ===
access:
  # Omit to disable the gate. Can also be supplied per run with --password
  # or DIALER_FUNNEL_PASSWORD.
  secret: "change-me"

# === OUTPUT: Report rendering ===
output:
  # text (dashboard) or json (result record)
  format: text

  # Print the filtered raw rows below the dashboard
  show_raw: false

  # Width of the longest bar in the bucket chart
  chart_width: 40

  # Also save the result record as JSON
  # json_path: "report.json"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::BucketSource;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema.preset, SchemaPreset::Auto);
        assert!(config.schema.mapping.is_none());
        assert!(config.access.secret.is_none());
        assert_eq!(config.output.format, OutputFormat::Text);
        assert_eq!(config.output.chart_width, 40);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_yaml(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.access.secret.as_deref(), Some("change-me"));
        assert!(!config.output.show_raw);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{"schema": {"preset": "number_bucket"}, "output": {"format": "json"}}"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.schema.preset, SchemaPreset::NumberBucket);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.output.chart_width, 40);
    }

    #[test]
    fn test_yaml_roundtrip_keeps_mapping() {
        let mut config = Config::default();
        config.schema.mapping = Some(SchemaMapping::number_bucket());
        let yaml = config.to_yaml().unwrap();
        let parsed = Config::from_yaml(&yaml).unwrap();
        let mapping = parsed.schema.mapping.unwrap();
        assert_eq!(
            mapping.bucket,
            BucketSource::Column { column: "Bucket".to_string() }
        );
        assert!(mapping.coerce_identifier);
    }

    #[test]
    fn test_explicit_mapping_overrides_preset() {
        let table = RawTable::new(vec!["Leadid".to_string()], vec![]);
        let schema = SchemaConfig {
            preset: SchemaPreset::LeadStatus,
            mapping: Some(SchemaMapping::number_bucket()),
        };
        assert_eq!(schema.resolve(&table).name, "number_bucket");
        assert_eq!(SchemaConfig::preset(SchemaPreset::LeadStatus).resolve(&table).name, "lead_status");
    }

    #[test]
    fn test_config_validation_invalid() {
        let mut config = Config::default();
        config.access.secret = Some(String::new());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.output.chart_width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        let mut mapping = SchemaMapping::lead_status();
        mapping.second_outcome = mapping.first_outcome.clone();
        config.schema.mapping = Some(mapping);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_detects_format() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("config.yaml");
        std::fs::write(&yaml_path, "output:\n  show_raw: true\n").unwrap();
        assert!(Config::from_file(&yaml_path).unwrap().output.show_raw);

        let json_path = dir.path().join("config.json");
        std::fs::write(&json_path, r#"{"access": {"secret": "x"}}"#).unwrap();
        assert_eq!(
            Config::from_file(&json_path).unwrap().access.secret.as_deref(),
            Some("x")
        );
    }
}
