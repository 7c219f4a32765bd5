//! Dialer Connectivity Funnel CLI
//!
//! Upload a dialer export and print the connectivity dashboard for one campaign.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dialer_funnel::config::SAMPLE_CONFIG;
use dialer_funnel::report::{render_dashboard, render_json, render_raw};
use dialer_funnel::{io, Config, Dataset, FunnelError, OutputFormat, RawTable, SchemaPreset, Session};

const DEFAULT_CONFIG: &str = "dialer-funnel.yaml";

#[derive(Parser)]
#[command(name = "dialer-funnel")]
#[command(about = "Connectivity funnel dashboard for dialer exports", long_about = None)]
struct Cli {
    /// Path to configuration file [default: dialer-funnel.yaml if present]
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Shared secret for the access gate
    #[arg(long, env = "DIALER_FUNNEL_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// Override the upload layout
    #[arg(long, value_enum, global = true)]
    schema: Option<SchemaPreset>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the dashboard for one campaign (default if no command specified)
    Report {
        /// Dialer export (.xlsx, .xlsm, .csv, .tsv or .parquet)
        file: Option<PathBuf>,

        /// Campaign to report on [default: first in sorted order]
        #[arg(long)]
        campaign: Option<String>,

        /// Override the output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,

        /// Also print the filtered raw rows
        #[arg(long)]
        show_raw: bool,

        /// Also save the result record as JSON
        #[arg(long)]
        json_out: Option<PathBuf>,
    },

    /// List the campaigns present in an upload
    Campaigns {
        /// Dialer export
        file: PathBuf,
    },

    /// Validate configuration, and an upload's columns when given
    Validate {
        /// Dialer export to check
        file: Option<PathBuf>,
    },

    /// Generate a sample configuration file
    GenerateConfig {
        /// Output path for configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        None => {
            let config = load_config(cli.config.as_deref(), cli.schema)?;
            let mut session = open_session(&config, cli.password.as_deref())?;
            report_command(&mut session, &config, None, None)?;
        }

        Some(Commands::Report { file, campaign, format, show_raw, json_out }) => {
            let mut config = load_config(cli.config.as_deref(), cli.schema)?;
            if let Some(format) = format {
                config.output.format = format;
            }
            if show_raw {
                config.output.show_raw = true;
            }
            if let Some(path) = json_out {
                config.output.json_path = Some(path.display().to_string());
            }
            config.validate()?;

            let mut session = open_session(&config, cli.password.as_deref())?;
            report_command(&mut session, &config, file.as_deref(), campaign.as_deref())?;
        }

        Some(Commands::Campaigns { file }) => {
            let config = load_config(cli.config.as_deref(), cli.schema)?;
            let mut session = open_session(&config, cli.password.as_deref())?;
            campaigns_command(&mut session, &config, &file)?;
        }

        Some(Commands::Validate { file }) => {
            let config = load_config(cli.config.as_deref(), cli.schema)?;
            config.validate()?;
            println!("Configuration is valid");
            if let Some(file) = file {
                let session = open_session(&config, cli.password.as_deref())?;
                validate_command(&session, &config, &file)?;
            }
        }

        Some(Commands::GenerateConfig { output }) => {
            generate_config_command(output)?;
        }
    }

    Ok(())
}

/// Load the config file, falling back to defaults when the default path is absent.
fn load_config(path: Option<&Path>, schema: Option<SchemaPreset>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None if Path::new(DEFAULT_CONFIG).exists() => Config::from_file(Path::new(DEFAULT_CONFIG))
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG))?,
        None => Config::default(),
    };

    // Apply overrides
    if let Some(preset) = schema {
        config.schema.preset = preset;
        config.schema.mapping = None;
    }

    config.validate()?;
    Ok(config)
}

/// Pass the access gate, prompting on the terminal when no secret was supplied.
fn open_session(config: &Config, password: Option<&str>) -> Result<Session> {
    let gate = config.access.gate();
    let mut session = Session::new();

    if gate.is_open() {
        tracing::warn!("No access secret configured; the gate is open");
        session.login(&gate, None)?;
        return Ok(session);
    }

    let supplied = match password {
        Some(p) => p.to_string(),
        None => prompt_password()?,
    };
    session.login(&gate, Some(&supplied))?;
    Ok(session)
}

fn prompt_password() -> Result<String> {
    eprint!("Enter Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn load_upload(file: Option<&Path>) -> Result<Option<RawTable>> {
    match file {
        Some(path) => {
            let table = io::load_table(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(Some(table))
        }
        None => Ok(None),
    }
}

fn report_command(
    session: &mut Session,
    config: &Config,
    file: Option<&Path>,
    campaign: Option<&str>,
) -> Result<()> {
    let table = load_upload(file)?;

    match session.upload(table.as_ref(), &config.schema) {
        Ok(_) => {}
        Err(FunnelError::MissingFile) => {
            println!("{}", FunnelError::MissingFile);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let dataset = session.dataset()?;
    if let Some(c) = campaign {
        check_campaign(dataset, c)?;
    }

    let report = session.select(campaign)?;
    tracing::info!("{}", report);

    match config.output.format {
        OutputFormat::Text => {
            println!("{}", render_dashboard(&report, config.output.chart_width));
            if config.output.show_raw {
                let rows = match report.campaign.as_deref() {
                    Some(c) => dataset.filter(c),
                    None => Vec::new(),
                };
                if let Some(table) = &table {
                    println!("{}", render_raw(table, dataset.mapping(), &rows));
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", render_json(&report)?);
        }
    }

    if let Some(path) = &config.output.json_path {
        std::fs::write(path, render_json(&report)?)
            .with_context(|| format!("Failed to write {}", path))?;
        tracing::info!("Saved result record to {}", path);
    }

    Ok(())
}

/// Fail unless `campaign` is one of the upload's selector values.
fn check_campaign(dataset: &Dataset, campaign: &str) -> Result<()> {
    let available = dataset.campaigns();
    if !available.iter().any(|a| a == campaign) {
        anyhow::bail!("Campaign '{}' not found. Available: {}", campaign, available.join(", "));
    }
    Ok(())
}

fn campaigns_command(session: &mut Session, config: &Config, file: &Path) -> Result<()> {
    let table = load_upload(Some(file))?;
    let dataset = session.upload(table.as_ref(), &config.schema)?;
    for campaign in dataset.campaigns() {
        println!("{}", campaign);
    }
    Ok(())
}

fn validate_command(session: &Session, config: &Config, file: &Path) -> Result<()> {
    session.require_authenticated()?;
    let table = io::load_table(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let mapping = config.schema.resolve(&table);
    mapping.validate(&table)?;
    println!(
        "{}: {} rows, all {} layout columns present",
        file.display(),
        table.len(),
        mapping.name
    );
    Ok(())
}

fn generate_config_command(output: PathBuf) -> Result<()> {
    std::fs::write(&output, SAMPLE_CONFIG)?;
    println!("Generated sample configuration at: {}", output.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_default() {
        // No subcommand - should default to Report without a file
        let cli = Cli::try_parse_from(["dialer-funnel"]);
        assert!(cli.is_ok());
        assert!(cli.unwrap().command.is_none());
    }

    #[test]
    fn test_cli_parse_report() {
        let cli = Cli::try_parse_from([
            "dialer-funnel",
            "report",
            "dialer.xlsx",
            "--campaign",
            "Spring Promo",
            "--format",
            "json",
            "--show-raw",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Report { file, campaign, format, show_raw, json_out }) => {
                assert_eq!(file, Some(PathBuf::from("dialer.xlsx")));
                assert_eq!(campaign.as_deref(), Some("Spring Promo"));
                assert_eq!(format, Some(OutputFormat::Json));
                assert!(show_raw);
                assert!(json_out.is_none());
            }
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_cli_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "dialer-funnel",
            "campaigns",
            "export.csv",
            "--schema",
            "number-bucket",
            "-c",
            "other.yaml",
        ])
        .unwrap();
        assert_eq!(cli.schema, Some(SchemaPreset::NumberBucket));
        assert_eq!(cli.config, Some(PathBuf::from("other.yaml")));
    }

    #[test]
    fn test_cli_parse_validate() {
        let cli = Cli::try_parse_from(["dialer-funnel", "validate", "-c", "test.json"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_unknown_campaign_lists_available() {
        use dialer_funnel::io::Cell;
        use dialer_funnel::SchemaMapping;

        let headers = ["Leadid", "Attempt", "Campaign", "1-Con/Non Con", "2-Con/Non Con", "Status"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let row = |campaign: &str| {
            vec![
                Cell::Int(1),
                Cell::Int(1),
                Cell::text(campaign),
                Cell::text("Connect"),
                Cell::Empty,
                Cell::text("Closed"),
            ]
        };
        let table = RawTable::new(headers, vec![row("Spring"), row("Autumn"), row("Spring")]);
        let dataset = Dataset::ingest(&table, SchemaMapping::lead_status()).unwrap();

        assert!(check_campaign(&dataset, "Spring").is_ok());

        let message = check_campaign(&dataset, "spring").unwrap_err().to_string();
        assert_eq!(message, "Campaign 'spring' not found. Available: Autumn, Spring");
    }

    #[test]
    fn test_missing_default_config_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yaml");
        assert!(load_config(Some(&path), None).is_err());

        let config = load_config(None, Some(SchemaPreset::LeadStatus)).unwrap();
        assert_eq!(config.schema.preset, SchemaPreset::LeadStatus);
    }
}
