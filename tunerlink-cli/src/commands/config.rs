//! `tunerlink config` command handler

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tunerlink_core::config::TunerTestConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Sections accepted by `config show --section`.
pub const SECTIONS: &[&str] = &[
    "general",
    "dataflow",
    "frontends",
    "demuxes",
    "filters",
    "dvrs",
    "lnbs",
    "descramblers",
    "time_filters",
    "diseqc_messages",
    "connections",
];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
        ConfigAction::Path => writer.render(&ConfigPathReport {
            path: config_path.display().to_string(),
            exists: tokio::fs::try_exists(config_path).await.unwrap_or(false),
        }),
    }
}

/// Loads and displays the effective configuration (file + env overrides + defaults).
///
/// # Errors
///
/// Returns `CliError::NotApplicable` if the file is absent, `CliError::Config` if
/// loading fails, or `CliError::Command` if the section name is invalid.
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    info!(path = %config_path.display(), "loading tuner configuration");

    let config = load_config(config_path).await?;
    let config_toml = render_section(&config, section.as_deref())?;

    writer.render(&ConfigReport {
        source: config_path.display().to_string(),
        section,
        config_toml,
    })
}

/// Serialize the whole configuration or one section to TOML.
pub fn render_section(config: &TunerTestConfig, section: Option<&str>) -> Result<String, CliError> {
    let Some(name) = section else {
        return to_toml(config);
    };

    match name {
        "general" => to_toml(&config.general),
        "dataflow" => to_toml(&config.dataflow),
        "frontends" => array_section(name, &config.frontends),
        "demuxes" => array_section(name, &config.demuxes),
        "filters" => array_section(name, &config.filters),
        "dvrs" => array_section(name, &config.dvrs),
        "lnbs" => array_section(name, &config.lnbs),
        "descramblers" => array_section(name, &config.descramblers),
        "time_filters" => array_section(name, &config.time_filters),
        "diseqc_messages" => array_section(name, &config.diseqc_messages),
        "connections" => array_section(name, &config.connections),
        _ => Err(CliError::Command(format!(
            "unknown section: {} (expected: {})",
            name,
            SECTIONS.join(", ")
        ))),
    }
}

fn to_toml<T: Serialize>(value: &T) -> Result<String, CliError> {
    toml::to_string_pretty(value)
        .map_err(|e| CliError::Command(format!("failed to serialize configuration: {}", e)))
}

/// Wrap an array under its section key so it renders as `[[name]]` tables.
fn array_section<T: Serialize>(name: &str, items: &[T]) -> Result<String, CliError> {
    to_toml(&BTreeMap::from([(name, items)]))
}

/// Configuration display report.
///
/// The `config_toml` field is only used for text rendering.
#[derive(Serialize)]
pub struct ConfigReport {
    /// Configuration file path
    pub source: String,
    /// Optional section name (None = full config)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Serialized TOML configuration
    #[serde(skip)]
    pub config_toml: String,
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if let Some(ref section) = self.section {
            let section_label = format!("[{}]", section);
            writeln!(
                w,
                "Configuration {} (source: {})",
                section_label.bold(),
                self.source
            )?;
        } else {
            writeln!(w, "Configuration (source: {})", self.source.bold())?;
        }

        writeln!(w)?;
        write!(w, "{}", self.config_toml)?;

        Ok(())
    }
}

/// Resolved configuration path.
#[derive(Serialize)]
pub struct ConfigPathReport {
    pub path: String,
    pub exists: bool,
}

impl Render for ConfigPathReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.exists {
            writeln!(w, "{}", self.path)
        } else {
            writeln!(w, "{} {}", self.path, "(missing)".yellow())
        }
    }
}
