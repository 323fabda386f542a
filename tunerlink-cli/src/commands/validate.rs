//! `tunerlink validate` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tunerlink_core::config::TunerTestConfig;
use tunerlink_core::error::TunerLinkError;
use tunerlink_core::harness::{InitOutcome, initialize_configuration};
use tunerlink_core::registry::ResourceRegistry;
use tunerlink_core::types::{DataflowContext, ResourceKind};

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `validate` command.
///
/// Runs the same initialization a test suite performs at setup: load, connect
/// hardware to suites, validate connections, determine dataflows.
///
/// # Errors
///
/// * `CliError::NotApplicable` when no configuration file exists
/// * `CliError::Linkage` when a declared connection is invalid
/// * `CliError::Config` when the file cannot be parsed or has invalid values
pub async fn execute(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating tuner configuration");

    let source = config_path.display().to_string();
    let mut registry = ResourceRegistry::new();

    match initialize_configuration(config_path, &mut registry).await {
        Ok(InitOutcome::Ready(init)) => {
            let report = ValidationReport {
                source,
                status: ValidationStatus::Valid,
                resources: resource_counts(&init.config),
                connections: init.config.connections.len(),
                registered: registry.len(),
                supported_contexts: init.plan.supported_contexts(),
                error: None,
            };
            writer.render(&report)?;
            Ok(())
        }
        Ok(InitOutcome::NotApplicable { path }) => {
            writer.render(&ValidationReport::failed(
                source,
                ValidationStatus::NotApplicable,
                "configuration file not found".to_owned(),
            ))?;
            Err(CliError::NotApplicable { path })
        }
        Err(TunerLinkError::Linkage(e)) => {
            writer.render(&ValidationReport::failed(
                source,
                ValidationStatus::Invalid,
                e.to_string(),
            ))?;
            Err(CliError::Linkage(e))
        }
        Err(e) => {
            writer.render(&ValidationReport::failed(
                source,
                ValidationStatus::Invalid,
                e.to_string(),
            ))?;
            Err(e.into())
        }
    }
}

fn resource_counts(config: &TunerTestConfig) -> Vec<ResourceCount> {
    ResourceKind::ALL
        .into_iter()
        .map(|kind| ResourceCount {
            kind,
            count: config.ids(kind).len(),
        })
        .collect()
}

/// Overall validation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    Invalid,
    NotApplicable,
}

/// Number of declared resources of one kind.
#[derive(Debug, Serialize)]
pub struct ResourceCount {
    pub kind: ResourceKind,
    pub count: usize,
}

/// Result of `tunerlink validate`.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    /// Configuration file path
    pub source: String,
    pub status: ValidationStatus,
    pub resources: Vec<ResourceCount>,
    pub connections: usize,
    /// Number of (kind, suite, id) registrations
    pub registered: usize,
    pub supported_contexts: Vec<DataflowContext>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationReport {
    fn failed(source: String, status: ValidationStatus, error: String) -> Self {
        Self {
            source,
            status,
            resources: Vec::new(),
            connections: 0,
            registered: 0,
            supported_contexts: Vec::new(),
            error: Some(error),
        }
    }
}

impl Render for ValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Tuner Config Validation: {}", self.source.bold())?;

        match self.status {
            ValidationStatus::Valid => {
                writeln!(w, "  Result: {}", "VALID".green().bold())?;
            }
            ValidationStatus::Invalid => {
                writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            }
            ValidationStatus::NotApplicable => {
                writeln!(w, "  Result: {}", "NOT APPLICABLE".yellow().bold())?;
            }
        }
        if let Some(ref error) = self.error {
            writeln!(w, "  Error: {}", error.red())?;
            return Ok(());
        }

        writeln!(w, "  Resources:")?;
        for entry in self.resources.iter().filter(|r| r.count > 0) {
            writeln!(w, "    {:<16} {}", entry.kind.as_str(), entry.count)?;
        }
        writeln!(w, "  Connections: {}", self.connections)?;

        if self.supported_contexts.is_empty() {
            writeln!(w, "  Dataflows: {}", "none supported".dimmed())?;
        } else {
            let names: Vec<&str> = self.supported_contexts.iter().map(|c| c.as_str()).collect();
            writeln!(w, "  Dataflows: {}", names.join(", "))?;
        }

        Ok(())
    }
}
