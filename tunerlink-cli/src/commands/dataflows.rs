//! `tunerlink dataflows` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use tunerlink_core::config::SelectionPolicy;
use tunerlink_core::dataflow::{DataflowChain, determine_dataflows};
use tunerlink_core::registry::{ResourceRegistry, connect_hardware_to_test_cases};
use tunerlink_core::types::DataflowContext;
use tunerlink_core::validator;

use crate::cli::DataflowsArgs;
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `dataflows` command.
///
/// Validates the configuration first; determination never runs on invalid linkage.
pub async fn execute(
    args: DataflowsArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let context = args
        .context
        .as_deref()
        .map(|name| {
            DataflowContext::from_str_loose(name).ok_or_else(|| {
                CliError::Command(format!(
                    "unknown context: {} (expected: record, record_with_lnb, descrambling, descrambling_with_lnb)",
                    name
                ))
            })
        })
        .transpose()?;
    let selection = args
        .selection
        .as_deref()
        .map(|name| {
            SelectionPolicy::from_str_loose(name).ok_or_else(|| {
                CliError::Command(format!(
                    "unknown selection policy: {} (expected: first_declared, last_declared)",
                    name
                ))
            })
        })
        .transpose()?;

    let mut config = load_config(config_path).await?;
    if let Some(policy) = selection {
        config.dataflow.selection = policy;
    }

    let mut registry = ResourceRegistry::new();
    connect_hardware_to_test_cases(&config, &mut registry);
    let plan = {
        let validated = validator::validate(&config, &registry)?;
        determine_dataflows(&validated)
    };
    info!(
        supported = plan.supported_contexts().len(),
        "dataflows determined"
    );

    let chains = plan
        .iter()
        .filter(|chain| context.is_none_or(|c| chain.context() == c))
        .cloned()
        .collect();

    writer.render(&DataflowsReport {
        source: config_path.display().to_string(),
        selection: config.dataflow.selection,
        chains,
    })
}

/// Result of `tunerlink dataflows`.
#[derive(Debug, Serialize)]
pub struct DataflowsReport {
    /// Configuration file path
    pub source: String,
    pub selection: SelectionPolicy,
    pub chains: Vec<DataflowChain>,
}

impl Render for DataflowsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Dataflows: {}", self.source.bold())?;
        for chain in &self.chains {
            let label = format!("{:<22}", chain.context().as_str());
            if chain.is_empty() {
                writeln!(w, "  {} {}", label, "(not supported)".dimmed())?;
                continue;
            }
            let links: Vec<String> = chain.setup_order().map(ToString::to_string).collect();
            writeln!(w, "  {} {}", label.green(), links.join(" -> "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chain_renders_as_not_supported() {
        colored::control::set_override(false);
        let report = DataflowsReport {
            source: "tuner.toml".to_owned(),
            selection: SelectionPolicy::FirstDeclared,
            chains: vec![DataflowChain::empty(DataflowContext::Descrambling)],
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("descrambling"));
        assert!(output.contains("(not supported)"));
    }

    #[test]
    fn test_report_json_has_selection_and_chains() {
        let report = DataflowsReport {
            source: "tuner.toml".to_owned(),
            selection: SelectionPolicy::LastDeclared,
            chains: vec![DataflowChain::empty(DataflowContext::Record)],
        };

        let parsed = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(parsed["selection"], "last_declared");
        assert_eq!(parsed["chains"][0]["context"], "record");
        assert!(parsed["chains"][0]["links"].as_array().is_some_and(Vec::is_empty));
    }
}
