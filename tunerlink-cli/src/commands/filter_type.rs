//! `tunerlink filter-type` command handler

use std::io::Write;

use serde::Serialize;

use tunerlink_core::filter_type::{FilterType, filter_type_for_bit, linkage_types};

use crate::cli::FilterTypeArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `filter-type` command.
///
/// Decoding never fails; bits without a known main type are reported as unknown.
pub fn execute(args: FilterTypeArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let entries = match (args.bit, args.mask.as_deref()) {
        (Some(bit), _) => vec![FilterTypeEntry::new(bit, filter_type_for_bit(bit))],
        (None, Some(mask)) => {
            let mask = parse_mask(mask)?;
            linkage_types(mask)
                .into_iter()
                .zip((0..u32::BITS).filter(|bit| mask & (1 << bit) != 0))
                .map(|(tag, bit)| FilterTypeEntry::new(bit, tag))
                .collect()
        }
        (None, None) => {
            return Err(CliError::Command(
                "either a bit position or --mask is required".to_owned(),
            ));
        }
    };

    writer.render(&FilterTypeReport { entries })
}

/// Parse a decimal or `0x`-prefixed hexadecimal mask.
pub fn parse_mask(raw: &str) -> Result<u32, CliError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    };
    parsed.map_err(|e| CliError::Command(format!("invalid mask '{}': {}", raw, e)))
}

/// One decoded bit position.
#[derive(Debug, Serialize)]
pub struct FilterTypeEntry {
    pub bit: u32,
    pub main_type_bits: u32,
    /// Canonical tag, e.g. `ts/undefined`
    pub tag: String,
    pub known: bool,
}

impl FilterTypeEntry {
    fn new(bit: u32, filter_type: FilterType) -> Self {
        Self {
            bit,
            main_type_bits: filter_type.main_type_bits(),
            tag: filter_type.to_string(),
            known: !filter_type.is_unknown(),
        }
    }
}

/// Result of `tunerlink filter-type`.
#[derive(Debug, Serialize)]
pub struct FilterTypeReport {
    pub entries: Vec<FilterTypeEntry>,
}

impl Render for FilterTypeReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        if self.entries.is_empty() {
            writeln!(w, "{}", "no bits set".dimmed())?;
            return Ok(());
        }

        writeln!(w, "{:<5} {:<12} {}", "BIT", "MAIN TYPE", "TAG")?;
        for entry in &self.entries {
            let tag = if entry.known {
                entry.tag.normal()
            } else {
                entry.tag.yellow()
            };
            writeln!(
                w,
                "{:<5} {:<12} {}",
                entry.bit,
                format!("0x{:x}", entry.main_type_bits),
                tag
            )?;
        }
        Ok(())
    }
}
