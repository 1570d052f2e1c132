#![forbid(unsafe_code)]

//! Parser for the concatenated output of `vsx stat -v`, `cphaprob stat` and
//! `cphaprob -a if` across any number of gateways.
//!
//! The input is read line by line. A classifier assigns each trimmed line a
//! [`LineKind`](classifier::LineKind); a small mode tracker switches between
//! normal text and the `Virtual Devices Status` table; the table reader and
//! the record builder turn lines into a [`VsxInventory`].

mod classifier;
mod inventory_builder;
mod table;
mod vsx_parser;

use serde::Serialize;
use serde_json::json;
use vsx_core::{ContextKind, ParseConfig, Span, VsxError, VsxInventory, VsxWarning};

use crate::vsx_parser::VsxParser;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseResult {
    pub inventory: VsxInventory,
    pub warnings: Vec<VsxWarning>,
}

/// One trimmed input line together with its location.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SourceLine<'a> {
    pub(crate) text: &'a str,
    pub(crate) span: Span,
}

impl<'a> SourceLine<'a> {
    pub(crate) const fn new(text: &'a str, span: Span) -> Self {
        Self { text, span }
    }

    pub(crate) fn malformed_row(&self, reason: impl Into<String>) -> VsxError {
        VsxError::MalformedTableRow {
            reason: reason.into(),
            content: self.text.to_string(),
            span: self.span,
        }
    }

    pub(crate) fn malformed_record(&self, reason: impl Into<String>) -> VsxError {
        VsxError::MalformedRecord {
            reason: reason.into(),
            content: self.text.to_string(),
            span: self.span,
        }
    }

    pub(crate) fn missing(&self, missing: ContextKind) -> VsxError {
        VsxError::MissingContext {
            missing,
            content: self.text.to_string(),
            span: self.span,
        }
    }
}

/// Parse with the default [`ParseConfig`].
pub fn parse(input: &str) -> Result<ParseResult, VsxError> {
    parse_with_config(input, &ParseConfig::default())
}

/// Parse the whole input in one pass. Any malformed line aborts the parse.
pub fn parse_with_config(input: &str, config: &ParseConfig) -> Result<ParseResult, VsxError> {
    VsxParser::new(config).run(input)
}

#[must_use]
pub fn parse_evidence_json(parsed: &ParseResult) -> String {
    let inventory = &parsed.inventory;
    let virtual_switch_count = inventory
        .gateways
        .values()
        .flat_map(|records| records.values())
        .filter(|record| record.is_virtual_switch)
        .count();

    json!({
        "gateway_count": inventory.gateways.len(),
        "vs_count": inventory.vs_count(),
        "virtual_switch_count": virtual_switch_count,
        "vlan_count": inventory.vlans.len(),
        "physical_interface_count": inventory.physical_interfaces.len(),
        "warning_count": parsed.warnings.len(),
        "warnings": parsed
            .warnings
            .iter()
            .map(|warning| warning.message.clone())
            .collect::<Vec<_>>(),
    })
    .to_string()
}
