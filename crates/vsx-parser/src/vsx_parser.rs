use tracing::{debug, trace, warn};
use vsx_core::{
    ContextKind, ParseConfig, Span, UnterminatedTablePolicy, VsxError, VsxWarning, VsxWarningCode,
};

use crate::{
    ParseResult, SourceLine,
    classifier::{LineKind, Mode, classify},
    inventory_builder::InventoryBuilder,
    table::parse_table_row,
};

/// Mode tracker for one parse. Created per invocation and consumed by
/// [`VsxParser::run`].
pub(crate) struct VsxParser<'cfg> {
    config: &'cfg ParseConfig,
    mode: Mode,
    /// Span of the `Virtual Devices Status` line while in table mode.
    table_opened_at: Option<Span>,
    builder: InventoryBuilder,
}

impl<'cfg> VsxParser<'cfg> {
    pub(crate) fn new(config: &'cfg ParseConfig) -> Self {
        Self {
            config,
            mode: Mode::Normal,
            table_opened_at: None,
            builder: InventoryBuilder::new(),
        }
    }

    pub(crate) fn run(mut self, input: &str) -> Result<ParseResult, VsxError> {
        for (index, raw) in input.lines().enumerate() {
            let line = SourceLine::new(raw.trim(), Span::at_line(index + 1, raw.chars().count()));
            self.feed_line(&line)?;
        }
        self.finish()
    }

    fn feed_line(&mut self, line: &SourceLine<'_>) -> Result<(), VsxError> {
        match classify(line.text, self.mode, self.config) {
            LineKind::Noise => {}
            LineKind::TableStart => {
                if self.builder.current_gateway().is_none() {
                    return Err(line.missing(ContextKind::Gateway));
                }
                debug!("Starting VSIDMap at line {}", line.span.start.line);
                self.mode = Mode::Table;
                self.table_opened_at = Some(line.span);
            }
            LineKind::TableEnd => {
                debug!("Ending VSIDMap at line {}", line.span.start.line);
                self.mode = Mode::Normal;
                self.table_opened_at = None;
            }
            LineKind::TableRow(_) => {
                let row = parse_table_row(line)?;
                self.builder.insert_table_row(row, line)?;
            }
            LineKind::GatewayHeader(rest) => self.builder.enter_gateway(rest, line)?,
            LineKind::VirtualSwitchMarker => self.builder.mark_virtual_switch(line)?,
            LineKind::LicenseAllowance(rest) => {
                debug!("[license] virtual systems allowed:{rest}");
            }
            LineKind::ActiveConfigured(rest) => {
                debug!("[license] virtual systems active / configured:{rest}");
            }
            LineKind::VsidHeader(rest) => self.builder.enter_vsid(rest, line)?,
            LineKind::Counter(kind, rest) => self.builder.set_counter(kind, rest, line)?,
            LineKind::InterfaceEntry(text) => {
                self.builder.record_interface(text, line, self.config)?;
            }
            LineKind::Unrecognized => trace!("[unproc]: {}", line.text),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<ParseResult, VsxError> {
        if self.mode == Mode::Table {
            let span = self.table_opened_at.unwrap_or_default();
            let gateway = self.builder.current_gateway().unwrap_or_default().to_string();
            match self.config.unterminated_table {
                UnterminatedTablePolicy::Error => {
                    return Err(VsxError::UnterminatedTable { gateway, span });
                }
                UnterminatedTablePolicy::Warn => {
                    let message = format!(
                        "virtual devices table for gateway {gateway} opened at line {} was never terminated by a `Type:` line",
                        span.start.line
                    );
                    warn!("{message}");
                    self.builder.add_warning(VsxWarning {
                        code: VsxWarningCode::UnterminatedTable,
                        message,
                        span,
                    });
                }
            }
        }
        Ok(self.builder.finish())
    }
}
