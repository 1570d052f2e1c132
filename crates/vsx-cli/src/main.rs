#![forbid(unsafe_code)]

//! VSX status CLI - parse, validate and inspect gateway status dumps.
//!
//! # Commands
//!
//! - `parse`: Output the inventory (or an evidence summary) as JSON
//! - `validate`: Check input for errors and report diagnostics
//! - `inspect`: Human-readable listing of virtual systems, VLANs and interfaces

use std::fmt::Write as _;
use std::io::{self, Read};
use std::path::Path;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info, warn};
use vsx_core::{FullVsid, ParseConfig, VlanPeers, VsxInventory};
use vsx_parser::{parse_evidence_json, parse_with_config};

/// VSX status CLI - parse, validate and inspect gateway status dumps.
#[derive(Debug, Parser)]
#[command(
    name = "vsx-cli",
    version,
    about = "VSX status CLI - parse, validate and inspect gateway status dumps",
    long_about = "Reads the concatenated output of `vsx stat -v`, `cphaprob stat` and\n\
        `cphaprob -a if` for one or more gateways and builds an inventory of\n\
        virtual systems, VLAN memberships and physical interface usage."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging (can be repeated for more detail: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// TOML file with parser settings. Defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse status output and print the inventory as JSON.
    Parse {
        /// Input file paths, or "-" for stdin. Files are concatenated in order.
        #[arg(default_value = "-")]
        inputs: Vec<String>,

        /// Output the full inventory (default is summary)
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate status output and report diagnostics.
    Validate {
        /// Input file paths, or "-" for stdin.
        #[arg(default_value = "-")]
        inputs: Vec<String>,

        /// Output as JSON (structured diagnostics)
        #[arg(long)]
        json: bool,

        /// Exit with non-zero status on warnings (not just errors)
        #[arg(long)]
        strict: bool,
    },

    /// List virtual systems per gateway with their VLANs and interfaces.
    Inspect {
        /// Input file paths, or "-" for stdin.
        #[arg(default_value = "-")]
        inputs: Vec<String>,

        /// Only show this gateway
        #[arg(short, long)]
        gateway: Option<String>,
    },
}

/// Result of validating status output.
#[derive(Debug, Serialize)]
struct ValidateResult {
    valid: bool,
    gateway_count: usize,
    vs_count: usize,
    parse_time_ms: f64,
    warnings: Vec<ValidationWarning>,
    errors: Vec<ValidationError>,
}

#[derive(Debug, Serialize)]
struct ValidationWarning {
    code: String,
    message: String,
    line: usize,
}

#[derive(Debug, Serialize)]
struct ValidationError {
    code: String,
    message: String,
    line: usize,
    column: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.quiet);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Parse {
            inputs,
            full,
            pretty,
        } => cmd_parse(&inputs, &config, full, pretty),

        Command::Validate {
            inputs,
            json,
            strict,
        } => cmd_validate(&inputs, &config, json, strict),

        Command::Inspect { inputs, gateway } => cmd_inspect(&inputs, &config, gateway.as_deref()),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<ParseConfig> {
    let Some(path) = path else {
        return Ok(ParseConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    let config: ParseConfig = toml::from_str(&raw)
        .with_context(|| format!("Invalid config: {}", path.display()))?;
    debug!("Loaded parser config from {}", path.display());
    Ok(config)
}

/// Concatenate every input in order, making sure each chunk ends with a newline
/// so the last line of one file never merges with the first line of the next.
fn load_inputs(inputs: &[String]) -> Result<String> {
    let mut combined = String::new();
    for input in inputs {
        let chunk = if input == "-" {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read from stdin")?;
            buffer
        } else {
            std::fs::read_to_string(input).context(format!("Failed to read file: {input}"))?
        };
        combined.push_str(&chunk);
        if !chunk.is_empty() && !chunk.ends_with('\n') {
            combined.push('\n');
        }
    }
    info!("Loaded {} input(s), {} bytes", inputs.len(), combined.len());
    Ok(combined)
}

// =============================================================================
// Command: parse
// =============================================================================

fn cmd_parse(inputs: &[String], config: &ParseConfig, full: bool, pretty: bool) -> Result<()> {
    let source = load_inputs(inputs)?;
    let parsed = parse_with_config(&source, config).context("Failed to parse VSX status input")?;

    let output = if full {
        if pretty {
            serde_json::to_string_pretty(&parsed.inventory)?
        } else {
            serde_json::to_string(&parsed.inventory)?
        }
    } else if pretty {
        let value: serde_json::Value = serde_json::from_str(&parse_evidence_json(&parsed))?;
        serde_json::to_string_pretty(&value)?
    } else {
        parse_evidence_json(&parsed)
    };

    println!("{output}");

    for warning in &parsed.warnings {
        warn!("Parse warning: {}", warning.message);
    }

    Ok(())
}

// =============================================================================
// Command: validate
// =============================================================================

fn cmd_validate(
    inputs: &[String],
    config: &ParseConfig,
    json_output: bool,
    strict: bool,
) -> Result<()> {
    let source = load_inputs(inputs)?;
    let started = Instant::now();
    let outcome = parse_with_config(&source, config);
    let parse_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    let mut warnings = Vec::new();
    let mut errors = Vec::new();
    let (gateway_count, vs_count) = match &outcome {
        Ok(parsed) => {
            warnings.extend(parsed.warnings.iter().map(|warning| ValidationWarning {
                code: warning.code.as_str().to_string(),
                message: warning.message.clone(),
                line: warning.span.start.line,
            }));
            (parsed.inventory.gateways.len(), parsed.inventory.vs_count())
        }
        Err(error) => {
            errors.push(ValidationError {
                code: error.code().as_str().to_string(),
                message: error.to_string(),
                line: error.line(),
                column: error.span().start.col,
            });
            (0, 0)
        }
    };

    let valid = errors.is_empty() && (!strict || warnings.is_empty());

    let result = ValidateResult {
        valid,
        gateway_count,
        vs_count,
        parse_time_ms,
        warnings,
        errors,
    };

    if json_output {
        let output = serde_json::to_string_pretty(&result)?;
        println!("{output}");
    } else {
        if result.valid {
            println!("✓ Valid VSX status input");
        } else {
            println!("✗ Invalid VSX status input");
        }

        println!("  Gateways: {}", result.gateway_count);
        println!("  Virtual systems: {}", result.vs_count);

        if !result.errors.is_empty() {
            println!("\nErrors:");
            for err in &result.errors {
                println!("  [{}] {} (line {})", err.code, err.message, err.line);
            }
        }

        if !result.warnings.is_empty() {
            println!("\nWarnings:");
            for warn in &result.warnings {
                println!("  [{}] {} (line {})", warn.code, warn.message, warn.line);
            }
        }
    }

    if !result.valid {
        std::process::exit(1);
    }

    Ok(())
}

// =============================================================================
// Command: inspect
// =============================================================================

fn cmd_inspect(inputs: &[String], config: &ParseConfig, gateway: Option<&str>) -> Result<()> {
    let source = load_inputs(inputs)?;
    let parsed = parse_with_config(&source, config).context("Failed to parse VSX status input")?;
    for warning in &parsed.warnings {
        warn!("Parse warning: {}", warning.message);
    }
    print!("{}", render_inspect(&parsed.inventory, gateway)?);
    Ok(())
}

fn render_inspect(inventory: &VsxInventory, only_gateway: Option<&str>) -> Result<String> {
    let gateways: Vec<&str> = match only_gateway {
        Some(wanted) if !inventory.gateways.contains_key(wanted) => {
            bail!("Gateway `{wanted}` not found in input");
        }
        Some(wanted) => vec![wanted],
        None => inventory.sorted_gateways(),
    };

    let mut out = String::new();
    for gateway in gateways {
        let listing = inventory.vs_listing(gateway);
        let _ = writeln!(out, "Gateway {gateway} ({} virtual systems)", listing.len());

        for (vsid, record) in &listing {
            let full_vsid = FullVsid::new(gateway, *vsid);
            let label = if *vsid == 0 && record.name.is_none() {
                inventory.vs_name(&full_vsid).unwrap_or_default()
            } else {
                record.display_name(gateway)
            };
            let switch = if record.is_virtual_switch { " [switch]" } else { "" };
            let _ = writeln!(
                out,
                "  {vsid:>4}  {label:<24} {}{switch}",
                record.type_description()
            );

            for vlan in inventory.vlans_for(&full_vsid) {
                let peers = match inventory.vlan_peers(vlan, &full_vsid) {
                    Some(VlanPeers::Shared(members)) => {
                        let names: Vec<String> = members
                            .iter()
                            .map(|member| member_label(inventory, member))
                            .collect();
                        format!("shared with {}", names.join(", "))
                    }
                    Some(VlanPeers::Direct) | None => "direct".to_string(),
                };
                let _ = writeln!(out, "        vlan {vlan}: {peers}");
            }

            if record.has_insufficient_secured_interfaces() {
                let _ = writeln!(
                    out,
                    "        secured interfaces: {} of {} required",
                    record.secured_interface_count(),
                    record.required_secure_interfaces.unwrap_or(0)
                );
            }
        }

        let interfaces = inventory.gateway_physical_interfaces(gateway);
        if !interfaces.is_empty() {
            let _ = writeln!(out, "  Physical interfaces:");
            for (interface, members) in interfaces {
                let names: Vec<String> = members
                    .iter()
                    .map(|member| member_label(inventory, member))
                    .collect();
                let _ = writeln!(out, "    {interface:<12} {}", names.join(", "));
            }
        }
    }
    Ok(out)
}

/// `<name> (<gateway>+<vsid>)`, or the raw membership entry when it is not a full VSID.
fn member_label(inventory: &VsxInventory, member: &str) -> String {
    match member.parse::<FullVsid>() {
        Ok(full_vsid) => {
            let name = inventory
                .record_by_full_vsid(&full_vsid)
                .filter(|record| record.name.is_some())
                .map(|record| record.display_name(&full_vsid.gateway))
                .or_else(|| inventory.vs_name(&full_vsid))
                .unwrap_or("unknown");
            format!("{name} ({member})")
        }
        Err(_) => member.to_string(),
    }
}
