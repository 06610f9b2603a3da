//! Command dispatch logic for netevent-prom

use super::{IngestArgs, InitArgs, RulesArgs, ValidateArgs, ingest, init_config, list_rules, validate_config};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "netevent-prom", version, author, long_about = None)]
#[command(about = "Turn structured network-event notifications into Prometheus metrics")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: NeteventSubcommand,
}

#[derive(Subcommand, Debug)]
enum NeteventSubcommand {
    /// Record notifications and print the resulting metrics
    Ingest(IngestArgs),
    /// List the metrics driven by each event type
    Rules(RulesArgs),
    /// Generate a default configuration file
    Init(InitArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if command parsing fails or if the executed command fails
pub fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    match &Cli::parse_from(args).command {
        NeteventSubcommand::Ingest(ingest_args) => ingest(host, ingest_args),
        NeteventSubcommand::Rules(rules_args) => list_rules(host, rules_args),
        NeteventSubcommand::Init(init_args) => init_config(host, init_args),
        NeteventSubcommand::Validate(validate_args) => validate_config(host, validate_args),
    }
}
