use super::Host;
use super::common::{CommonArgs, init_logging};
use super::config::Config;
use crate::Result;
use crate::engine::{Dispatcher, Notification, Outcome};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use ohno::IntoAppError;
use prometheus::{Encoder, Registry, TextEncoder};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};

const LOG_TARGET: &str = "    ingest";

const STDIN: &str = "-";

#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Files of newline-delimited notifications (default is stdin, also selected by `-`)
    #[arg(value_name = "PATH")]
    pub paths: Vec<Utf8PathBuf>,

    /// Write the metrics exposition to this file instead of to the terminal
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<Utf8PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Tally of what happened to the notifications of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub recorded: usize,
    pub ignored: usize,
    pub skipped: usize,
    pub malformed: usize,
}

impl IngestSummary {
    #[must_use]
    pub const fn total(&self) -> usize {
        self.recorded + self.ignored + self.skipped + self.malformed
    }

    const fn tally(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Ignored => self.ignored += 1,
            Outcome::Recorded { .. } => self.recorded += 1,
            Outcome::Skipped(_) => self.skipped += 1,
        }
    }
}

/// Feeds every notification line of `reader` to `dispatcher`.
///
/// Blank lines are ignored and lines that do not parse are logged and counted as malformed.
///
/// # Errors
///
/// Returns an error if reading fails or a metric of the rule table cannot be registered or updated
pub fn ingest_lines<R: BufRead>(dispatcher: &Dispatcher, reader: R, source: &str, summary: &mut IngestSummary) -> Result<()> {
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.into_app_err_with(|| format!("reading notifications from '{source}'"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let notification: Notification = match serde_json::from_str(line) {
            Ok(n) => n,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "{source}:{line_no}: skipping malformed notification: {e}");
                summary.malformed += 1;
                continue;
            }
        };

        let outcome = dispatcher
            .dispatch(&notification)
            .into_app_err_with(|| format!("{source}:{line_no}: recording {} notification", notification.event_type))?;
        summary.tally(&outcome);
    }

    Ok(())
}

/// Renders everything recorded in `registry` in the Prometheus text format.
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded
pub fn encode_metrics(registry: &Registry) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .into_app_err("encoding metrics")?;
    Ok(buf)
}

fn ingest_file(dispatcher: &Dispatcher, path: &Utf8Path, summary: &mut IngestSummary) -> Result<()> {
    let file = File::open(path).into_app_err_with(|| format!("opening notification file '{path}'"))?;
    ingest_lines(dispatcher, BufReader::new(file), path.as_str(), summary)
}

pub fn ingest<H: Host>(host: &mut H, args: &IngestArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(Utf8Path::new("."), args.common.config.as_ref())?;
    let dispatcher = config.dispatcher(Registry::new());
    let mut summary = IngestSummary::default();

    if args.paths.is_empty() {
        ingest_lines(&dispatcher, BufReader::new(host.input()), "<stdin>", &mut summary)?;
    }

    for path in &args.paths {
        if path == STDIN {
            ingest_lines(&dispatcher, BufReader::new(host.input()), "<stdin>", &mut summary)?;
        } else {
            ingest_file(&dispatcher, path, &mut summary)?;
        }
    }

    log::info!(
        target: LOG_TARGET,
        "Processed {} notifications: {} recorded, {} ignored, {} skipped, {} malformed",
        summary.total(),
        summary.recorded,
        summary.ignored,
        summary.skipped,
        summary.malformed
    );

    let exposition = encode_metrics(dispatcher.cache().registry())?;
    if let Some(path) = &args.output {
        fs::write(path, &exposition).into_app_err_with(|| format!("writing metrics to '{path}'"))?;
        log::info!(target: LOG_TARGET, "Wrote {} metric families to '{path}'", dispatcher.cache().len());
    } else {
        host.output().write_all(&exposition).into_app_err("writing metrics")?;
    }

    Ok(())
}
