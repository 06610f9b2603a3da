//! Command-line interface and orchestration for netevent-prom
//!
//! This module implements the CLI commands on top of the [`engine`](crate::engine). It handles
//! argument parsing, configuration management, logging setup, and the input and output of
//! notifications and metrics.
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **ingest**: Read newline-delimited notification JSON from files or stdin, record each
//!   one, and write the Prometheus text exposition of the result
//! - **rules**: List every event type with the metrics it drives
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the appropriate
//! command handler. All interaction with the outside world goes through a [`Host`], so tests
//! can drive complete commands against in-memory buffers.
//!
//! Configuration is a small TOML file holding the metric `namespace` and a list of
//! `ignored_events`.

mod common;
mod config;
mod host;
mod ingest;
mod init;
mod rules;
mod run;
mod validate;

pub use common::{CommonArgs, LogLevel, init_logging};
pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_CONFIG_TOML};
pub use host::Host;
pub use ingest::{IngestArgs, IngestSummary, encode_metrics, ingest, ingest_lines};
pub use init::{InitArgs, init_config};
pub use rules::{RulesArgs, list_rules, render_rules};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
