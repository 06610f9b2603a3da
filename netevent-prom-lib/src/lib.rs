#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for netevent-prom
//!
//! This library turns structured network-event notifications, as produced by a syslog
//! normalizer, into Prometheus counters and gauges.
//!
//! # Module Organization
//!
//! - [`engine`]: Notification model, rule table, and metric recording
//! - `commands`: Command-line interface and orchestration

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod engine;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub use crate::commands::{Host, run};
