use super::Host;
use super::common::{CommonArgs, init_logging};
use super::config::Config;
use crate::Result;
use crate::engine::{DEFAULT_RULE, EVENT_RULES, EventRule, MetricSpec, metric_name};
use camino::Utf8Path;
use clap::Parser;
use core::fmt::Write as _;
use ohno::IntoAppError;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct RulesArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

fn write_metric(out: &mut String, spec: &MetricSpec, name: &str) {
    let kind = spec.kind().to_string();
    let labels: Vec<_> = spec.label_names().collect();
    let _ = writeln!(out, "  {kind:<7} {name} [{}]", labels.join(", "));
}

/// Lists every event type with the metrics it drives.
#[must_use]
pub fn render_rules(namespace: &str, rules: &[EventRule]) -> String {
    let mut out = String::new();
    for rule in rules {
        for event in rule.events {
            let _ = writeln!(out, "{event}");
            for spec in rule.metrics {
                write_metric(&mut out, spec, &metric_name(namespace, spec, event));
            }
        }
    }

    let _ = writeln!(out, "(any other event)");
    for spec in DEFAULT_RULE.metrics {
        write_metric(&mut out, spec, &format!("{namespace}_<event>"));
    }

    out
}

pub fn list_rules<H: Host>(host: &mut H, args: &RulesArgs) -> Result<()> {
    init_logging(args.common.log_level);

    let config = Config::load(Utf8Path::new("."), args.common.config.as_ref())?;
    host.output()
        .write_all(render_rules(&config.namespace, EVENT_RULES).as_bytes())
        .into_app_err("writing rule listing")?;
    Ok(())
}
