use super::cache::{MetricCache, MetricDescriptor, RegistryError};
use super::notification::Notification;
use super::path::{ExtractError, extract_key, extract_number, extract_scalar};
use super::rules::{DEFAULT_RULE, EVENT_RULES, EventRule, HelpText, MetricName, MetricSpec, Resolver, SENTINEL_EVENTS, Update};
use compact_str::{CompactString, format_compact};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;

const LOG_TARGET: &str = "  dispatch";

/// Why a notification was dropped without touching any metric.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The attribute tree did not have the shape the rule expects.
    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// An event type without a rule of its own maps onto a name the rule table produces.
    #[error("metric name '{name}' is reserved by the rule table")]
    ReservedName { name: CompactString },

    /// An event type without a rule of its own maps onto a name registered with another shape.
    #[error("metric name '{name}' is already registered with a different shape")]
    NameTaken { name: CompactString },
}

/// What happened to a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A pass-through event type; nothing was recorded.
    Ignored,

    /// All metrics of the matching rule were updated.
    Recorded { updates: usize },

    /// Nothing was recorded.
    Skipped(SkipReason),
}

/// Static lookup from event type to the rule handling it.
///
/// Also knows every metric name, without namespace, that its rules can produce.
#[derive(Debug)]
pub struct RuleTable {
    rules: FxHashMap<&'static str, &'static EventRule>,
    reserved: FxHashSet<CompactString>,
}

impl RuleTable {
    #[must_use]
    pub fn new(rules: &'static [EventRule]) -> Self {
        let reserved = rules
            .iter()
            .flat_map(|rule| {
                rule.metrics
                    .iter()
                    .flat_map(move |spec| rule.events.iter().map(move |event| name_suffix(spec, event)))
            })
            .collect();
        let rules = rules
            .iter()
            .flat_map(|rule| rule.events.iter().map(move |event| (*event, rule)))
            .collect();
        Self { rules, reserved }
    }

    /// The rule for `event_type`, or `None` when the default rule applies.
    #[must_use]
    pub fn get(&self, event_type: &str) -> Option<&'static EventRule> {
        self.rules.get(event_type).copied()
    }

    /// Whether one of the rules produces the metric `<namespace>_<suffix>`.
    #[must_use]
    pub fn is_reserved(&self, suffix: &str) -> bool {
        self.reserved.contains(suffix)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::new(EVENT_RULES)
    }
}

/// Replaces every character that cannot appear in a metric name.
#[must_use]
pub fn sanitize_name_component(s: &str) -> CompactString {
    s.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' { c } else { '_' }
        })
        .collect()
}

fn name_suffix(spec: &MetricSpec, event_type: &str) -> CompactString {
    match spec.name {
        MetricName::Event => sanitize_name_component(event_type),
        MetricName::Fixed(suffix) => CompactString::const_new(suffix),
    }
}

/// Full metric name for `spec` when driven by `event_type`.
#[must_use]
pub fn metric_name(namespace: &str, spec: &MetricSpec, event_type: &str) -> CompactString {
    format_compact!("{namespace}_{}", name_suffix(spec, event_type))
}

#[must_use]
pub fn help_text(spec: &MetricSpec, event_type: &str) -> CompactString {
    match spec.help {
        HelpText::Event => format_compact!("Counter for {event_type} notifications"),
        HelpText::Fixed(text) => text.into(),
    }
}

/// A fully resolved metric update, ready to be applied.
#[derive(Debug)]
struct Planned {
    descriptor: MetricDescriptor,
    label_values: Vec<String>,
    value: Option<f64>,
}

/// Projects notifications onto metrics.
#[derive(Debug)]
pub struct Dispatcher {
    cache: MetricCache,
    rules: RuleTable,
    namespace: CompactString,
    ignored: FxHashSet<CompactString>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(cache: MetricCache, namespace: impl Into<CompactString>) -> Self {
        Self {
            cache,
            rules: RuleTable::default(),
            namespace: namespace.into(),
            ignored: SENTINEL_EVENTS.iter().map(|event| CompactString::from(*event)).collect(),
        }
    }

    /// Treats the given event types like the built-in pass-through types.
    #[must_use]
    pub fn with_ignored_events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<CompactString>,
    {
        self.ignored.extend(events.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn cache(&self) -> &MetricCache {
        &self.cache
    }

    /// The rule that handles `event_type`, or `None` for pass-through types.
    #[must_use]
    pub fn rule_for(&self, event_type: &str) -> Option<&'static EventRule> {
        if self.ignored.contains(event_type) {
            return None;
        }

        Some(self.rules.get(event_type).unwrap_or_else(|| {
            log::debug!(target: LOG_TARGET, "No specific rule for {event_type}, counting by host only");
            &DEFAULT_RULE
        }))
    }

    /// Updates the metrics for one notification.
    ///
    /// A notification whose attribute tree lacks something its rule needs is logged and
    /// dropped without touching any metric. So is an event type without a rule of its own
    /// whose counter name would clash with a metric of the rule table.
    ///
    /// Registry errors for metrics of the rule table point at a broken table and are
    /// returned to the caller.
    pub fn dispatch(&self, notification: &Notification) -> Result<Outcome, RegistryError> {
        let event_type = notification.event_type.as_str();
        let Some(rule) = self.rule_for(event_type) else {
            log::trace!(target: LOG_TARGET, "Ignoring {event_type} notification from {}", notification.host);
            return Ok(Outcome::Ignored);
        };

        // The default rule lists no events.
        let fallback = !rule.events.contains(&event_type);
        if fallback
            && let Some(spec) = rule
                .metrics
                .iter()
                .find(|spec| self.rules.is_reserved(&name_suffix(spec, event_type)))
        {
            let name = metric_name(&self.namespace, spec, event_type);
            return Ok(skipped(notification, SkipReason::ReservedName { name }));
        }

        let planned = match self.plan(rule, notification) {
            Ok(planned) => planned,
            Err(e) => return Ok(skipped(notification, e.into())),
        };

        let mut handles = Vec::with_capacity(planned.len());
        for p in &planned {
            match self.cache.get_or_create(&p.descriptor) {
                Ok(handle) => handles.push(handle),
                Err(RegistryError::Conflict { name, .. }) if fallback => {
                    return Ok(skipped(notification, SkipReason::NameTaken { name }));
                }
                Err(e) => return Err(e),
            }
        }

        for (p, handle) in planned.iter().zip(&handles) {
            let label_values: Vec<&str> = p.label_values.iter().map(String::as_str).collect();
            match p.value {
                None => handle.increment(&label_values)?,
                Some(value) => handle.set(&label_values, value)?,
            }
        }

        Ok(Outcome::Recorded { updates: planned.len() })
    }

    /// Resolves every label and value of `rule` before anything is recorded.
    fn plan(&self, rule: &EventRule, notification: &Notification) -> Result<Vec<Planned>, ExtractError> {
        let event_type = notification.event_type.as_str();
        let tree = &notification.attributes;

        rule.metrics
            .iter()
            .map(|spec| -> Result<Planned, ExtractError> {
                let label_values = spec
                    .labels
                    .iter()
                    .map(|label| match label.resolver {
                        Resolver::Host => Ok(notification.host.to_string()),
                        Resolver::Leaf(path) => extract_scalar(tree, path),
                        Resolver::ListKey(path) => extract_key(tree, path).map(str::to_owned),
                    })
                    .collect::<Result<Vec<_>, _>>()?;

                let value = match spec.update {
                    Update::Count => None,
                    Update::State { active } => Some(if event_type == active { 1.0 } else { 0.0 }),
                    Update::Level(path) => Some(extract_number(tree, path)?),
                };

                Ok(Planned {
                    descriptor: MetricDescriptor {
                        name: metric_name(&self.namespace, spec, event_type),
                        help: help_text(spec, event_type),
                        kind: spec.kind(),
                        label_names: spec.label_names().collect(),
                    },
                    label_values,
                    value,
                })
            })
            .collect()
    }
}

fn skipped(notification: &Notification, reason: SkipReason) -> Outcome {
    log::warn!(
        target: LOG_TARGET,
        "Dropping {} notification from {}: {reason}",
        notification.event_type,
        notification.host
    );
    Outcome::Skipped(reason)
}
