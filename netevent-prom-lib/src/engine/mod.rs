//! Projection of network-event notifications onto Prometheus metrics
//!
//! A [`Notification`] names an event type, the host that raised it, and carries a YANG-shaped
//! attribute tree. The [`Dispatcher`] looks the event type up in a static table of
//! [`EventRule`]s and updates every metric the rule declares.
//!
//! # Implementation Model
//!
//! Rules are pure data. Each [`MetricSpec`] says how its name is formed, which labels it
//! carries and where each label value comes from ([`Resolver`]), and what a notification does
//! to it ([`Update`]). Counters count events, state gauges flip between 0 and 1 on paired
//! events, and level gauges take a numeric leaf from the tree.
//!
//! Values are pulled out of the tree with static [`Path`]s. A path step either names an object
//! member or descends into the first entry of a keyed list. The key of that entry is often the
//! label value itself (the interface name, the BGP neighbor address, and so on).
//!
//! Metrics are registered lazily through a [`MetricCache`] the first time a notification needs
//! them, so only metrics for events actually seen ever appear in the exposition. Every label
//! and value is resolved before any metric is touched: a notification either updates all of
//! its rule's metrics or none of them.

mod cache;
mod dispatcher;
mod notification;
mod path;
mod rules;

pub use cache::{MetricCache, MetricDescriptor, MetricHandle, MetricKind, RegistryError};
pub use dispatcher::{Dispatcher, Outcome, RuleTable, SkipReason, help_text, metric_name, sanitize_name_component};
pub use notification::Notification;
pub use path::{ExtractError, Path, Step, display_path, extract, extract_key, extract_number, extract_scalar};
pub use rules::{DEFAULT_RULE, EVENT_RULES, EventRule, HelpText, Label, MetricName, MetricSpec, Resolver, SENTINEL_EVENTS, Update};
