use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One classified network event, as emitted by the syslog normalizer.
///
/// The wire form uses `error` for the event type and `yang_message` for the attribute
/// tree. Any other fields of the message are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Notification {
    #[serde(rename = "error", alias = "event_type")]
    pub event_type: CompactString,

    pub host: CompactString,

    #[serde(rename = "yang_message", alias = "attributes", default = "empty_tree")]
    pub attributes: Value,
}

fn empty_tree() -> Value {
    Value::Object(Map::new())
}

impl Notification {
    #[must_use]
    pub fn new(event_type: impl Into<CompactString>, host: impl Into<CompactString>, attributes: Value) -> Self {
        Self {
            event_type: event_type.into(),
            host: host.into(),
            attributes,
        }
    }
}
