use super::MetricKind;
use super::path::{Path, yang_path};

/// How a metric's name is formed, below the configured namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricName {
    /// The notification's event type, lower-cased.
    Event,

    /// A fixed suffix shared by several event types.
    Fixed(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpText {
    /// `Counter for <EVENT> notifications`
    Event,

    Fixed(&'static str),
}

/// Where a label's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolver {
    /// The notification's host.
    Host,

    /// A scalar leaf of the attribute tree.
    Leaf(Path),

    /// The selected key of the keyed list found at the path.
    ListKey(Path),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub name: &'static str,
    pub resolver: Resolver,
}

/// What a notification does to its metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// Add one to a counter.
    Count,

    /// Set a gauge to 1 when the event type is `active`, to 0 otherwise.
    State { active: &'static str },

    /// Set a gauge to the numeric leaf at the path.
    Level(Path),
}

impl Update {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Count => MetricKind::Counter,
            Self::State { .. } | Self::Level(_) => MetricKind::Gauge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricSpec {
    pub name: MetricName,
    pub help: HelpText,
    pub labels: &'static [Label],
    pub update: Update,
}

impl MetricSpec {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        self.update.kind()
    }

    pub fn label_names(&self) -> impl Iterator<Item = &'static str> {
        self.labels.iter().map(|label| label.name)
    }
}

/// The metrics driven by one or more event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRule {
    pub events: &'static [&'static str],
    pub metrics: &'static [MetricSpec],
}

/// Event types that carry no structured payload and never produce metrics.
pub const SENTINEL_EVENTS: &[&str] = &["RAW", "UNKNOWN"];

const fn host() -> Label {
    Label {
        name: "host",
        resolver: Resolver::Host,
    }
}

const fn leaf(name: &'static str, path: Path) -> Label {
    Label {
        name,
        resolver: Resolver::Leaf(path),
    }
}

const fn list_key(name: &'static str, path: Path) -> Label {
    Label {
        name,
        resolver: Resolver::ListKey(path),
    }
}

const fn event_counter(labels: &'static [Label]) -> MetricSpec {
    MetricSpec {
        name: MetricName::Event,
        help: HelpText::Event,
        labels,
        update: Update::Count,
    }
}

const fn state_gauge(suffix: &'static str, help: &'static str, active: &'static str, labels: &'static [Label]) -> MetricSpec {
    MetricSpec {
        name: MetricName::Fixed(suffix),
        help: HelpText::Fixed(help),
        labels,
        update: Update::State { active },
    }
}

const HOST_LABELS: &[Label] = &[host()];

/// Applied to every event type without a rule of its own.
pub const DEFAULT_RULE: EventRule = EventRule {
    events: &[],
    metrics: &[event_counter(HOST_LABELS)],
};

const INTERFACE_LABELS: &[Label] = &[host(), list_key("interface", yang_path!("interfaces", "interface"))];

const INTERFACE_DUPLEX_LABELS: &[Label] = &[
    host(),
    list_key("interface", yang_path!("interfaces", "interface")),
    leaf("duplex_mode", yang_path!("interfaces", "interface", *, "ethernet", "state", "duplex_mode")),
];

const BFD_LABELS: &[Label] = &[
    host(),
    leaf("interface", yang_path!("bfd", "interfaces", "interface", "id")),
    leaf(
        "session_state",
        yang_path!("bfd", "interfaces", "interface", "peers", "peer", "state", "session-state"),
    ),
];

const NTP_LABELS: &[Label] = &[host(), list_key("ntp_server", yang_path!("system", "ntp", "servers", "server"))];

const BGP_NEIGHBOR: Label = list_key("neighbor", yang_path!("bgp", "neighbors", "neighbor"));
const BGP_PEER_AS: Label = leaf("peer_as", yang_path!("bgp", "neighbors", "neighbor", *, "state", "peer_as"));

const BGP_LABELS: &[Label] = &[host(), BGP_NEIGHBOR, BGP_PEER_AS];

const BGP_STATE_CHANGE_LABELS: &[Label] = &[
    host(),
    BGP_NEIGHBOR,
    BGP_PEER_AS,
    leaf("current_state", yang_path!("bgp", "neighbors", "neighbor", *, "state", "session-state")),
    leaf("previous_state", yang_path!("bgp", "neighbors", "neighbor", *, "state", "session-state-old")),
];

const BGP_MD5_LABELS: &[Label] = &[host(), BGP_NEIGHBOR];

const USER_LABELS: &[Label] = &[host(), list_key("user", yang_path!("users", "user"))];

const SYSTEM_ALARM_LABELS: &[Label] = &[
    host(),
    list_key("component_name", yang_path!("hardware-state", "component")),
    leaf("component_class", yang_path!("hardware-state", "component", *, "class")),
    leaf("alarm_state", yang_path!("hardware-state", "component", *, "state", "alarm-state")),
    leaf("alarm_reason", yang_path!("hardware-state", "component", *, "state", "alarm-reason")),
];

const OSPF_LABELS: &[Label] = &[
    host(),
    list_key(
        "area",
        yang_path!(
            "network-instances", "network-instance", "global", "protocols", "protocol", "ospf", "ospfv2", "areas", "area"
        ),
    ),
    list_key(
        "neighbor",
        yang_path!(
            "network-instances", "network-instance", "global", "protocols", "protocol", "ospf", "ospfv2", "areas", "area", *,
            "interfaces", "interface", *, "neighbors", "neighbor"
        ),
    ),
    list_key(
        "interface",
        yang_path!(
            "network-instances", "network-instance", "global", "protocols", "protocol", "ospf", "ospfv2", "areas", "area", *,
            "interfaces", "interface"
        ),
    ),
];

const ISIS_LABELS: &[Label] = &[
    host(),
    list_key(
        "interface",
        yang_path!("network-instances", "network-instance", "global", "protocols", "protocol", "isis", "interfaces", "interface"),
    ),
    list_key(
        "level",
        yang_path!(
            "network-instances", "network-instance", "global", "protocols", "protocol", "isis", "interfaces", "interface", *,
            "levels", "level"
        ),
    ),
    list_key(
        "neighbor",
        yang_path!(
            "network-instances", "network-instance", "global", "protocols", "protocol", "isis", "interfaces", "interface", *,
            "levels", "level", *, "adjacencies", "adjacency"
        ),
    ),
];

// Every field of the selected flow event becomes a label.
const NAT_SESSION_LABELS: &[Label] = &[
    host(),
    leaf("service_name", yang_path!("security", "flow", *, "service_name")),
    leaf("source_address", yang_path!("security", "flow", *, "source_address")),
    leaf("source_port", yang_path!("security", "flow", *, "source_port")),
    leaf("destination_address", yang_path!("security", "flow", *, "destination_address")),
    leaf("destination_port", yang_path!("security", "flow", *, "destination_port")),
    leaf("nat_destination_address", yang_path!("security", "flow", *, "nat_destination_address")),
    leaf("nat_destination_port", yang_path!("security", "flow", *, "nat_destination_port")),
    leaf("nat_source_address", yang_path!("security", "flow", *, "nat_source_address")),
    leaf("nat_source_port", yang_path!("security", "flow", *, "nat_source_port")),
];

pub const EVENT_RULES: &[EventRule] = &[
    EventRule {
        events: &["INTERFACE_UP", "INTERFACE_DOWN"],
        metrics: &[
            event_counter(INTERFACE_LABELS),
            state_gauge("interface_state", "State of this interface. 0=DOWN, 1=UP", "INTERFACE_UP", INTERFACE_LABELS),
        ],
    },
    EventRule {
        events: &["INTERFACE_DUPLEX_MODE"],
        metrics: &[event_counter(INTERFACE_DUPLEX_LABELS)],
    },
    EventRule {
        events: &["INTERFACE_MAC_LIMIT_REACHED"],
        metrics: &[MetricSpec {
            name: MetricName::Event,
            help: HelpText::Fixed("Number of MAC addresses learned when the interface hit its MAC limit"),
            labels: INTERFACE_LABELS,
            update: Update::Level(yang_path!("interfaces", "interface", *, "ethernet", "state", "learned-mac-addresses")),
        }],
    },
    EventRule {
        events: &["BFD_STATE_CHANGE"],
        metrics: &[event_counter(BFD_LABELS)],
    },
    EventRule {
        events: &["NTP_SERVER_UNREACHABLE"],
        metrics: &[event_counter(NTP_LABELS)],
    },
    EventRule {
        events: &[
            "BGP_PREFIX_LIMIT_EXCEEDED",
            "BGP_PREFIX_THRESH_EXCEEDED",
            "BGP_PEER_NOT_CONFIGURED",
            "BGP_CONNECTION_REJECTED",
            "BGP_CONNECTION_RESET",
            "BGP_INCORRECT_AS_NUMBER",
        ],
        metrics: &[event_counter(BGP_LABELS)],
    },
    EventRule {
        events: &["BGP_NEIGHBOR_STATE_CHANGED"],
        metrics: &[event_counter(BGP_STATE_CHANGE_LABELS)],
    },
    EventRule {
        events: &["BGP_MD5_INCORRECT"],
        metrics: &[event_counter(BGP_MD5_LABELS)],
    },
    EventRule {
        events: &[
            "USER_ENTER_CONFIG_MODE",
            "USER_EXIT_CONFIG_MODE",
            "USER_WRITE_CONFIG",
            "USER_LOGIN",
            "USER_LOGOUT",
            "CONFIGURATION_COMMIT_REQUESTED",
            "CONFIGURATION_ROLLBACK",
        ],
        metrics: &[event_counter(USER_LABELS)],
    },
    EventRule {
        events: &["SYSTEM_ALARM"],
        metrics: &[event_counter(SYSTEM_ALARM_LABELS)],
    },
    EventRule {
        events: &["OSPF_NEIGHBOR_UP", "OSPF_NEIGHBOR_DOWN"],
        metrics: &[
            event_counter(OSPF_LABELS),
            state_gauge("ospf_neighbor_state", "State of the OSPF neighbor. 0=DOWN, 1=UP", "OSPF_NEIGHBOR_UP", OSPF_LABELS),
        ],
    },
    EventRule {
        events: &["ISIS_NEIGHBOR_UP", "ISIS_NEIGHBOR_DOWN"],
        metrics: &[
            event_counter(ISIS_LABELS),
            state_gauge("isis_neighbor_state", "State of the ISIS neighbor. 0=DOWN, 1=UP", "ISIS_NEIGHBOR_UP", ISIS_LABELS),
        ],
    },
    EventRule {
        events: &["NAT_SESSION_CREATED", "NAT_SESSION_CLOSED"],
        metrics: &[event_counter(NAT_SESSION_LABELS)],
    },
];
