//! Integration tests driving complete commands through `run`.

use camino::Utf8PathBuf;
use netevent_prom_lib::Host;
use std::fs;
use std::io::{Read, Write};

/// Test host that reads from and writes to in-memory buffers.
struct TestHost {
    input_buf: Vec<u8>,
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
}

impl TestHost {
    fn new(input: &str) -> Self {
        Self {
            input_buf: input.as_bytes().to_vec(),
            output_buf: Vec::new(),
            error_buf: Vec::new(),
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }
}

impl Host for TestHost {
    fn input(&mut self) -> impl Read {
        self.input_buf.as_slice()
    }

    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, _code: i32) {}
}

struct Workspace {
    _dir: tempfile::TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).expect("temp dir is UTF-8");
        Self { _dir: dir, root }
    }

    fn write(&self, name: &str, text: &str) -> String {
        let path = self.root.join(name);
        fs::write(&path, text).expect("Failed to write test file");
        path.into_string()
    }
}

const NOTIFICATIONS: &str = r#"{"error": "BGP_NEIGHBOR_STATE_CHANGED", "host": "edge01", "yang_message": {"bgp": {"neighbors": {"neighbor": {"192.168.140.254": {"state": {"peer_as": "4230", "session-state": "ACTIVE", "session-state-old": "ESTABLISHED"}}}}}}}

{"error": "RAW", "host": "edge01", "message_details": {"message": "something unparsed"}}
this line is garbage
{"error": "BGP_MD5_INCORRECT", "host": "edge01", "yang_message": {"bgp": {}}}
{"error": "LLDP_NEIGHBOR_CHANGED", "host": "edge01", "yang_message": {}}
"#;

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_ingest_stdin_to_stdout() {
    let ws = Workspace::new();
    let config = ws.write("netevent-prom.toml", "namespace = \"napalm_logs\"\n");

    let mut host = TestHost::new(NOTIFICATIONS);
    netevent_prom_lib::run(&mut host, ["netevent-prom", "ingest", "--config", config.as_str(), "--log-level", "none"])
        .expect("ingest should succeed");

    let out = host.output_str();
    assert!(
        out.contains(
            "napalm_logs_bgp_neighbor_state_changed{current_state=\"ACTIVE\",host=\"edge01\",neighbor=\"192.168.140.254\",peer_as=\"4230\",previous_state=\"ESTABLISHED\"} 1"
        ),
        "{out}"
    );
    assert!(out.contains("napalm_logs_lldp_neighbor_changed{host=\"edge01\"} 1"), "{out}");
    assert!(!out.contains("bgp_md5_incorrect"), "{out}");
    assert!(!out.contains("raw"), "{out}");
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_ingest_files_with_ignored_events() {
    let ws = Workspace::new();
    let config = ws.write("custom.toml", "ignored_events = [\"LLDP_NEIGHBOR_CHANGED\"]\n");
    let input = ws.write("events.jsonl", NOTIFICATIONS);
    let output = ws.root.join("metrics.prom");

    let mut host = TestHost::new("");
    netevent_prom_lib::run(
        &mut host,
        [
            "netevent-prom",
            "ingest",
            input.as_str(),
            "--output",
            output.as_str(),
            "--config",
            config.as_str(),
            "--log-level",
            "none",
        ],
    )
    .expect("ingest should succeed");

    assert!(host.output_buf.is_empty());
    let text = fs::read_to_string(&output).expect("metrics file should exist");
    assert!(text.contains("# TYPE metric_bgp_neighbor_state_changed counter"), "{text}");
    assert!(!text.contains("lldp"), "{text}");
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_init_then_validate() {
    let ws = Workspace::new();
    let config = ws.root.join("generated.toml");

    let mut host = TestHost::new("");
    netevent_prom_lib::run(&mut host, ["netevent-prom", "init", config.as_str()]).expect("init should succeed");
    netevent_prom_lib::run(&mut host, ["netevent-prom", "validate", config.as_str()]).expect("validate should succeed");

    let out = host.output_str();
    assert!(out.contains("Generated default configuration file"), "{out}");
    assert!(out.contains("Configuration file is valid"), "{out}");
    assert!(host.error_buf.is_empty());
}

#[test]
#[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
fn test_rules_listing() {
    let ws = Workspace::new();
    let config = ws.write("netevent-prom.toml", "");

    let mut host = TestHost::new("");
    netevent_prom_lib::run(&mut host, ["netevent-prom", "rules", "--config", config.as_str()]).expect("rules should succeed");

    let out = host.output_str();
    assert!(out.starts_with("INTERFACE_UP\n"), "{out}");
    assert!(out.contains("  gauge   metric_ospf_neighbor_state [host, area, neighbor, interface]"), "{out}");
    assert!(out.contains("  counter metric_nat_session_closed [host, service_name,"), "{out}");
}
