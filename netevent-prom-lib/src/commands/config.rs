use crate::Result;
use crate::engine::{Dispatcher, MetricCache};
use camino::{Utf8Path, Utf8PathBuf};
use compact_str::CompactString;
use ohno::{IntoAppError, app_err};
use prometheus::Registry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "netevent-prom.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Prefix of every metric name
    #[serde(default = "default_namespace")]
    pub namespace: CompactString,

    /// Event types that are accepted but never recorded
    #[serde(default)]
    pub ignored_events: Vec<CompactString>,
}

fn default_namespace() -> CompactString {
    CompactString::const_new("metric")
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `netevent-prom.toml` in `base_dir` is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Builds a dispatcher recording into `registry` with these settings.
    #[must_use]
    pub fn dispatcher(&self, registry: Registry) -> Dispatcher {
        Dispatcher::new(MetricCache::new(registry), self.namespace.clone()).with_ignored_events(self.ignored_events.iter().cloned())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if the namespace is not a valid metric name prefix
    pub fn validate(&self) -> Result<()> {
        if !is_valid_namespace(&self.namespace) {
            return Err(app_err!(
                "namespace must start with a letter or underscore and contain only letters, digits, and underscores, got '{}'",
                self.namespace
            ));
        }

        if let Some(event) = self.ignored_events.iter().find(|e| e.trim().is_empty()) {
            return Err(app_err!("ignored_events must not contain blank entries, got '{event}'"));
        }

        Ok(())
    }
}

fn is_valid_namespace(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
