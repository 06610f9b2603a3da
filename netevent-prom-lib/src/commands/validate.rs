use super::Host;
use super::config::{Config, DEFAULT_CONFIG_FILE};
use crate::Result;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use std::io::Write;

#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file (default is `netevent-prom.toml`)
    #[arg(value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,
}

pub fn validate_config<H: Host>(host: &mut H, args: &ValidateArgs) -> Result<()> {
    let config_path = args.config.as_ref();

    match Config::load(Utf8Path::new("."), config_path) {
        Ok(config) => {
            let _ = writeln!(host.output(), "Configuration file is valid");
            if let Some(path) = config_path {
                let _ = writeln!(host.output(), "Config file: {path}");
            } else if Utf8Path::new(DEFAULT_CONFIG_FILE).exists() {
                let _ = writeln!(host.output(), "Config file: {DEFAULT_CONFIG_FILE}");
            } else {
                let _ = writeln!(host.output(), "Using default configuration (no config file found)");
            }
            let _ = writeln!(
                host.output(),
                "Namespace '{}', {} extra ignored event type(s)",
                config.namespace,
                config.ignored_events.len()
            );
            Ok(())
        }
        Err(e) => {
            let _ = writeln!(host.error(), "❌ Configuration validation failed: {e}");
            host.exit(1);
            Err(e)
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::commands::init::{InitArgs, init_config};

    fn write_config(dir: &tempfile::TempDir, name: &str, text: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_generated_config_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let config_path = Utf8PathBuf::try_from(tmp.path().join("netevent-prom.toml")).unwrap();

        let mut init_host = TestHost::new();
        init_config(&mut init_host, &InitArgs { output: Some(config_path.clone()) }).unwrap();

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(config_path) }).unwrap();

        let out = host.output_str();
        assert!(out.contains("Configuration file is valid"), "{out}");
        assert!(out.contains("Namespace 'metric', 0 extra ignored event type(s)"), "{out}");
        assert_eq!(host.exit_code, None);
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_empty_config_is_valid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "empty.toml", "# Empty config file\n");

        let mut host = TestHost::new();
        validate_config(&mut host, &ValidateArgs { config: Some(path) }).unwrap();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_toml_syntax() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "invalid_syntax.toml", "ignored_events = [\"RAW\"\n");

        let mut host = TestHost::new();
        let result = validate_config(&mut host, &ValidateArgs { config: Some(path) });

        assert!(result.is_err(), "Invalid TOML syntax should fail validation");
        assert!(host.error_str().contains("Configuration validation failed"));
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_unknown_field() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "unknown_field.toml", "namespace = \"metric\"\nunknown_field = \"value\"\n");

        let mut host = TestHost::new();
        let err = validate_config(&mut host, &ValidateArgs { config: Some(path) }).unwrap_err();
        assert!(err.to_string().contains("unknown_field"), "{err}");
        assert_eq!(host.exit_code, Some(1));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_invalid_namespace() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "bad_namespace.toml", "namespace = \"9lives\"\n");

        let mut host = TestHost::new();
        let err = validate_config(&mut host, &ValidateArgs { config: Some(path) }).unwrap_err();
        assert!(err.to_string().contains("'9lives'"), "{err}");
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_wrong_value_type() {
        let tmp = tempfile::tempdir().unwrap();
        let path = write_config(&tmp, "wrong_type.toml", "ignored_events = \"RAW\"\n");

        let mut host = TestHost::new();
        assert!(validate_config(&mut host, &ValidateArgs { config: Some(path) }).is_err());
    }
}
