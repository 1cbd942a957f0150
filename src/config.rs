use anyhow::Result;
use clap::Parser;
use serde::{Deserialize, Deserializer};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "blinks")]
#[command(about = "Runs the blinks service", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".blinks")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    database: String,
    port: u16,
    #[serde(default, deserialize_with = "non_empty")]
    pub turso_url: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub turso_auth_token: Option<String>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_seconds: u64,
}

fn default_sync_interval() -> u64 {
    60
}

// An unset `${VAR}` substitutes to an empty string; treat that as absent.
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

impl App {
    pub fn get_db(&self) -> &str {
        &self.database
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-default}` in one left-to-right pass.
    /// Substituted values are not rescanned, and an unterminated `${` is
    /// kept verbatim.
    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut out = String::with_capacity(yaml_str.len());
        let mut rest = yaml_str;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let tail = &rest[start + 2..];
            let Some(end) = tail.find('}') else {
                out.push_str(&rest[start..]);
                return Ok(out);
            };
            out.push_str(&Config::resolve_var(&tail[..end]));
            rest = &tail[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    fn resolve_var(expr: &str) -> String {
        match expr.split_once(":-") {
            Some((name, default)) => env::var(name).unwrap_or_else(|_| default.to_string()),
            None => env::var(expr).unwrap_or_else(|_| {
                tracing::warn!(var = expr, "environment variable not found");
                String::new()
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let cfg = Config::from_yaml("app:\n  database: blinks.db\n  port: 3000\n").unwrap();
        assert_eq!(cfg.app.get_db(), "blinks.db");
        assert_eq!(cfg.app.get_port(), 3000);
        assert_eq!(cfg.app.sync_interval_seconds, 60);
        assert!(cfg.app.turso_url.is_none());
    }

    #[test]
    fn test_default_value_substitution() {
        let yaml = "app:\n  database: ${BLINKS_TEST_UNSET_DB:-fallback.db}\n  port: 8080\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert_eq!(cfg.app.get_db(), "fallback.db");
    }

    #[test]
    fn test_unset_optional_vars_are_absent() {
        let yaml = "app:\n  database: blinks.db\n  port: 8080\n  turso_url: ${BLINKS_TEST_UNSET_URL}\n  turso_auth_token: ${BLINKS_TEST_UNSET_TOKEN}\n";
        let cfg = Config::from_yaml(yaml).unwrap();
        assert!(cfg.app.turso_url.is_none());
        assert!(cfg.app.turso_auth_token.is_none());
    }

    #[test]
    fn test_unterminated_placeholder_is_kept() {
        let out = Config::substitute_env_vars("database: ${BLINKS_TEST_UNSET_DB:-a.db}\nhost: ${BROKEN\n").unwrap();
        assert_eq!(out, "database: a.db\nhost: ${BROKEN\n");
    }

    #[test]
    fn test_adjacent_placeholders() {
        let out = Config::substitute_env_vars("${BLINKS_TEST_UNSET_A:-x}${BLINKS_TEST_UNSET_B:-y}").unwrap();
        assert_eq!(out, "xy");
    }
}
