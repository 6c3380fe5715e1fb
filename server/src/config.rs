use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Realtime presence, messaging and call-signaling relay
#[derive(Parser, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[command(name = "hive-relay", version, about = "Realtime presence and messaging relay")]
pub struct Config {
    /// Port to listen on
    #[arg(long, env = "HIVE_PORT", default_value = "5001")]
    pub port: u16,

    /// Bind address
    #[arg(long, env = "HIVE_BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Path to TOML config file
    #[arg(long, default_value = "./hive-relay.toml")]
    pub config: String,

    /// Enable structured JSON logging (for Docker/production)
    #[arg(long, env = "HIVE_JSON_LOGS")]
    pub json_logs: bool,

    /// Output a commented TOML config template and exit
    #[arg(long)]
    pub generate_config: bool,

    /// Data directory for the presence database
    #[arg(long, env = "HIVE_DATA_DIR", default_value = "./data")]
    pub data_dir: String,

    /// Allowed CORS origins, comma separated. Empty allows any origin.
    #[arg(long, env = "HIVE_CORS_ORIGINS", value_delimiter = ',')]
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// WebSocket keepalive settings (loaded from [heartbeat] section in TOML)
    #[arg(skip)]
    #[serde(default, skip_serializing)]
    pub heartbeat: HeartbeatConfig,
}

/// Server-initiated ping/pong keepalive for WebSocket connections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Seconds between server pings. 0 disables the heartbeat.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Seconds to wait for a pong before closing the connection
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_pong_timeout_secs() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5001,
            bind_address: "0.0.0.0".to_string(),
            config: "./hive-relay.toml".to_string(),
            json_logs: false,
            generate_config: false,
            data_dir: "./data".to_string(),
            cors_origins: Vec::new(),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}

impl Config {
    /// Load config with layered precedence:
    /// built-in defaults < TOML file < env vars (HIVE_*) < CLI args
    pub fn load() -> Result<Self, figment::Error> {
        let matches = Config::command().get_matches();
        let cli = Config::from_arg_matches(&matches).map_err(|e| e.to_string())?;

        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&cli.config))
            .merge(Env::prefixed("HIVE_").split("__"))
            .merge(Serialized::defaults(explicit_cli_values(&cli, &matches)))
            .extract()
    }
}

/// Only flags the user actually passed (or set through clap's env binding)
/// override the file; clap's own defaults must not shadow TOML values.
fn explicit_cli_values(
    cli: &Config,
    matches: &ArgMatches,
) -> serde_json::Map<String, serde_json::Value> {
    let mut values = match serde_json::to_value(cli) {
        Ok(serde_json::Value::Object(map)) => map,
        _ => serde_json::Map::new(),
    };
    values.retain(|key, _| {
        matches!(
            matches.value_source(key),
            Some(ValueSource::CommandLine | ValueSource::EnvVariable)
        )
    });
    values
}

/// Generate a commented TOML config template
pub fn generate_config_template() -> String {
    r#"# hive-relay configuration
# Place this file at ./hive-relay.toml or specify with --config <path>
# All settings can be overridden via environment variables (HIVE_PORT, etc.)
# or CLI flags (--port, etc.)

# Server port (default: 5001)
# port = 5001

# Bind address (default: 0.0.0.0, all interfaces)
# bind_address = "0.0.0.0"

# Enable structured JSON logging for Docker/production
# json_logs = false

# Data directory for the presence database
# data_dir = "./data"

# Allowed CORS origins. Leave empty to allow any origin.
# cors_origins = ["http://localhost:5173"]

# ---- WebSocket keepalive ----
# [heartbeat]
# interval_secs = 30      # 0 disables server pings
# pong_timeout_secs = 10
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toml_heartbeat_section_is_read() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "relay.toml",
                r#"
                    port = 7000
                    [heartbeat]
                    interval_secs = 5
                "#,
            )?;
            let config: Config = Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file("relay.toml"))
                .extract()?;
            assert_eq!(config.port, 7000);
            assert_eq!(config.heartbeat.interval_secs, 5);
            assert_eq!(config.heartbeat.pong_timeout_secs, 10);
            Ok(())
        });
    }

    #[test]
    fn cli_defaults_do_not_shadow_file_values() {
        let matches = Config::command().get_matches_from(["hive-relay", "--json-logs"]);
        let cli = Config::from_arg_matches(&matches).expect("valid args");
        let explicit = explicit_cli_values(&cli, &matches);
        assert_eq!(explicit.get("json_logs"), Some(&serde_json::Value::Bool(true)));
        assert!(!explicit.contains_key("port"));
    }

    #[test]
    fn template_is_valid_toml() {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::string(&generate_config_template()))
            .extract()
            .expect("template parses");
        assert_eq!(config, Config::default());
    }
}
