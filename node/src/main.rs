//! CHD risk inference service.
//!
//! Startup sequence: init tracing, layer configuration (defaults <
//! TOML file < `FRAMINGHAM_` env vars < CLI flags), load and validate
//! the classifier artifact, then serve the HTTP API. Any failure before
//! the listener binds aborts the process with context.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use framingham_model::{Classifier, GbdtClassifier};
use framingham_rpc::{start_server, AppState};

#[derive(Parser)]
#[command(name = "framingham-node")]
#[command(about = "CHD 10-year risk inference service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, default_value = "config/framingham.toml")]
    config: PathBuf,

    /// Bind host (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides config)
    #[arg(long)]
    port: Option<u16>,

    /// Classifier artifact path (overrides config)
    #[arg(long)]
    artifact: Option<PathBuf>,

    /// Log level filter (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ServerConfig {
    host: String,
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct ModelConfig {
    artifact_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("artifacts/chd-gbdt.json"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct LogConfig {
    level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct NodeConfig {
    server: ServerConfig,
    model: ModelConfig,
    log: LogConfig,
}

impl NodeConfig {
    /// Layer file and environment sources, then apply CLI overrides.
    fn load(cli: &Cli) -> Result<Self> {
        let settings = Config::builder()
            .add_source(ConfigFile::from(cli.config.clone()).required(false))
            .add_source(
                Environment::with_prefix("FRAMINGHAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .context("failed to assemble configuration")?;

        let mut node: NodeConfig = settings
            .try_deserialize()
            .context("failed to parse configuration")?;

        if let Some(host) = &cli.host {
            node.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            node.server.port = port;
        }
        if let Some(artifact) = &cli.artifact {
            node.model.artifact_path = artifact.clone();
        }
        if let Some(level) = &cli.log_level {
            node.log.level = level.clone();
        }

        Ok(node)
    }

    fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let node = NodeConfig::load(&cli)?;

    init_tracing(&node.log.level);

    let classifier = GbdtClassifier::from_path(&node.model.artifact_path).with_context(|| {
        format!(
            "failed to load classifier artifact from {}",
            node.model.artifact_path.display()
        )
    })?;
    let model = classifier.info();
    info!(
        version = model.version,
        trees = model.tree_count,
        "service starting with model {}",
        &model.sha256[..12.min(model.sha256.len())]
    );

    let state = AppState::new(Arc::new(classifier));
    start_server(state, &node.bind_addr()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Config loading reads the process environment, so tests that
    // mutate or depend on it must not interleave.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cli_with_config(path: &std::path::Path) -> Cli {
        Cli::parse_from(["framingham-node", "--config", path.to_str().unwrap()])
    }

    #[test]
    fn defaults_apply_without_a_config_file() {
        let _env = env_guard();
        let cli = cli_with_config(std::path::Path::new("/nonexistent/framingham.toml"));
        let node = NodeConfig::load(&cli).unwrap();
        assert_eq!(node.bind_addr(), "0.0.0.0:8000");
        assert_eq!(
            node.model.artifact_path,
            PathBuf::from("artifacts/chd-gbdt.json")
        );
        assert_eq!(node.log.level, "info");
    }

    #[test]
    fn config_file_overrides_defaults() {
        let _env = env_guard();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framingham.toml");
        std::fs::write(
            &path,
            r#"
[server]
host = "127.0.0.1"
port = 9001

[model]
artifact_path = "/models/chd.json"
"#,
        )
        .unwrap();

        let cli = cli_with_config(&path);
        let node = NodeConfig::load(&cli).unwrap();
        assert_eq!(node.bind_addr(), "127.0.0.1:9001");
        assert_eq!(node.model.artifact_path, PathBuf::from("/models/chd.json"));
    }

    #[test]
    fn env_vars_override_the_file_with_single_underscore_prefix() {
        let _env = env_guard();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framingham.toml");
        std::fs::write(&path, "[server]\nport = 9001\n").unwrap();

        // The documented spelling: FRAMINGHAM_ prefix, __ section separator.
        std::env::set_var("FRAMINGHAM_SERVER__PORT", "9100");
        std::env::set_var("FRAMINGHAM_LOG__LEVEL", "warn");
        let result = NodeConfig::load(&cli_with_config(&path));
        std::env::remove_var("FRAMINGHAM_SERVER__PORT");
        std::env::remove_var("FRAMINGHAM_LOG__LEVEL");

        let node = result.unwrap();
        assert_eq!(node.server.port, 9100);
        assert_eq!(node.log.level, "warn");
    }

    #[test]
    fn cli_flags_override_the_file() {
        let _env = env_guard();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("framingham.toml");
        std::fs::write(&path, "[server]\nport = 9001\n").unwrap();

        let cli = Cli::parse_from([
            "framingham-node",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "9002",
            "--log-level",
            "debug",
        ]);
        let node = NodeConfig::load(&cli).unwrap();
        assert_eq!(node.server.port, 9002);
        assert_eq!(node.log.level, "debug");
    }
}
