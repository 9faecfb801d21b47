//! Load config from file and environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;
use wearlink_core::EngineConfig;

/// Daemon configuration. File: ~/.config/wearlink/config.toml or /etc/wearlink/config.toml.
/// Env overrides: WEARLINK_NODE_ID, WEARLINK_LISTEN_PORT, WEARLINK_LOG.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// This node's id as seen by peers.
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default = "default_display_name")]
    pub display_name: String,
    /// Transport TCP port (default 47800).
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    /// Filter used when RUST_LOG is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Program run with the URI as its only argument to open a companion link.
    #[serde(default = "default_launch_command")]
    pub launch_command: String,
    /// Program run for local commands: `<cmd> <package> <class> <play|pause|toggle>`.
    #[serde(default)]
    pub service_command: Option<String>,
    #[serde(default)]
    pub peers: Vec<PeerConfig>,
    #[serde(default)]
    pub engine: EngineConfig,
}

/// A statically known companion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub addr: SocketAddr,
    #[serde(default = "default_nearby")]
    pub nearby: bool,
}

fn default_node_id() -> String {
    "wearlink-host".to_owned()
}
fn default_display_name() -> String {
    "Linux host".to_owned()
}
fn default_listen_port() -> u16 {
    47800
}
fn default_log_level() -> String {
    "info".to_owned()
}
fn default_launch_command() -> String {
    "xdg-open".to_owned()
}
fn default_nearby() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            display_name: default_display_name(),
            listen_port: default_listen_port(),
            log_level: default_log_level(),
            launch_command: default_launch_command(),
            service_command: None,
            peers: Vec::new(),
            engine: EngineConfig::default(),
        }
    }
}

/// Load config: default, then the first config file found, then env vars.
pub fn load() -> anyhow::Result<Config> {
    let mut c = match find_file() {
        Some(p) => {
            let s = std::fs::read_to_string(&p)
                .with_context(|| format!("reading {}", p.display()))?;
            parse(&s).with_context(|| format!("parsing {}", p.display()))?
        }
        None => Config::default(),
    };
    apply_env(&mut c, |k| std::env::var(k).ok());
    Ok(c)
}

pub fn parse(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(s)
}

fn apply_env(c: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(id) = var("WEARLINK_NODE_ID") {
        c.node_id = id;
    }
    if let Some(s) = var("WEARLINK_LISTEN_PORT") {
        if let Ok(p) = s.parse::<u16>() {
            c.listen_port = p;
        }
    }
    if let Some(level) = var("WEARLINK_LOG") {
        c.log_level = level;
    }
}

fn config_paths() -> Vec<PathBuf> {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    let mut out = Vec::new();
    if let Some(h) = home {
        out.push(h.join(".config/wearlink/config.toml"));
    }
    out.push(PathBuf::from("/etc/wearlink/config.toml"));
    out
}

fn find_file() -> Option<PathBuf> {
    config_paths().into_iter().find(|p| p.exists())
}
