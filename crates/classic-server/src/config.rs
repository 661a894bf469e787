use serde::Deserialize;
use std::path::Path;

use classic_world::world::MAX_EXTENT;
use classic_world::Dimensions;

use crate::player::MAX_PLAYER_ID;

#[derive(Debug, Default, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub world: WorldSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub heartbeat: HeartbeatSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_motd")]
    pub motd: String,
    /// Player slots; operators may join past this limit.
    #[serde(default = "default_max_players")]
    pub max_players: u32,
    /// Check the verification key against the server salt.
    #[serde(default = "default_true")]
    pub verify_names: bool,
    #[serde(default = "default_ops_file")]
    pub ops_file: String,
}

fn default_address() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    25565
}

fn default_name() -> String {
    "Classic Server".into()
}

fn default_motd() -> String {
    "Welcome!".into()
}

fn default_max_players() -> u32 {
    32
}

fn default_true() -> bool {
    true
}

fn default_ops_file() -> String {
    "ops.json".into()
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            name: default_name(),
            motd: default_motd(),
            max_players: default_max_players(),
            verify_names: true,
            ops_file: default_ops_file(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    #[serde(default = "default_width")]
    pub width: usize,
    #[serde(default = "default_height")]
    pub height: usize,
    #[serde(default = "default_width")]
    pub depth: usize,
    #[serde(default = "default_save_file")]
    pub save_file: String,
    /// Auto-save interval in seconds. 0 = disabled. Default: 120.
    #[serde(default = "default_autosave_interval")]
    pub autosave_interval: u64,
}

fn default_width() -> usize {
    256
}

fn default_height() -> usize {
    64
}

fn default_save_file() -> String {
    "world.dat".into()
}

fn default_autosave_interval() -> u64 {
    120
}

impl WorldSection {
    pub fn dimensions(&self) -> Result<Dimensions, classic_world::WorldError> {
        Dimensions::new(self.width, self.height, self.depth)
    }
}

impl Default for WorldSection {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            depth: default_width(),
            save_file: default_save_file(),
            autosave_interval: default_autosave_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct NetworkSection {
    /// Delay between read sweeps over all connections.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Seconds between pings.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval: u64,
    /// A single send that takes longer than this fails the connection.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    300
}

fn default_keepalive_interval() -> u64 {
    30
}

fn default_write_timeout_ms() -> u64 {
    10_000
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            keepalive_interval: default_keepalive_interval(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HeartbeatSection {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_heartbeat_url")]
    pub url: String,
    #[serde(default = "default_heartbeat_interval")]
    pub interval: u64,
    #[serde(default = "default_true")]
    pub public: bool,
}

fn default_heartbeat_url() -> String {
    "http://www.classicube.net/heartbeat.jsp".into()
}

fn default_heartbeat_interval() -> u64 {
    45
}

impl Default for HeartbeatSection {
    fn default() -> Self {
        Self {
            enabled: false,
            url: default_heartbeat_url(),
            interval: default_heartbeat_interval(),
            public: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that cannot be represented on the wire.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_PLAYER_ID as u32).contains(&self.server.max_players) {
            return Err(format!(
                "max_players must be between 1 and {MAX_PLAYER_ID}, got {}",
                self.server.max_players
            ));
        }
        if let Err(e) = self.world.dimensions() {
            return Err(format!("{e} (each side must be 1..={MAX_EXTENT})"));
        }
        if self.network.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be positive".into());
        }
        if self.network.keepalive_interval == 0 {
            return Err("keepalive_interval must be positive".into());
        }
        if self.heartbeat.enabled && self.heartbeat.interval == 0 {
            return Err("heartbeat interval must be positive".into());
        }
        Ok(())
    }
}
