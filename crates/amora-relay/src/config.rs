use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    /// Maximum accepted frame size in bytes; oversized frames are rejected
    /// before parsing.
    pub max_frame_bytes: usize,

    /// Depth of each connection's outbound queue. A full queue drops the
    /// frame (best-effort delivery), it never blocks the sender.
    pub forward_queue_depth: usize,

    // Graceful shutdown
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8090".parse().unwrap(),
            max_frame_bytes: 64 * 1024, // 64KB
            forward_queue_depth: 32,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("AMORA_RELAY_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if let Ok(size) = std::env::var("AMORA_RELAY_MAX_FRAME_BYTES") {
            config.max_frame_bytes = size.parse()?;
        }

        if let Ok(depth) = std::env::var("AMORA_RELAY_FORWARD_QUEUE_DEPTH") {
            config.forward_queue_depth = depth.parse()?;
        }

        if let Ok(secs) = std::env::var("AMORA_RELAY_SHUTDOWN_TIMEOUT_SECS") {
            config.shutdown_timeout_secs = secs.parse()?;
        }

        Ok(config)
    }

    pub fn from_toml(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.max_frame_bytes == 0 {
            anyhow::bail!("max_frame_bytes must be > 0");
        }

        if self.forward_queue_depth == 0 {
            anyhow::bail!("forward_queue_depth must be > 0");
        }

        Ok(())
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_zero_sizes_rejected() {
        let mut config = ServerConfig::default();
        config.max_frame_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.forward_queue_depth = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ServerConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: ServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.bind_addr, config.bind_addr);
        assert_eq!(parsed.max_frame_bytes, config.max_frame_bytes);
    }
}
