use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

pub mod wire;

/// relation layer config
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeersConfig {
    wire: wire::Config,
    path: Option<PathBuf>,
}

impl PeersConfig {
    pub fn wire(&self) -> &wire::Config {
        &self.wire
    }
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
    /// peer relation these settings apply to
    pub fn relation_name(&self) -> &str {
        &self.wire.relation_name
    }
    /// remote-bag key carrying a peer's advertised address
    pub fn address_key(&self) -> &str {
        &self.wire.address_key
    }
    /// remote-bag key for the coordination-service leader marker
    pub fn leader_key(&self) -> &str {
        &self.wire.leader_key
    }
    /// prefix completed as `<prefix>.<nonce>` for restart acknowledgements
    pub fn restart_key_prefix(&self) -> &str {
        &self.wire.restart_key_prefix
    }
    /// leadership-store key holding the current restart nonce
    pub fn nonce_key(&self) -> &str {
        &self.wire.nonce_key
    }
}

impl PeersConfig {
    /// attempts to decode the config first as JSON, then YAML, finally erroring if neither work
    pub fn parse<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Self::parse_str(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to find config at {}", &path.display()))?,
        )?;
        config.path = Some(path.to_path_buf());

        Ok(config)
    }
    /// attempts to decode the config first as JSON, then YAML, finally erroring if neither work
    pub fn parse_str<S: AsRef<str>>(s: S) -> Result<Self> {
        let s = s.as_ref();
        let wire: wire::Config = serde_json::from_str(s)
            .or_else(|_| serde_yaml::from_str(s))
            .context("config is neither valid JSON nor YAML")?;
        debug!(?wire);

        Ok(Self { wire, path: None })
    }
}

impl From<wire::Config> for PeersConfig {
    fn from(wire: wire::Config) -> Self {
        Self { wire, path: None }
    }
}
