use serde::{Deserialize, Serialize};

/// relation name used when none is configured
pub static DEFAULT_RELATION_NAME: &str = "zookeeper-quorum";
/// remote-bag key the host publishes each unit's address under
pub static DEFAULT_ADDRESS_KEY: &str = "private-address";
/// remote-bag key carrying the coordination-service leader marker
pub static DEFAULT_LEADER_KEY: &str = "is_zk_leader";
/// prefix for restart acknowledgement keys, completed as `<prefix>.<nonce>`
pub static DEFAULT_RESTART_KEY_PREFIX: &str = "restarted";
/// leadership-store key holding the current restart nonce
pub static DEFAULT_NONCE_KEY: &str = "restart_nonce";

/// top-level config type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_relation_name")]
    pub relation_name: String,
    #[serde(default = "default_address_key")]
    pub address_key: String,
    #[serde(default = "default_leader_key")]
    pub leader_key: String,
    #[serde(default = "default_restart_key_prefix")]
    pub restart_key_prefix: String,
    #[serde(default = "default_nonce_key")]
    pub nonce_key: String,
}

pub fn default_relation_name() -> String {
    DEFAULT_RELATION_NAME.into()
}

pub fn default_address_key() -> String {
    DEFAULT_ADDRESS_KEY.into()
}

pub fn default_leader_key() -> String {
    DEFAULT_LEADER_KEY.into()
}

pub fn default_restart_key_prefix() -> String {
    DEFAULT_RESTART_KEY_PREFIX.into()
}

pub fn default_nonce_key() -> String {
    DEFAULT_NONCE_KEY.into()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            relation_name: default_relation_name(),
            address_key: default_address_key(),
            leader_key: default_leader_key(),
            restart_key_prefix: default_restart_key_prefix(),
            nonce_key: default_nonce_key(),
        }
    }
}
