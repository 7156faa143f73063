//! Demo settings read from the environment.
//!
//! - `DYNAMIC_CARD_SEED`:  u64 seed for reproducible node identities
//! - `DYNAMIC_CARD_NODES`: node count override

use dynamic_card::CardConfig;

pub const SEED_VAR: &str = "DYNAMIC_CARD_SEED";
pub const NODES_VAR: &str = "DYNAMIC_CARD_NODES";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoSettings {
    pub seed: Option<u64>,
    pub node_count: Option<usize>,
}

impl DemoSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Unparseable values are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            seed: parse_var(&lookup, SEED_VAR),
            node_count: parse_var(&lookup, NODES_VAR),
        }
    }

    pub fn card_config(&self) -> CardConfig {
        let config = CardConfig::default();
        match self.node_count {
            Some(n) => config.with_node_count(n),
            None => config,
        }
    }
}

fn parse_var<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(e) => {
            log::warn!("Ignoring {}={:?}: {}", key, raw, e);
            None
        }
    }
}
