//! TOML configuration for the simulator.
//!
//! Every section is optional; missing fields take the same defaults as the
//! command-line flags. Flags given on the command line win over the file.

use std::path::Path;

use anyhow::Context;
use loadring_router::Options;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Mapper tuning, passed straight to the router.
    pub router: Options,
    /// Node and key generation.
    pub workload: WorkloadSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[workload]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WorkloadSection {
    /// Number of nodes, named `node-0..node-N`.
    pub nodes: usize,
    /// Number of keys to route.
    pub keys: usize,
    /// Zipf skew `s`. 0 means uniform keys.
    pub zipf_s: f64,
    /// Seed for the workload RNG and the mapper hash.
    ///
    /// Taken from the clock when unset; the value used is echoed in the
    /// report so runs can be replayed.
    pub seed: Option<u64>,
}

impl Default for WorkloadSection {
    fn default() -> Self {
        Self {
            nodes: 8,
            keys: 100_000,
            zipf_s: 0.0,
            seed: None,
        }
    }
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SimConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read {}", p.display()))?;
                let config: SimConfig = toml::from_str(&content)
                    .with_context(|| format!("failed to parse {}", p.display()))?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}
