//! Engine configuration

use std::time::Duration;

use vigil_consensus::ConsensusConfig;
use vigil_registry::RegistryConfig;
use vigil_router::RouterConfig;

/// Aggregate configuration for the engine and its components
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub registry: RegistryConfig,
    pub consensus: ConsensusConfig,
    pub router: RouterConfig,
    /// Cadence of the background expiry sweep
    pub sweep_interval: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            consensus: ConsensusConfig::default(),
            router: RouterConfig::default(),
            sweep_interval: Duration::from_secs(300),
        }
    }
}
