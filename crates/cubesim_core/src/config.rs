//! Graph configuration.
//!
//! Loaded once at startup by the host, usually as the `[graph]` table of the
//! simulator's TOML file.

use serde::{Deserialize, Serialize};

/// Tunables for the neighbor graph and its frame coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Drop links created and destroyed between two ticks instead of
    /// delivering an add/remove pair for them.
    pub collapse_transient_links: bool,
    /// Log a warning when a tick finds events an earlier tick should have
    /// drained.
    pub warn_on_missed_tick: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            collapse_transient_links: true,
            warn_on_missed_tick: true,
        }
    }
}
