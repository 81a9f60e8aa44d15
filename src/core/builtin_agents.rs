//! Built-in agent roster
//!
//! The default roster is embedded from builtin_agents.toml at build time. A
//! config file may replace it with its own `[[agents]]` table.

use serde::Deserialize;

use crate::api::Agent;

#[derive(Debug, Deserialize)]
struct BuiltinAgentsConfig {
    agents: Vec<Agent>,
}

/// Load the built-in roster from the embedded table
pub fn load_builtin_agents() -> Vec<Agent> {
    const CONFIG_CONTENT: &str = include_str!("../builtin_agents.toml");

    let config: BuiltinAgentsConfig =
        toml::from_str(CONFIG_CONTENT).expect("Failed to parse builtin_agents.toml");

    config.agents
}

/// The roster to start from: configured agents when any are given, the
/// built-in ones otherwise.
pub fn default_roster(configured: &[Agent]) -> Vec<Agent> {
    let configured: Vec<Agent> = configured
        .iter()
        .filter(|agent| !agent.id.trim().is_empty())
        .cloned()
        .collect();
    if configured.is_empty() {
        load_builtin_agents()
    } else {
        configured
    }
}
