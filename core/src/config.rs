use serde::{Deserialize, Serialize};

/// Display and policy toggles for a planning pass.
///
/// A pass sees a frozen copy of this; mutating a config between passes is
/// fine, mid-pass it is not observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Prose output ("Stay at ... for ...") instead of the compact table.
    pub verbatim: bool,
    /// Show cumulative runtime on each waypoint line.
    pub display_runtime: bool,
    /// Show the stop duration on each waypoint line.
    pub display_duration: bool,
    /// Include depth-transition legs in the output.
    pub display_transitions: bool,
    /// Move the shallowest deco stop from 3 m to 6 m.
    pub last_stop_6m: bool,
    /// Anchor GF-low at the deepest point of the dive rather than at the
    /// deepest computed ceiling.
    pub gf_low_at_maxdepth: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        PlannerConfig {
            verbatim: false,
            display_runtime: true,
            display_duration: false,
            display_transitions: false,
            last_stop_6m: false,
            gf_low_at_maxdepth: true,
        }
    }
}
