//! Routing targets.

use serde::{Deserialize, Serialize};

use super::NodeName;

/// Where an edge or dispatch entry leads: another node, or the end of
/// the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Continue with the named node.
    Node(NodeName),
    /// Finish the run successfully.
    Terminal,
}

/// The terminal sentinel. Not a node: routing here completes the run.
pub const TERMINAL: Target = Target::Terminal;

impl Target {
    /// Returns whether this target ends the run.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Target::Terminal)
    }

    /// Returns the target node name, if this target is a node.
    pub fn node(&self) -> Option<&NodeName> {
        match self {
            Target::Node(name) => Some(name),
            Target::Terminal => None,
        }
    }
}

impl From<NodeName> for Target {
    fn from(name: NodeName) -> Self {
        Target::Node(name)
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Node(name.into())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Node(name.into())
    }
}
