use serde::{Deserialize, Serialize};

/// A single question in a troubleshooting tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionNode {
    /// Unique identifier within the tree (e.g. "initial-problem").
    pub id: String,
    /// The question shown to the agent.
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Vec<DecisionOption>,
    /// Explicit end-state marker. Terminal-ness is otherwise inferred, see
    /// [`DecisionNode::is_terminal`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_terminal: Option<bool>,
    /// Recommended action, shown when the node is terminal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

/// A choice offered at a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionOption {
    pub id: String,
    pub text: String,
    /// Node to move to. `None` means picking this option ends the walk here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_node_id: Option<String>,
    /// Solution rendered directly under the option, without leaving the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

impl DecisionOption {
    /// True when the option carries a non-empty inline solution.
    pub fn has_solution(&self) -> bool {
        self.solution.as_deref().is_some_and(|s| !s.is_empty())
    }
}

impl DecisionNode {
    pub fn option(&self, option_id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    /// A node is terminal when it is explicitly flagged so, or when none of
    /// its options lead anywhere: every option either lacks a `next_node_id`
    /// or carries an inline solution. A node without options is terminal.
    pub fn is_terminal(&self) -> bool {
        self.is_terminal == Some(true)
            || self
                .options
                .iter()
                .all(|o| o.next_node_id.is_none() || o.has_solution())
    }
}
