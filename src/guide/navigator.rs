use log::debug;
use serde::Serialize;

use crate::guide::error::{NavigationError, Result};
use crate::guide::node::{DecisionNode, DecisionOption};
use crate::guide::tree::DecisionTree;

/// One step already taken: the node that was current and the option picked there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationStep {
    pub node_id: String,
    pub selected_option: String,
}

/// What a call to [`Navigator::select`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<'a> {
    /// Moved to a new node.
    Advanced(&'a DecisionNode),
    /// The option has no next node. Position and history are unchanged and
    /// the option (with its inline solution, if any) should be shown in place.
    Resolved {
        node: &'a DecisionNode,
        option: &'a DecisionOption,
    },
}

impl<'a> Selection<'a> {
    /// The current node after the selection.
    pub fn node(&self) -> &'a DecisionNode {
        match self {
            Selection::Advanced(node) => node,
            Selection::Resolved { node, .. } => node,
        }
    }
}

/// Walks one decision tree for one session.
///
/// The tree is borrowed and never modified. History is an explicit stack of
/// steps, so walking a cycle and stepping back retraces the actual path.
#[derive(Debug, Clone)]
pub struct Navigator<'a> {
    tree: &'a DecisionTree,
    root: &'a DecisionNode,
    current_node_id: String,
    history: Vec<NavigationStep>,
}

impl<'a> Navigator<'a> {
    /// Start a session at the tree's root. Fails if the root is missing.
    pub fn new(tree: &'a DecisionTree) -> Result<Self> {
        let root = tree
            .root()
            .ok_or_else(|| NavigationError::NodeNotFound {
                node_id: tree.root_node_id.clone(),
            })?;

        debug!("Navigator for {} at root {}", tree.device_id, tree.root_node_id);

        Ok(Self {
            tree,
            root,
            current_node_id: tree.root_node_id.clone(),
            history: Vec::new(),
        })
    }

    pub fn current_node_id(&self) -> &str {
        &self.current_node_id
    }

    pub fn history(&self) -> &[NavigationStep] {
        &self.history
    }

    pub fn current(&self) -> Result<&'a DecisionNode> {
        self.tree
            .get(&self.current_node_id)
            .ok_or_else(|| NavigationError::NodeNotFound {
                node_id: self.current_node_id.clone(),
            })
    }

    /// Pick an option at the current node.
    ///
    /// An option with a `next_node_id` records a history step and moves
    /// there, even if it also carries a solution. An option without one
    /// leaves the navigator where it is. On error nothing changes.
    pub fn select(&mut self, option_id: &str) -> Result<Selection<'a>> {
        let node = self.current()?;
        let option = node
            .option(option_id)
            .ok_or_else(|| NavigationError::UnknownOption {
                node_id: node.id.clone(),
                option_id: option_id.to_string(),
            })?;

        let Some(next_id) = option.next_node_id.as_deref() else {
            debug!("Option {} at {} resolves in place", option_id, node.id);
            return Ok(Selection::Resolved { node, option });
        };

        let next = self
            .tree
            .get(next_id)
            .ok_or_else(|| NavigationError::DanglingReference {
                node_id: node.id.clone(),
                option_id: option_id.to_string(),
                next_node_id: next_id.to_string(),
            })?;

        debug!("Transition: {} -> {} (option {})", node.id, next_id, option_id);

        self.history.push(NavigationStep {
            node_id: std::mem::replace(&mut self.current_node_id, next_id.to_string()),
            selected_option: option_id.to_string(),
        });

        Ok(Selection::Advanced(next))
    }

    /// Step back to the node before the last transition. With no history
    /// this leaves everything as it is.
    pub fn back(&mut self) -> Result<&'a DecisionNode> {
        if let Some(step) = self.history.pop() {
            debug!(
                "Back: {} -> {} (undoing option {})",
                self.current_node_id, step.node_id, step.selected_option
            );
            self.current_node_id = step.node_id;
        }
        self.current()
    }

    pub fn restart(&mut self) -> &'a DecisionNode {
        debug!("Restart at {}", self.tree.root_node_id);
        self.current_node_id = self.tree.root_node_id.clone();
        self.history.clear();
        self.root
    }

    pub fn is_terminal(&self, node: &DecisionNode) -> bool {
        node.is_terminal()
    }

    /// Step counter for display: one more than the number of steps taken.
    pub fn progress(&self) -> usize {
        self.history.len() + 1
    }

    /// [`progress`](Self::progress) as a percentage of `expected_steps`,
    /// capped at 100. Purely cosmetic.
    pub fn progress_percent(&self, expected_steps: usize) -> u8 {
        if expected_steps == 0 {
            return 100;
        }
        let percent = self.progress().saturating_mul(100) / expected_steps;
        percent.min(100) as u8
    }
}
