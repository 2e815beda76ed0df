use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::guide::error::ValidationError;
use crate::guide::node::DecisionNode;

/// The troubleshooting procedure for one device: a map of node-id -> node.
/// Nodes are kept sorted by id, so a stored tree always serializes the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionTree {
    pub device_id: String,
    pub root_node_id: String,
    pub nodes: BTreeMap<String, DecisionNode>,
}

impl DecisionTree {
    /// Build a tree from a list of nodes, keyed by their own ids.
    pub fn from_nodes(
        device_id: impl Into<String>,
        root_node_id: impl Into<String>,
        nodes: Vec<DecisionNode>,
    ) -> Self {
        let mut map = BTreeMap::new();
        for node in nodes {
            map.insert(node.id.clone(), node);
        }

        Self {
            device_id: device_id.into(),
            root_node_id: root_node_id.into(),
            nodes: map,
        }
    }

    pub fn get(&self, id: &str) -> Option<&DecisionNode> {
        self.nodes.get(id)
    }

    pub fn root(&self) -> Option<&DecisionNode> {
        self.get(&self.root_node_id)
    }

    /// Ids of every node reachable from the root, in breadth-first order.
    /// Cycles are fine; each node is listed once.
    pub fn reachable(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();

        if let Some((id, _)) = self.nodes.get_key_value(&self.root_node_id) {
            queue.push_back(id.as_str());
        }

        while let Some(id) = queue.pop_front() {
            if !seen.insert(id) {
                continue;
            }
            order.push(id);
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            for next in node.options.iter().filter_map(|o| o.next_node_id.as_deref()) {
                if let Some((key, _)) = self.nodes.get_key_value(next) {
                    if !seen.contains(key.as_str()) {
                        queue.push_back(key.as_str());
                    }
                }
            }
        }

        order
    }

    /// Node ids that cannot be reached from the root, sorted.
    pub fn unreachable(&self) -> Vec<&str> {
        let reachable: HashSet<&str> = self.reachable().into_iter().collect();
        self.nodes
            .keys()
            .map(String::as_str)
            .filter(|id| !reachable.contains(id))
            .collect()
    }

    /// Check every integrity rule and return all violations found.
    /// Nodes are visited in id order so the report is stable.
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !self.nodes.contains_key(&self.root_node_id) {
            errors.push(ValidationError::RootNotFound(self.root_node_id.clone()));
        }

        for (key, node) in &self.nodes {
            if &node.id != key {
                errors.push(ValidationError::IdMismatch {
                    key: key.clone(),
                    node_id: node.id.clone(),
                });
            }
            if node.question.trim().is_empty() {
                errors.push(ValidationError::EmptyQuestion(key.clone()));
            }
            if node.is_terminal == Some(false) && node.options.is_empty() {
                errors.push(ValidationError::NoOptions(key.clone()));
            }

            let mut option_ids = HashSet::new();
            for option in &node.options {
                if !option_ids.insert(option.id.as_str()) {
                    errors.push(ValidationError::DuplicateOption {
                        node_id: key.clone(),
                        option_id: option.id.clone(),
                    });
                }
                if let Some(next) = &option.next_node_id {
                    if !self.nodes.contains_key(next) {
                        errors.push(ValidationError::DanglingReference {
                            node_id: key.clone(),
                            option_id: option.id.clone(),
                            next_node_id: next.clone(),
                        });
                    }
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
