use std::collections::BTreeMap;

use log::{debug, warn};
use serde_json::Value;

use crate::guide::error::ValidationError;
use crate::guide::node::DecisionNode;
use crate::guide::tree::DecisionTree;

/// Turn a caller-supplied JSON document into a [`DecisionTree`] for `device_id`.
///
/// Checks run in order and the first failure is returned: valid JSON, an
/// object with a `rootNodeId` string and a `nodes` object, the root present in
/// `nodes`, every node well-formed, a target device. Any `deviceId` in the
/// document is ignored in favour of `device_id`.
pub fn import_tree(device_id: &str, json: &str) -> Result<DecisionTree, ValidationError> {
    let parsed: Value =
        serde_json::from_str(json).map_err(|e| ValidationError::InvalidJson(e.to_string()))?;

    let doc = parsed.as_object().ok_or(ValidationError::NotAnObject)?;

    let root = doc
        .get("rootNodeId")
        .ok_or(ValidationError::MissingField("rootNodeId"))?;
    let nodes = doc
        .get("nodes")
        .ok_or(ValidationError::MissingField("nodes"))?;

    let root_node_id = match root.as_str() {
        Some(id) if !id.is_empty() => id.to_string(),
        _ => return Err(ValidationError::InvalidRootNodeId),
    };

    let nodes = nodes.as_object().ok_or(ValidationError::NodesNotAnObject)?;

    if !nodes.contains_key(&root_node_id) {
        return Err(ValidationError::RootNotFound(root_node_id));
    }

    let mut typed = BTreeMap::new();
    for (key, raw) in nodes {
        let node: DecisionNode =
            serde_json::from_value(raw.clone()).map_err(|e| ValidationError::MalformedNode {
                node_id: key.clone(),
                reason: e.to_string(),
            })?;
        typed.insert(key.clone(), node);
    }

    if device_id.is_empty() {
        return Err(ValidationError::NoDevice);
    }

    let tree = DecisionTree {
        device_id: device_id.to_string(),
        root_node_id,
        nodes: typed,
    };

    // Deeper integrity problems don't block the import; the navigator
    // reports them if a session actually runs into one.
    if let Err(problems) = tree.validate() {
        for problem in &problems {
            warn!("Imported tree for {device_id}: {problem}");
        }
    }
    for orphan in tree.unreachable() {
        warn!("Imported tree for {device_id}: node {orphan} is unreachable from the root");
    }

    debug!(
        "Imported tree for {} ({} nodes, root {})",
        device_id,
        tree.nodes.len(),
        tree.root_node_id
    );

    Ok(tree)
}
