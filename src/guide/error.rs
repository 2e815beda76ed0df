//! Error types for tree navigation and tree validation

use thiserror::Error;

/// Errors raised by [`Navigator`](super::navigator::Navigator) operations.
///
/// All of these point at malformed data or a caller that got out of sync
/// with the navigator; none of them are transient.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// The current node (or the root) is not in the tree
    #[error("node '{node_id}' not found in decision tree")]
    NodeNotFound {
        /// Missing node id
        node_id: String,
    },

    /// The option id is not offered by the current node
    #[error("node '{node_id}' has no option '{option_id}'")]
    UnknownOption {
        /// Node the selection was made at
        node_id: String,
        /// Option id that was passed in
        option_id: String,
    },

    /// The option points at a node the tree does not contain
    #[error("option '{option_id}' of node '{node_id}' points to missing node '{next_node_id}'")]
    DanglingReference {
        /// Node owning the option
        node_id: String,
        /// Option carrying the reference
        option_id: String,
        /// Referenced node id
        next_node_id: String,
    },
}

/// Problems found while importing or checking a decision tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("failed to parse JSON: {0}")]
    InvalidJson(String),

    #[error("invalid decision tree format: must be a JSON object")]
    NotAnObject,

    #[error("invalid decision tree format: missing \"{0}\" (must contain \"rootNodeId\" and \"nodes\" properties)")]
    MissingField(&'static str),

    #[error("invalid rootNodeId: must be a non-empty string")]
    InvalidRootNodeId,

    #[error("invalid nodes format: \"nodes\" must be an object")]
    NodesNotAnObject,

    #[error("root node \"{0}\" not found in nodes")]
    RootNotFound(String),

    #[error("invalid node \"{node_id}\": {reason}")]
    MalformedNode { node_id: String, reason: String },

    #[error("node key \"{key}\" does not match node id \"{node_id}\"")]
    IdMismatch { key: String, node_id: String },

    #[error("node \"{0}\" has an empty question")]
    EmptyQuestion(String),

    #[error("node \"{node_id}\" lists option \"{option_id}\" more than once")]
    DuplicateOption { node_id: String, option_id: String },

    #[error("option \"{option_id}\" of node \"{node_id}\" points to missing node \"{next_node_id}\"")]
    DanglingReference {
        node_id: String,
        option_id: String,
        next_node_id: String,
    },

    #[error("node \"{0}\" is marked non-terminal but has no options")]
    NoOptions(String),

    #[error("no device selected for import")]
    NoDevice,
}

/// Result alias for navigator operations
pub type Result<T> = std::result::Result<T, NavigationError>;
