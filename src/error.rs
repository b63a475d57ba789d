//! 链模型的错误分类
//!
//! Mutation and extraction failures are `ChainError`, structural validation
//! failures are `ValidationError`, and payload construction failures are
//! `AggregateError`. None of them leave the chain store partially modified.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("Unknown node type '{0}'")]
    UnknownType(String),

    #[error("Node not found: {0}")]
    UnknownNode(String),

    #[error("Duplicate node ID: {0}")]
    DuplicateId(String),

    #[error("Only {limit} '{type_tag}' node(s) may exist at a time")]
    LimitExceeded { type_tag: String, limit: usize },

    #[error("Node '{0}' cannot be deleted")]
    Immortal(String),

    #[error("Cannot connect '{source_id}' to '{target_id}': {reason}")]
    CapabilityMismatch {
        source_id: String,
        target_id: String,
        reason: String,
    },

    #[error("Node '{node_id}' already has a {side} link")]
    AlreadyLinked { node_id: String, side: LinkSide },

    #[error("Cycle detected at node '{0}'")]
    CycleDetected(String),

    /// Node data whose variant belongs to a different node type.
    #[error("Node '{node_id}' holds data that does not belong to a '{type_tag}' node")]
    DataMismatch { node_id: String, type_tag: String },

    /// A link pointer that is dangling or not mirrored by its neighbour.
    #[error("Broken link between '{from}' and '{to}'")]
    BrokenLink { from: String, to: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    Input,
    Output,
}

impl std::fmt::Display for LinkSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Connect Start to End to build a pipeline")]
    NoCompleteChain,

    #[error("Only one pipeline can be defined at a time ({0} found)")]
    MultipleChains(usize),

    #[error("Too many '{type_tag}' nodes in the pipeline (limit {limit})")]
    LimitExceeded { type_tag: String, limit: usize },

    /// Message produced by a vocabulary-specific chain rule.
    #[error("{0}")]
    Domain(String),

    #[error(transparent)]
    Extraction(#[from] ChainError),
}

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Node not found in run: {0}")]
    UnknownNode(String),

    #[error("Node '{0}' is not the terminal node of the run")]
    NotTerminal(String),

    #[error("No source node found upstream of '{0}'")]
    MissingSource(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
