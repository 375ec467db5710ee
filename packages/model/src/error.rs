//! Error types for the document model

use crate::node::NodeId;
use stagecraft_metadata::ClassName;
use thiserror::Error;

/// Failure reported by an [`crate::ObjectFactory`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MaterializationError {
    #[error("Cannot instantiate {class}: {reason}")]
    Instantiate { class: ClassName, reason: String },

    #[error("Cannot apply property {property} on {class}: {reason}")]
    ApplyProperty {
        class: ClassName,
        property: String,
        reason: String,
    },

    #[error("Cannot link child through {property} of {class}: {reason}")]
    Link {
        class: ClassName,
        property: String,
        reason: String,
    },
}

/// Recoverable failure of a primitive mutation
///
/// The graph is always left exactly as it was before the failed mutation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Materialization failed at node {node}: {source}")]
    Materialization {
        node: NodeId,
        #[source]
        source: MaterializationError,
    },
}

impl MutationError {
    pub fn materialization(node: NodeId, source: MaterializationError) -> Self {
        MutationError::Materialization { node, source }
    }
}
