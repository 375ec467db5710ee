//! # Primitive Mutations
//!
//! The only operations that change a [`DocumentModel`].
//!
//! ## Semantics
//!
//! ### Attach / Detach
//! - Attach links a detached node at an index; the node must have no parent
//! - Detach unlinks whatever sits at an index and keeps the node alive
//! - Runtime children are inserted or removed at the matching object index
//!
//! ### SetScalar
//! - Atomic replacement of a scalar slot value
//! - Pushed into the owner's runtime object when the slot is attached
//!
//! ### SetIdentifier / SetCustomRoot / SetReferenceTarget
//! - Declarative only, indexes updated in place
//!
//! Every successful application returns the mutation that undoes it.

use crate::error::MutationError;
use crate::model::DocumentModel;
use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use stagecraft_metadata::Value;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Mutation {
    /// Link a detached node at `index` under `parent`
    Attach {
        parent: NodeId,
        index: usize,
        node: NodeId,
    },

    /// Unlink the node at `index` under `parent`
    Detach { parent: NodeId, index: usize },

    SetScalar { slot: NodeId, value: Value },

    SetIdentifier {
        node: NodeId,
        identifier: Option<String>,
    },

    SetCustomRoot { node: NodeId, enabled: bool },

    SetReferenceTarget { node: NodeId, target: String },
}

impl Mutation {
    /// Apply to `model`, returning the inverse mutation
    ///
    /// Panics when the mutation breaks a structural contract (attaching a
    /// parented node, creating a cycle, addressing a missing index).
    pub fn apply(&self, model: &mut DocumentModel) -> Result<Mutation, MutationError> {
        trace!(mutation = ?self, "applying");
        let inverse = match self {
            Mutation::Attach { parent, index, node } => {
                model.attach(*parent, *index, *node)?;
                Mutation::Detach {
                    parent: *parent,
                    index: *index,
                }
            }
            Mutation::Detach { parent, index } => {
                let node = model.detach(*parent, *index)?;
                Mutation::Attach {
                    parent: *parent,
                    index: *index,
                    node,
                }
            }
            Mutation::SetScalar { slot, value } => {
                let previous = model.set_scalar(*slot, value.clone())?;
                Mutation::SetScalar {
                    slot: *slot,
                    value: previous,
                }
            }
            Mutation::SetIdentifier { node, identifier } => Mutation::SetIdentifier {
                node: *node,
                identifier: model.set_identifier(*node, identifier.clone()),
            },
            Mutation::SetCustomRoot { node, enabled } => Mutation::SetCustomRoot {
                node: *node,
                enabled: model.set_custom_root(*node, *enabled),
            },
            Mutation::SetReferenceTarget { node, target } => Mutation::SetReferenceTarget {
                node: *node,
                target: model.set_reference_target(*node, target.clone()),
            },
        };
        Ok(inverse)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Mutation::Attach { .. } => "attach",
            Mutation::Detach { .. } => "detach",
            Mutation::SetScalar { .. } => "set_scalar",
            Mutation::SetIdentifier { .. } => "set_identifier",
            Mutation::SetCustomRoot { .. } => "set_custom_root",
            Mutation::SetReferenceTarget { .. } => "set_reference_target",
        }
    }
}
