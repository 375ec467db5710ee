//! # Stagecraft Model
//!
//! The document node graph and the primitive mutations that edit it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ DocumentModel                               │
//! │  - NodeGraph (declarative tree, arena)      │
//! │  - PropertyCatalog (metadata oracle)        │
//! │  - ObjectFactory (runtime objects)          │
//! └─────────────────────────────────────────────┘
//!                     ↑
//! ┌─────────────────────────────────────────────┐
//! │ Mutation: attach / detach / set scalar ...  │
//! │  declarative change first, runtime second,  │
//! │  declarative rollback if runtime fails      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Stable identity**: nodes live in an arena and are addressed by
//!    [`NodeId`]. Detaching a node never frees it, so ids held by undo
//!    history stay valid.
//! 2. **Two representations, one API**: every instance node owns its
//!    runtime object; only [`Mutation::apply`] changes either side.
//! 3. **Weak references**: reference nodes name their target by identifier
//!    and are resolved through an index, never through an owning edge.

mod error;
mod fragment;
mod graph;
mod model;
mod mutation;
mod node;
mod runtime;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{MaterializationError, MutationError};
pub use fragment::{ContentFragment, Fragment, InstanceFragment, PropertyFragment};
pub use graph::{NodeGraph, Walk};
pub use model::DocumentModel;
pub use mutation::Mutation;
pub use node::{InstanceNode, Node, NodeId, NodeKind, PropertySlot, ReferenceNode, SlotContent};
pub use runtime::{ObjectFactory, RuntimeObject};

// Re-export metadata types used throughout the model API
pub use stagecraft_metadata::{ClassName, GridAxis, GridLayout, PropertyCatalog, Value};
