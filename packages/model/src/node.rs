use crate::runtime::RuntimeObject;
use serde::{Deserialize, Serialize};
use stagecraft_metadata::{ClassName, Value};
use std::fmt;

/// Stable arena address of a document node
///
/// Ids are never reused while the graph lives, so jobs sitting in undo
/// history can hold them across arbitrary structural edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// The synthetic container standing for "no parent"
    pub const ROOT: NodeId = NodeId(0);

    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One entry of the node arena
#[derive(Debug)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Structural parent: a property slot, an instance (for slots) or the root marker
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn as_instance(&self) -> Option<&InstanceNode> {
        match &self.kind {
            NodeKind::Instance(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_slot(&self) -> Option<&PropertySlot> {
        match &self.kind {
            NodeKind::Property(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceNode> {
        match &self.kind {
            NodeKind::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn is_instance(&self) -> bool {
        matches!(self.kind, NodeKind::Instance(_))
    }

    /// Child ids in structural order, empty for leaves
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Root { child } => child.as_slice(),
            NodeKind::Instance(instance) => &instance.properties,
            NodeKind::Property(PropertySlot {
                content: SlotContent::Nodes(nodes),
                ..
            }) => nodes,
            NodeKind::Property(_) | NodeKind::Reference(_) => &[],
        }
    }
}

/// Tagged variant over the kinds of document node
#[derive(Debug)]
pub enum NodeKind {
    /// Root marker holding at most one top-level instance
    Root { child: Option<NodeId> },
    Instance(InstanceNode),
    Property(PropertySlot),
    Reference(ReferenceNode),
}

/// Node standing for one constructed object
#[derive(Debug)]
pub struct InstanceNode {
    pub(crate) class: ClassName,
    pub(crate) identifier: Option<String>,
    pub(crate) custom_root: bool,
    pub(crate) properties: Vec<NodeId>,
    pub(crate) object: Option<RuntimeObject>,
}

impl InstanceNode {
    pub fn class(&self) -> &ClassName {
        &self.class
    }

    /// Document-wide name other nodes can reference
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    /// Whether the instance is declared as a custom root element
    pub fn is_custom_root(&self) -> bool {
        self.custom_root
    }

    /// Owned property slots in declaration order
    pub fn properties(&self) -> &[NodeId] {
        &self.properties
    }

    pub fn object(&self) -> Option<&RuntimeObject> {
        self.object.as_ref()
    }
}

/// Named attachment point owned by an instance
#[derive(Debug)]
pub struct PropertySlot {
    pub(crate) name: String,
    pub(crate) content: SlotContent,
}

impl PropertySlot {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &SlotContent {
        &self.content
    }

    pub fn scalar(&self) -> Option<&Value> {
        match &self.content {
            SlotContent::Scalar(value) => Some(value),
            SlotContent::Nodes(_) => None,
        }
    }

    pub fn is_collection(&self) -> bool {
        matches!(self.content, SlotContent::Nodes(_))
    }
}

/// What a property slot holds
#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    Scalar(Value),
    /// Ordered child nodes; order is significant
    Nodes(Vec<NodeId>),
}

/// Non-owning pointer to an instance by identifier
#[derive(Debug)]
pub struct ReferenceNode {
    pub(crate) target: String,
}

impl ReferenceNode {
    pub fn target(&self) -> &str {
        &self.target
    }
}
