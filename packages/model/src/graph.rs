//! # Document Node Graph
//!
//! Arena of document nodes plus the indexes derived from the attached tree.
//!
//! ## Design
//!
//! - Nodes are never freed individually. A detached node keeps its id, its
//!   property slots and its runtime object, so reattaching it (undo, redo,
//!   reparent) restores it exactly.
//! - Only nodes reachable from [`NodeId::ROOT`] are *attached*. The
//!   identifier index and the reference index cover attached nodes only and
//!   are updated incrementally by every link/unlink.
//! - Structural edits are crate-private. Callers outside this crate edit the
//!   graph through [`crate::Mutation`].

use crate::fragment::{ContentFragment, Fragment, InstanceFragment, PropertyFragment};
use crate::node::{InstanceNode, Node, NodeId, NodeKind, PropertySlot, ReferenceNode, SlotContent};
use crate::runtime::RuntimeObject;
use stagecraft_metadata::Value;
use std::collections::HashMap;
use std::iter;
use tracing::trace;

#[derive(Debug)]
pub struct NodeGraph {
    nodes: Vec<Node>,
    /// identifier -> attached instances declaring it
    identifiers: HashMap<String, Vec<NodeId>>,
    /// identifier -> attached reference nodes targeting it
    references: HashMap<String, Vec<NodeId>>,
}

impl Default for NodeGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeGraph {
    /// Empty graph holding only the root marker
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                id: NodeId::ROOT,
                parent: None,
                kind: NodeKind::Root { child: None },
            }],
            identifiers: HashMap::new(),
            references: HashMap::new(),
        }
    }

    /// Top-level instance of the document, if any
    pub fn root(&self) -> Option<NodeId> {
        match self.nodes[0].kind {
            NodeKind::Root { child } => child,
            _ => None,
        }
    }

    /// True when the document has no content
    pub fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    /// Number of allocated nodes, detached ones and the root marker included
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.index() < self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn instance(&self, id: NodeId) -> Option<&InstanceNode> {
        self.node(id).and_then(Node::as_instance)
    }

    pub fn slot(&self, id: NodeId) -> Option<&PropertySlot> {
        self.node(id).and_then(Node::as_slot)
    }

    pub fn reference(&self, id: NodeId) -> Option<&ReferenceNode> {
        self.node(id).and_then(Node::as_reference)
    }

    pub fn object(&self, id: NodeId) -> Option<&RuntimeObject> {
        self.instance(id).and_then(InstanceNode::object)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(Node::children).unwrap_or(&[])
    }

    /// Parents of `id`, nearest first, ending at the root marker when attached
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        iter::successors(self.parent(id), move |current| self.parent(*current))
    }

    pub fn is_attached(&self, id: NodeId) -> bool {
        id == NodeId::ROOT || self.ancestors(id).any(|a| a == NodeId::ROOT)
    }

    /// Whether `node` is `ancestor` or lies in its subtree
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        node == ancestor || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Instance owning the slot that holds `id`
    pub fn parent_instance(&self, id: NodeId) -> Option<NodeId> {
        let slot = self.parent(id)?;
        self.slot(slot)?;
        self.parent(slot).filter(|owner| self.instance(*owner).is_some())
    }

    /// Property slot of `instance` named `name`
    pub fn slot_of(&self, instance: NodeId, name: &str) -> Option<NodeId> {
        self.instance(instance)?
            .properties
            .iter()
            .copied()
            .find(|slot| self.slot(*slot).map(|s| s.name == name).unwrap_or(false))
    }

    /// Scalar value of property `name` on `instance`
    pub fn property_value(&self, instance: NodeId, name: &str) -> Option<&Value> {
        self.slot_of(instance, name)
            .and_then(|slot| self.slot(slot))
            .and_then(PropertySlot::scalar)
    }

    /// Children of the collection property `name` on `instance`
    pub fn property_children(&self, instance: NodeId, name: &str) -> &[NodeId] {
        match self.slot_of(instance, name) {
            Some(slot) => self.children(slot),
            None => &[],
        }
    }

    /// Parent and index of `id` inside the parent's child list
    pub fn position_of(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(id)?;
        let index = self.children(parent).iter().position(|c| *c == id)?;
        Some((parent, index))
    }

    /// First attached instance declaring `identifier`
    pub fn find_by_identifier(&self, identifier: &str) -> Option<NodeId> {
        self.identified(identifier).first().copied()
    }

    /// All attached instances declaring `identifier`
    pub fn identified(&self, identifier: &str) -> &[NodeId] {
        self.identifiers
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Identifiers currently declared in the attached tree
    pub fn identifiers(&self) -> impl Iterator<Item = (&str, &[NodeId])> {
        self.identifiers
            .iter()
            .map(|(name, ids)| (name.as_str(), ids.as_slice()))
    }

    /// Attached reference nodes targeting `identifier`
    pub fn references_to(&self, identifier: &str) -> &[NodeId] {
        self.references
            .get(identifier)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Target of a reference node when it resolves to exactly one instance
    pub fn resolve(&self, reference: NodeId) -> Option<NodeId> {
        let target = self.reference(reference)?.target();
        match self.identified(target) {
            [single] => Some(*single),
            _ => None,
        }
    }

    /// Depth-first, pre-order traversal starting at `start`
    pub fn walk(&self, start: NodeId) -> Walk<'_> {
        let stack = if self.contains(start) {
            vec![start]
        } else {
            Vec::new()
        };
        Walk { graph: self, stack }
    }

    /// Traversal of the attached document, root marker excluded
    pub fn iter(&self) -> Walk<'_> {
        let stack = self.root().into_iter().collect();
        Walk { graph: self, stack }
    }

    /// Declarative snapshot of the subtree at `node`
    ///
    /// Runtime objects are not part of the snapshot. Returns `None` for the
    /// root marker and property slots.
    pub fn extract(&self, node: NodeId) -> Option<Fragment> {
        match &self.node(node)?.kind {
            NodeKind::Instance(instance) => {
                let properties = instance
                    .properties
                    .iter()
                    .filter_map(|slot_id| {
                        let slot = self.slot(*slot_id)?;
                        let content = match &slot.content {
                            SlotContent::Scalar(value) => ContentFragment::Scalar(value.clone()),
                            SlotContent::Nodes(children) => ContentFragment::Nodes(
                                children.iter().filter_map(|c| self.extract(*c)).collect(),
                            ),
                        };
                        Some(PropertyFragment {
                            name: slot.name.clone(),
                            content,
                        })
                    })
                    .collect();

                Some(Fragment::Instance(InstanceFragment {
                    class: instance.class.clone(),
                    identifier: instance.identifier.clone(),
                    custom_root: instance.custom_root,
                    properties,
                }))
            }
            NodeKind::Reference(reference) => Some(Fragment::Reference {
                target: reference.target.clone(),
            }),
            NodeKind::Root { .. } | NodeKind::Property(_) => None,
        }
    }

    // Crate-private editing. Contract violations panic: they mean a caller
    // already broke the single-parent tree invariant.

    pub(crate) fn mark(&self) -> usize {
        self.nodes.len()
    }

    /// Drop every node allocated after `mark`
    pub(crate) fn truncate(&mut self, mark: usize) {
        assert!(mark >= 1, "cannot truncate the root marker");
        debug_assert!(self.nodes[mark..]
            .iter()
            .all(|node| node.parent.map(|p| p.index() >= mark).unwrap_or(true)));
        self.nodes.truncate(mark);
    }

    pub(crate) fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node {
            id,
            parent: None,
            kind,
        });
        id
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        match self.nodes.get_mut(id.index()) {
            Some(node) => node,
            None => panic!("unknown node {}", id),
        }
    }

    fn expect_node(&self, id: NodeId) -> &Node {
        match self.node(id) {
            Some(node) => node,
            None => panic!("unknown node {}", id),
        }
    }

    /// Insert `node` at `index` in the child list of `parent`
    pub(crate) fn link(&mut self, parent: NodeId, index: usize, node: NodeId) {
        let child = self.expect_node(node);
        if let Some(existing) = child.parent {
            panic!(
                "contract violation: node {} is already attached to {}; detach it first",
                node, existing
            );
        }
        assert!(
            !self.is_within(parent, node),
            "contract violation: attaching {} under {} would create a cycle",
            node,
            parent
        );

        let child_kind = match &child.kind {
            NodeKind::Root { .. } => panic!("contract violation: the root marker cannot be attached"),
            NodeKind::Instance(_) => "instance",
            NodeKind::Property(_) => "property",
            NodeKind::Reference(_) => "reference",
        };

        let parent_node = self.node_mut(parent);
        match &mut parent_node.kind {
            NodeKind::Root { child } => {
                assert!(
                    child_kind == "instance" && child.is_none() && index == 0,
                    "contract violation: the root marker holds a single instance"
                );
                *child = Some(node);
            }
            NodeKind::Instance(instance) => {
                assert!(
                    child_kind == "property",
                    "contract violation: instance {} only owns property slots, got {}",
                    parent,
                    child_kind
                );
                assert!(index <= instance.properties.len(), "slot index {} out of range", index);
                instance.properties.insert(index, node);
            }
            NodeKind::Property(PropertySlot {
                content: SlotContent::Nodes(nodes),
                ..
            }) => {
                assert!(
                    child_kind == "instance" || child_kind == "reference",
                    "contract violation: collection {} only holds instances and references",
                    parent
                );
                assert!(index <= nodes.len(), "child index {} out of range", index);
                nodes.insert(index, node);
            }
            NodeKind::Property(_) | NodeKind::Reference(_) => {
                panic!("contract violation: node {} cannot hold children", parent)
            }
        }

        self.node_mut(node).parent = Some(parent);

        if self.is_attached(parent) {
            self.index_subtree(node);
        }
        trace!(%parent, index, %node, "linked");
    }

    /// Remove and return the child at `index` of `parent`
    pub(crate) fn unlink(&mut self, parent: NodeId, index: usize) -> NodeId {
        let attached = self.is_attached(parent);

        let node = match &mut self.node_mut(parent).kind {
            NodeKind::Root { child } => {
                assert!(index == 0, "root marker index {} out of range", index);
                match child.take() {
                    Some(node) => node,
                    None => panic!("contract violation: the document is already empty"),
                }
            }
            NodeKind::Instance(InstanceNode { properties: list, .. })
            | NodeKind::Property(PropertySlot {
                content: SlotContent::Nodes(list),
                ..
            }) => {
                assert!(index < list.len(), "child index {} out of range", index);
                list.remove(index)
            }
            NodeKind::Property(_) | NodeKind::Reference(_) => {
                panic!("contract violation: node {} has no children", parent)
            }
        };

        if attached {
            self.unindex_subtree(node);
        }
        self.node_mut(node).parent = None;
        trace!(%parent, index, %node, "unlinked");
        node
    }

    pub(crate) fn replace_scalar(&mut self, slot: NodeId, value: Value) -> Value {
        match &mut self.node_mut(slot).kind {
            NodeKind::Property(PropertySlot {
                content: SlotContent::Scalar(current),
                ..
            }) => std::mem::replace(current, value),
            _ => panic!("contract violation: {} is not a scalar property slot", slot),
        }
    }

    pub(crate) fn replace_identifier(
        &mut self,
        node: NodeId,
        identifier: Option<String>,
    ) -> Option<String> {
        let attached = self.is_attached(node);
        let previous = match &mut self.node_mut(node).kind {
            NodeKind::Instance(instance) => {
                std::mem::replace(&mut instance.identifier, identifier.clone())
            }
            _ => panic!("contract violation: {} is not an instance", node),
        };

        if attached {
            if let Some(old) = &previous {
                remove_entry(&mut self.identifiers, old, node);
            }
            if let Some(new) = identifier {
                self.identifiers.entry(new).or_default().push(node);
            }
        }
        previous
    }

    pub(crate) fn replace_custom_root(&mut self, node: NodeId, enabled: bool) -> bool {
        match &mut self.node_mut(node).kind {
            NodeKind::Instance(instance) => std::mem::replace(&mut instance.custom_root, enabled),
            _ => panic!("contract violation: {} is not an instance", node),
        }
    }

    pub(crate) fn replace_reference_target(&mut self, node: NodeId, target: String) -> String {
        let attached = self.is_attached(node);
        let previous = match &mut self.node_mut(node).kind {
            NodeKind::Reference(reference) => std::mem::replace(&mut reference.target, target.clone()),
            _ => panic!("contract violation: {} is not a reference", node),
        };

        if attached {
            remove_entry(&mut self.references, &previous, node);
            self.references.entry(target).or_default().push(node);
        }
        previous
    }

    pub(crate) fn take_object(&mut self, id: NodeId) -> Option<RuntimeObject> {
        match &mut self.node_mut(id).kind {
            NodeKind::Instance(instance) => instance.object.take(),
            _ => None,
        }
    }

    pub(crate) fn put_object(&mut self, id: NodeId, object: Option<RuntimeObject>) {
        if let NodeKind::Instance(instance) = &mut self.node_mut(id).kind {
            instance.object = object;
        }
    }

    /// Drop every node and index entry
    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }

    fn index_subtree(&mut self, start: NodeId) {
        let (identifiers, references) = self.collect_index_entries(start);
        for (name, id) in identifiers {
            self.identifiers.entry(name).or_default().push(id);
        }
        for (target, id) in references {
            self.references.entry(target).or_default().push(id);
        }
    }

    fn unindex_subtree(&mut self, start: NodeId) {
        let (identifiers, references) = self.collect_index_entries(start);
        for (name, id) in identifiers {
            remove_entry(&mut self.identifiers, &name, id);
        }
        for (target, id) in references {
            remove_entry(&mut self.references, &target, id);
        }
    }

    #[allow(clippy::type_complexity)]
    fn collect_index_entries(&self, start: NodeId) -> (Vec<(String, NodeId)>, Vec<(String, NodeId)>) {
        let mut identifiers = Vec::new();
        let mut references = Vec::new();
        for node in self.walk(start) {
            match &node.kind {
                NodeKind::Instance(InstanceNode {
                    identifier: Some(name),
                    ..
                }) => identifiers.push((name.clone(), node.id)),
                NodeKind::Reference(reference) => references.push((reference.target.clone(), node.id)),
                _ => {}
            }
        }
        (identifiers, references)
    }
}

fn remove_entry(index: &mut HashMap<String, Vec<NodeId>>, key: &str, id: NodeId) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|existing| *existing != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

/// Restartable pre-order traversal; clone it to replay from the same point
#[derive(Debug, Clone)]
pub struct Walk<'g> {
    graph: &'g NodeGraph,
    stack: Vec<NodeId>,
}

impl<'g> Iterator for Walk<'g> {
    type Item = &'g Node;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.graph.node(id)?;
        self.stack.extend(node.children().iter().rev().copied());
        Some(node)
    }
}
