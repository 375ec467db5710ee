//! # Document Model
//!
//! Owns the node graph together with the catalog and factory it needs to
//! keep the runtime side in step with the declarative side.
//!
//! Every structural edit follows the same order: change the graph, then
//! push the change into the runtime objects, and if the runtime rejects it
//! put the graph back the way it was. A failed edit therefore never leaves
//! the two representations disagreeing.

use crate::error::{MaterializationError, MutationError};
use crate::fragment::{ContentFragment, Fragment};
use crate::graph::NodeGraph;
use crate::mutation::Mutation;
use crate::node::{InstanceNode, NodeId, NodeKind, PropertySlot, ReferenceNode, SlotContent};
use crate::runtime::{ObjectFactory, RuntimeObject};
use stagecraft_metadata::{PropertyCatalog, Value};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct DocumentModel {
    graph: NodeGraph,
    catalog: Arc<dyn PropertyCatalog>,
    factory: Arc<dyn ObjectFactory>,
}

impl DocumentModel {
    pub fn new(catalog: Arc<dyn PropertyCatalog>, factory: Arc<dyn ObjectFactory>) -> Self {
        Self {
            graph: NodeGraph::new(),
            catalog,
            factory,
        }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn catalog(&self) -> &dyn PropertyCatalog {
        self.catalog.as_ref()
    }

    pub fn factory(&self) -> &dyn ObjectFactory {
        self.factory.as_ref()
    }

    /// Apply one mutation and return its inverse
    pub fn apply(&mut self, mutation: &Mutation) -> Result<Mutation, MutationError> {
        mutation.apply(self)
    }

    /// Apply mutations in order, all or nothing
    ///
    /// Returns the inverses in application order. When one mutation fails,
    /// the ones already applied are reverted before the error is returned.
    pub fn apply_all(&mut self, mutations: &[Mutation]) -> Result<Vec<Mutation>, MutationError> {
        let mut inverses = Vec::with_capacity(mutations.len());
        for mutation in mutations {
            match mutation.apply(self) {
                Ok(inverse) => inverses.push(inverse),
                Err(err) => {
                    warn!(mutation = mutation.name(), %err, "mutation failed, rolling back batch");
                    for inverse in inverses.iter().rev() {
                        if let Err(rollback) = inverse.apply(self) {
                            warn!(mutation = inverse.name(), err = %rollback, "rollback step failed");
                        }
                    }
                    return Err(err);
                }
            }
        }
        Ok(inverses)
    }

    /// Undo mutations previously returned by [`DocumentModel::apply_all`]
    pub fn revert(&mut self, inverses: &[Mutation]) -> Result<Vec<Mutation>, MutationError> {
        let reversed: Vec<Mutation> = inverses.iter().rev().cloned().collect();
        self.apply_all(&reversed)
    }

    /// Build a detached subtree from `fragment`, runtime objects included
    ///
    /// On failure every node allocated for the fragment is discarded.
    pub fn materialize(&mut self, fragment: &Fragment) -> Result<NodeId, MutationError> {
        let mark = self.graph.mark();
        match self.build(fragment) {
            Ok(node) => {
                debug!(%node, nodes = self.graph.mark() - mark, "materialized fragment");
                Ok(node)
            }
            Err(err) => {
                self.graph.truncate(mark);
                warn!(%err, "materialization rolled back");
                Err(err)
            }
        }
    }

    /// Allocate a detached scalar slot
    pub fn allocate_scalar_slot(&mut self, name: impl Into<String>, value: Value) -> NodeId {
        self.graph.alloc(NodeKind::Property(PropertySlot {
            name: name.into(),
            content: SlotContent::Scalar(value),
        }))
    }

    /// Allocate a detached, empty collection slot
    pub fn allocate_collection_slot(&mut self, name: impl Into<String>) -> NodeId {
        self.graph.alloc(NodeKind::Property(PropertySlot {
            name: name.into(),
            content: SlotContent::Nodes(Vec::new()),
        }))
    }

    /// Drop the whole document, detached nodes included
    pub fn clear(&mut self) {
        debug!(nodes = self.graph.node_count(), "clearing document model");
        self.graph.clear();
    }

    fn build(&mut self, fragment: &Fragment) -> Result<NodeId, MutationError> {
        let instance = match fragment {
            Fragment::Reference { target } => {
                return Ok(self.graph.alloc(NodeKind::Reference(ReferenceNode {
                    target: target.clone(),
                })));
            }
            Fragment::Instance(instance) => instance,
        };

        let node = self.graph.alloc(NodeKind::Instance(InstanceNode {
            class: instance.class.clone(),
            identifier: instance.identifier.clone(),
            custom_root: instance.custom_root,
            properties: Vec::new(),
            object: None,
        }));
        let object = self
            .factory
            .instantiate(&instance.class)
            .map_err(|source| MutationError::materialization(node, source))?;
        self.graph.put_object(node, Some(object));

        for (index, property) in instance.properties.iter().enumerate() {
            let slot = match &property.content {
                ContentFragment::Scalar(value) => self.allocate_scalar_slot(&property.name, value.clone()),
                ContentFragment::Nodes(children) => {
                    let slot = self.allocate_collection_slot(&property.name);
                    for (position, child) in children.iter().enumerate() {
                        let child = self.build(child)?;
                        // The slot has no owner yet, so there is nothing to sync
                        self.graph.link(slot, position, child);
                    }
                    slot
                }
            };
            self.attach(node, index, slot)?;
        }
        Ok(node)
    }

    pub(crate) fn attach(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<(), MutationError> {
        self.graph.link(parent, index, node);
        if let Err(err) = self.attach_runtime(parent, index, node) {
            self.graph.unlink(parent, index);
            return Err(err);
        }
        Ok(())
    }

    pub(crate) fn detach(&mut self, parent: NodeId, index: usize) -> Result<NodeId, MutationError> {
        let runtime_index = self.runtime_index(parent, index);
        let node = self.graph.unlink(parent, index);
        if let Err(err) = self.detach_runtime(parent, runtime_index, node) {
            self.graph.link(parent, index, node);
            return Err(err);
        }
        Ok(node)
    }

    pub(crate) fn set_scalar(&mut self, slot: NodeId, value: Value) -> Result<Value, MutationError> {
        let previous = self.graph.replace_scalar(slot, value.clone());
        if let Some(owner) = self.slot_owner(slot) {
            let name = self.slot_name(slot);
            if let Err(source) = self.apply_scalar(owner, &name, &value) {
                self.graph.replace_scalar(slot, previous);
                return Err(MutationError::materialization(owner, source));
            }
        }
        Ok(previous)
    }

    pub(crate) fn set_identifier(&mut self, node: NodeId, identifier: Option<String>) -> Option<String> {
        self.graph.replace_identifier(node, identifier)
    }

    pub(crate) fn set_custom_root(&mut self, node: NodeId, enabled: bool) -> bool {
        self.graph.replace_custom_root(node, enabled)
    }

    pub(crate) fn set_reference_target(&mut self, node: NodeId, target: String) -> String {
        self.graph.replace_reference_target(node, target)
    }

    /// Index among the object-bearing children of `parent` before `index`
    fn runtime_index(&self, parent: NodeId, index: usize) -> usize {
        self.graph.children(parent)[..index.min(self.graph.children(parent).len())]
            .iter()
            .filter(|child| self.graph.object(**child).is_some())
            .count()
    }

    fn slot_owner(&self, slot: NodeId) -> Option<NodeId> {
        self.graph
            .parent(slot)
            .filter(|owner| self.graph.instance(*owner).is_some())
    }

    fn slot_name(&self, slot: NodeId) -> String {
        self.graph
            .slot(slot)
            .map(|s| s.name().to_string())
            .unwrap_or_default()
    }

    fn attach_runtime(&mut self, parent: NodeId, index: usize, node: NodeId) -> Result<(), MutationError> {
        if self.graph.instance(parent).is_some() {
            return self.sync_attached_slot(parent, node);
        }
        let is_collection = self.graph.slot(parent).map(PropertySlot::is_collection).unwrap_or(false);
        if !is_collection {
            return Ok(());
        }
        match self.slot_owner(parent) {
            Some(owner) => {
                let name = self.slot_name(parent);
                let runtime_index = self.runtime_index(parent, index);
                self.link_child_object(owner, &name, runtime_index, node)
                    .map_err(|source| MutationError::materialization(node, source))
            }
            None => Ok(()),
        }
    }

    fn detach_runtime(&mut self, parent: NodeId, runtime_index: usize, node: NodeId) -> Result<(), MutationError> {
        if self.graph.instance(parent).is_some() {
            return self.sync_detached_slot(parent, node);
        }
        let is_collection = self.graph.slot(parent).map(PropertySlot::is_collection).unwrap_or(false);
        if !is_collection || self.graph.object(node).is_none() {
            return Ok(());
        }
        match self.slot_owner(parent) {
            Some(owner) => {
                let name = self.slot_name(parent);
                self.unlink_child_object(owner, &name, runtime_index)
                    .map_err(|source| MutationError::materialization(node, source))
            }
            None => Ok(()),
        }
    }

    /// Push a freshly attached slot's content into its owner's object
    fn sync_attached_slot(&mut self, owner: NodeId, slot: NodeId) -> Result<(), MutationError> {
        let (name, content) = match self.graph.slot(slot) {
            Some(s) => (s.name().to_string(), s.content().clone()),
            None => return Ok(()),
        };

        match content {
            SlotContent::Scalar(value) => self
                .apply_scalar(owner, &name, &value)
                .map_err(|source| MutationError::materialization(owner, source)),
            SlotContent::Nodes(children) => {
                let objects: Vec<NodeId> = children
                    .into_iter()
                    .filter(|child| self.graph.object(*child).is_some())
                    .collect();
                for (position, child) in objects.iter().enumerate() {
                    if let Err(source) = self.link_child_object(owner, &name, position, *child) {
                        for undo in (0..position).rev() {
                            if let Err(err) = self.unlink_child_object(owner, &name, undo) {
                                warn!(%owner, property = %name, %err, "failed to unlink child during rollback");
                            }
                        }
                        return Err(MutationError::materialization(*child, source));
                    }
                }
                Ok(())
            }
        }
    }

    /// Withdraw a just-detached slot's content from its former owner's object
    fn sync_detached_slot(&mut self, owner: NodeId, slot: NodeId) -> Result<(), MutationError> {
        let (name, content) = match self.graph.slot(slot) {
            Some(s) => (s.name().to_string(), s.content().clone()),
            None => return Ok(()),
        };

        match content {
            SlotContent::Scalar(_) => self
                .reset_scalar(owner, &name)
                .map_err(|source| MutationError::materialization(owner, source)),
            SlotContent::Nodes(children) => {
                let objects: Vec<NodeId> = children
                    .into_iter()
                    .filter(|child| self.graph.object(*child).is_some())
                    .collect();
                for position in (0..objects.len()).rev() {
                    if let Err(source) = self.unlink_child_object(owner, &name, position) {
                        for (restore, child) in objects.iter().enumerate().skip(position + 1) {
                            if let Err(err) = self.link_child_object(owner, &name, restore, *child) {
                                warn!(%owner, property = %name, %err, "failed to relink child during rollback");
                            }
                        }
                        return Err(MutationError::materialization(objects[position], source));
                    }
                }
                Ok(())
            }
        }
    }

    /// Run `f` against the runtime object of `owner`; no-op when it has none
    fn with_object<F>(&mut self, owner: NodeId, f: F) -> Result<(), MaterializationError>
    where
        F: FnOnce(&dyn ObjectFactory, &mut RuntimeObject, &NodeGraph) -> Result<(), MaterializationError>,
    {
        let mut object = match self.graph.take_object(owner) {
            Some(object) => object,
            None => return Ok(()),
        };
        let result = f(self.factory.as_ref(), &mut object, &self.graph);
        self.graph.put_object(owner, Some(object));
        result
    }

    fn apply_scalar(&mut self, owner: NodeId, property: &str, value: &Value) -> Result<(), MaterializationError> {
        self.with_object(owner, |factory, object, _| {
            factory.apply_property(object, property, value)
        })
    }

    fn reset_scalar(&mut self, owner: NodeId, property: &str) -> Result<(), MaterializationError> {
        let default = self
            .graph
            .instance(owner)
            .and_then(|instance| self.catalog.default_value(instance.class(), property));
        self.with_object(owner, |factory, object, _| {
            factory.reset_property(object, property, default.as_ref())
        })
    }

    fn link_child_object(
        &mut self,
        owner: NodeId,
        property: &str,
        index: usize,
        child: NodeId,
    ) -> Result<(), MaterializationError> {
        self.with_object(owner, |factory, object, graph| match graph.object(child) {
            Some(child_object) => factory.insert_child(object, property, index, child_object),
            None => Ok(()),
        })
    }

    fn unlink_child_object(&mut self, owner: NodeId, property: &str, index: usize) -> Result<(), MaterializationError> {
        self.with_object(owner, |factory, object, _| {
            factory.remove_child(object, property, index)
        })
    }
}
