//! Jobs editing a single instance: property values, identifier, flags

use crate::errors::JobError;
use crate::job::{Edit, PrimitiveJob};
use crate::selection::SelectionGroup;
use stagecraft_model::{DocumentModel, Mutation, NodeId, Value};

#[derive(Debug)]
pub struct ModifyProperty {
    node: NodeId,
    property: String,
    value: Value,
}

pub type ModifyPropertyJob = PrimitiveJob<ModifyProperty>;

impl ModifyPropertyJob {
    /// Set scalar `property` of `node`, coercing `value` through the catalog
    pub fn new(
        model: &DocumentModel,
        node: NodeId,
        property: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Self, JobError> {
        let property = property.into();
        let value = model.catalog().coerce(&property, value.into())?;
        Ok(PrimitiveJob::from_edit(ModifyProperty {
            node,
            property,
            value,
        }))
    }
}

impl ModifyProperty {
    pub fn value(&self) -> &Value {
        &self.value
    }

    fn default_value(&self, model: &DocumentModel) -> Option<Value> {
        let class = model.graph().instance(self.node)?.class();
        model.catalog().default_value(class, &self.property)
    }

    /// Value the instance shows now, explicit or default
    fn effective_value(&self, model: &DocumentModel) -> Option<Value> {
        model
            .graph()
            .property_value(self.node, &self.property)
            .cloned()
            .or_else(|| self.default_value(model))
    }
}

impl Edit for ModifyProperty {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        let graph = model.graph();
        let Some(instance) = graph.instance(self.node) else {
            return false;
        };
        let catalog = model.catalog();
        let is_collection = graph
            .slot_of(self.node, &self.property)
            .and_then(|slot| graph.slot(slot))
            .map(|slot| slot.is_collection())
            .unwrap_or(false);

        graph.is_attached(self.node)
            && catalog.is_read_write(instance.class(), &self.property)
            && !catalog.is_component_property(instance.class(), &self.property)
            && !is_collection
            && self.effective_value(model).as_ref() != Some(&self.value)
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let is_default = self.default_value(model).as_ref() == Some(&self.value);
        let graph = model.graph();

        let mutations = match graph.slot_of(self.node, &self.property) {
            Some(slot) if is_default => {
                let index = graph
                    .children(self.node)
                    .iter()
                    .position(|s| *s == slot)
                    .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
                vec![Mutation::Detach {
                    parent: self.node,
                    index,
                }]
            }
            Some(slot) => vec![Mutation::SetScalar {
                slot,
                value: self.value.clone(),
            }],
            None => {
                let index = graph.children(self.node).len();
                let slot = model.allocate_scalar_slot(self.property.as_str(), self.value.clone());
                vec![Mutation::Attach {
                    parent: self.node,
                    index,
                    node: slot,
                }]
            }
        };
        Ok(mutations)
    }

    fn describe(&self) -> String {
        format!("Set {} to {}", self.property, self.value)
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::single(self.node)
    }
}

#[derive(Debug)]
pub struct RenameIdentifier {
    node: NodeId,
    identifier: Option<String>,
    retarget_references: bool,
}

pub type RenameIdentifierJob = PrimitiveJob<RenameIdentifier>;

impl RenameIdentifierJob {
    /// Change the identifier of `node`; `None` clears it
    pub fn new(node: NodeId, identifier: Option<String>) -> Self {
        PrimitiveJob::from_edit(RenameIdentifier {
            node,
            identifier,
            retarget_references: false,
        })
    }

    /// Like [`RenameIdentifierJob::new`], also pointing every reference to
    /// the old identifier at the new one
    pub fn with_references(node: NodeId, identifier: String) -> Self {
        PrimitiveJob::from_edit(RenameIdentifier {
            node,
            identifier: Some(identifier),
            retarget_references: true,
        })
    }
}

impl Edit for RenameIdentifier {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        let graph = model.graph();
        let Some(instance) = graph.instance(self.node) else {
            return false;
        };
        let taken = match &self.identifier {
            Some(name) => graph.identified(name).iter().any(|other| *other != self.node),
            None => false,
        };
        graph.is_attached(self.node) && instance.identifier() != self.identifier.as_deref() && !taken
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let graph = model.graph();
        let previous = graph
            .instance(self.node)
            .and_then(|instance| instance.identifier())
            .map(str::to_string);

        let mut mutations = vec![Mutation::SetIdentifier {
            node: self.node,
            identifier: self.identifier.clone(),
        }];
        if let (true, Some(old), Some(new)) = (self.retarget_references, previous, &self.identifier) {
            mutations.extend(graph.references_to(&old).iter().map(|reference| {
                Mutation::SetReferenceTarget {
                    node: *reference,
                    target: new.clone(),
                }
            }));
        }
        Ok(mutations)
    }

    fn describe(&self) -> String {
        match &self.identifier {
            Some(name) => format!("Rename {} to {}", self.node, name),
            None => format!("Clear identifier of {}", self.node),
        }
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::single(self.node)
    }
}

#[derive(Debug)]
pub struct ToggleCustomRoot {
    node: NodeId,
}

pub type ToggleCustomRootJob = PrimitiveJob<ToggleCustomRoot>;

impl ToggleCustomRootJob {
    pub fn new(node: NodeId) -> Self {
        PrimitiveJob::from_edit(ToggleCustomRoot { node })
    }
}

impl Edit for ToggleCustomRoot {
    fn is_applicable(&self, model: &DocumentModel) -> bool {
        model.graph().instance(self.node).is_some() && model.graph().is_attached(self.node)
    }

    fn plan(&mut self, model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        let enabled = model
            .graph()
            .instance(self.node)
            .map(|instance| !instance.is_custom_root())
            .ok_or_else(|| JobError::NotExecutable(self.describe()))?;
        Ok(vec![Mutation::SetCustomRoot {
            node: self.node,
            enabled,
        }])
    }

    fn describe(&self) -> String {
        format!("Toggle custom root on {}", self.node)
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        SelectionGroup::single(self.node)
    }
}

/// Selection-only edit
#[derive(Debug)]
pub struct Select {
    group: SelectionGroup,
}

pub type SelectJob = PrimitiveJob<Select>;

impl SelectJob {
    pub fn new(group: SelectionGroup) -> Self {
        PrimitiveJob::from_edit(Select { group })
    }
}

impl Edit for Select {
    fn is_applicable(&self, _model: &DocumentModel) -> bool {
        true
    }

    fn plan(&mut self, _model: &mut DocumentModel) -> Result<Vec<Mutation>, JobError> {
        Ok(Vec::new())
    }

    fn describe(&self) -> String {
        "Change selection".to_string()
    }

    fn selection(&self, _model: &DocumentModel) -> SelectionGroup {
        self.group.clone()
    }
}
