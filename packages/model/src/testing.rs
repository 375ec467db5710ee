//! Test support: a recording object factory and a small widget catalog
//!
//! Enabled for this crate's own tests and, through the `testing` feature,
//! for downstream crates' tests.

use crate::error::MaterializationError;
use crate::graph::NodeGraph;
use crate::model::DocumentModel;
use crate::node::NodeId;
use crate::runtime::{ObjectFactory, RuntimeObject};
use stagecraft_metadata::{Catalog, ClassName, GridLayout, PropertySpec, Value, ValueKind};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Runtime object built by [`RecordingFactory`]
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedObject {
    pub serial: u64,
    pub class: ClassName,
    pub properties: BTreeMap<String, Value>,
    /// property -> serials of linked children, in runtime order
    pub children: BTreeMap<String, Vec<u64>>,
}

#[derive(Debug, Default)]
struct FailurePlan {
    classes: HashSet<String>,
    values: Vec<(String, Value)>,
    links: HashSet<String>,
}

/// Factory that records every call into plain data and fails on demand
#[derive(Debug, Default)]
pub struct RecordingFactory {
    serial: AtomicU64,
    failures: Mutex<FailurePlan>,
}

impl RecordingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `instantiate` fail for `class`
    pub fn fail_on_class(&self, class: &str) {
        self.plan().classes.insert(class.to_string());
    }

    /// Make `apply_property` fail when `property` receives `value`
    pub fn fail_on_value(&self, property: &str, value: Value) {
        self.plan().values.push((property.to_string(), value));
    }

    /// Make `insert_child` fail for children linked through `property`
    pub fn fail_on_link(&self, property: &str) {
        self.plan().links.insert(property.to_string());
    }

    pub fn clear_failures(&self) {
        *self.plan() = FailurePlan::default();
    }

    /// Number of objects instantiated so far
    pub fn instantiated(&self) -> u64 {
        self.serial.load(Ordering::SeqCst)
    }

    fn plan(&self) -> MutexGuard<'_, FailurePlan> {
        self.failures.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record<'o>(object: &'o mut RuntimeObject) -> Result<&'o mut RecordedObject, MaterializationError> {
        let class = object.class().clone();
        object
            .downcast_mut::<RecordedObject>()
            .ok_or_else(|| MaterializationError::Instantiate {
                class,
                reason: "foreign runtime object".to_string(),
            })
    }
}

impl ObjectFactory for RecordingFactory {
    fn instantiate(&self, class: &ClassName) -> Result<RuntimeObject, MaterializationError> {
        if self.plan().classes.contains(class.as_str()) {
            return Err(MaterializationError::Instantiate {
                class: class.clone(),
                reason: "refused by test".to_string(),
            });
        }
        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RuntimeObject::new(
            class.clone(),
            RecordedObject {
                serial,
                class: class.clone(),
                properties: BTreeMap::new(),
                children: BTreeMap::new(),
            },
        ))
    }

    fn apply_property(
        &self,
        object: &mut RuntimeObject,
        property: &str,
        value: &Value,
    ) -> Result<(), MaterializationError> {
        let refused = self
            .plan()
            .values
            .iter()
            .any(|(name, bad)| name == property && bad == value);
        if refused {
            return Err(MaterializationError::ApplyProperty {
                class: object.class().clone(),
                property: property.to_string(),
                reason: format!("value {} refused by test", value),
            });
        }
        Self::record(object)?
            .properties
            .insert(property.to_string(), value.clone());
        Ok(())
    }

    fn reset_property(
        &self,
        object: &mut RuntimeObject,
        property: &str,
        _default: Option<&Value>,
    ) -> Result<(), MaterializationError> {
        Self::record(object)?.properties.remove(property);
        Ok(())
    }

    fn insert_child(
        &self,
        parent: &mut RuntimeObject,
        property: &str,
        index: usize,
        child: &RuntimeObject,
    ) -> Result<(), MaterializationError> {
        let class = parent.class().clone();
        if self.plan().links.contains(property) {
            return Err(MaterializationError::Link {
                class,
                property: property.to_string(),
                reason: "refused by test".to_string(),
            });
        }
        let serial = child
            .downcast_ref::<RecordedObject>()
            .map(|c| c.serial)
            .unwrap_or_default();
        let children = Self::record(parent)?
            .children
            .entry(property.to_string())
            .or_default();
        if index > children.len() {
            return Err(MaterializationError::Link {
                class,
                property: property.to_string(),
                reason: format!("index {} out of range", index),
            });
        }
        children.insert(index, serial);
        Ok(())
    }

    fn remove_child(
        &self,
        parent: &mut RuntimeObject,
        property: &str,
        index: usize,
    ) -> Result<(), MaterializationError> {
        let class = parent.class().clone();
        let record = Self::record(parent)?;
        let children = record.children.get_mut(property).filter(|c| index < c.len());
        let Some(children) = children else {
            return Err(MaterializationError::Link {
                class,
                property: property.to_string(),
                reason: format!("index {} out of range", index),
            });
        };
        children.remove(index);
        // Keep recordings comparable after attach/detach round trips
        if children.is_empty() {
            record.children.remove(property);
        }
        Ok(())
    }
}

/// Small widget hierarchy with a grid container
pub fn sample_catalog() -> Catalog {
    let mut builder = Catalog::builder();
    builder
        .class("Node")
        .property(PropertySpec::scalar("visible", ValueKind::Bool).with_default(true))
        .property(PropertySpec::scalar("opacity", ValueKind::Number).with_default(1.0));
    builder
        .class("Pane")
        .extends("Node")
        .property(PropertySpec::component("children"))
        .main_component("children");
    builder
        .class("VBox")
        .extends("Pane")
        .property(PropertySpec::scalar("spacing", ValueKind::Number).with_default(0.0));
    builder
        .class("HBox")
        .extends("Pane")
        .property(PropertySpec::scalar("spacing", ValueKind::Number).with_default(0.0));
    builder
        .class("GridPane")
        .extends("Pane")
        .property(PropertySpec::component("rowConstraints"))
        .property(PropertySpec::component("columnConstraints"))
        .property(
            PropertySpec::scalar("rowIndex", ValueKind::Integer)
                .with_default(0)
                .attached(),
        )
        .property(
            PropertySpec::scalar("columnIndex", ValueKind::Integer)
                .with_default(0)
                .attached(),
        )
        .grid_layout(GridLayout {
            children: "children".to_string(),
            row_constraints: "rowConstraints".to_string(),
            column_constraints: "columnConstraints".to_string(),
            row_index: "GridPane.rowIndex".to_string(),
            column_index: "GridPane.columnIndex".to_string(),
            row_constraint_class: ClassName::from("RowConstraints"),
            column_constraint_class: ClassName::from("ColumnConstraints"),
        });
    builder
        .class("RowConstraints")
        .property(PropertySpec::scalar("minHeight", ValueKind::Number));
    builder
        .class("ColumnConstraints")
        .property(PropertySpec::scalar("minWidth", ValueKind::Number));
    builder
        .class("Label")
        .extends("Node")
        .property(PropertySpec::scalar("text", ValueKind::Text).with_default(""))
        .property(PropertySpec::scalar("baseline", ValueKind::Number).read_only());
    builder.class("Button").extends("Label");

    match builder.build() {
        Ok(catalog) => catalog,
        Err(err) => panic!("sample catalog is invalid: {}", err),
    }
}

/// Empty model over [`sample_catalog`] and a fresh [`RecordingFactory`]
pub fn sample_model() -> DocumentModel {
    model_with_factory().0
}

/// Like [`sample_model`] but hands back the factory for failure injection
pub fn model_with_factory() -> (DocumentModel, Arc<RecordingFactory>) {
    let factory = Arc::new(RecordingFactory::new());
    let model = DocumentModel::new(Arc::new(sample_catalog()), factory.clone());
    (model, factory)
}

/// Recorded runtime state of instance `id`
pub fn recorded(graph: &NodeGraph, id: NodeId) -> Option<&RecordedObject> {
    graph.object(id)?.downcast_ref::<RecordedObject>()
}

/// Runtime state of every attached instance, in traversal order
pub fn runtime_snapshot(graph: &NodeGraph) -> Vec<RecordedObject> {
    graph
        .iter()
        .filter_map(|node| recorded(graph, node.id()).cloned())
        .collect()
}
