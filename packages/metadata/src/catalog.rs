//! # Property Catalog
//!
//! Flattened per-class capability table.
//!
//! ## Design
//!
//! Class declarations form an inheritance tree (`Pane extends Region extends
//! Node`). [`CatalogBuilder::build`] walks every chain exactly once and stores
//! the merged result, so lookups at edit time never follow `extends` links.
//!
//! Attached properties (`GridPane.rowIndex`) are declared on their owner class
//! but may appear on instances of any class. They live in a separate table
//! keyed by the qualified name.

use crate::error::{CatalogError, CoercionError};
use crate::value::{ClassName, Value, ValueKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Metadata oracle consumed by the document model
///
/// Implementations must be pure: the same question always gets the same
/// answer for the lifetime of a document.
pub trait PropertyCatalog: fmt::Debug + Send + Sync {
    /// Whether `property` may be written on instances of `class`
    fn is_read_write(&self, class: &ClassName, property: &str) -> bool;

    /// Declared default of `property` on `class`, if any
    fn default_value(&self, class: &ClassName, property: &str) -> Option<Value>;

    /// Convert a raw value to the kind `property` expects
    fn coerce(&self, property: &str, raw: Value) -> Result<Value, CoercionError>;

    /// Whether `property` holds child nodes rather than a scalar
    fn is_component_property(&self, class: &ClassName, property: &str) -> bool;

    /// The property that holds the children of `class` when none is named
    fn main_component_property(&self, class: &ClassName) -> Option<String>;

    /// Row/column layout description when `class` is a grid-like container
    fn grid_layout(&self, class: &ClassName) -> Option<GridLayout>;
}

/// Which dimension of a grid an edit applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GridAxis {
    Row,
    Column,
}

impl fmt::Display for GridAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridAxis::Row => f.write_str("row"),
            GridAxis::Column => f.write_str("column"),
        }
    }
}

/// Property names describing a grid-like container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLayout {
    /// Component property holding the cell content
    pub children: String,
    pub row_constraints: String,
    pub column_constraints: String,
    /// Attached property giving a child's row
    pub row_index: String,
    /// Attached property giving a child's column
    pub column_index: String,
    pub row_constraint_class: ClassName,
    pub column_constraint_class: ClassName,
}

impl GridLayout {
    pub fn constraints_property(&self, axis: GridAxis) -> &str {
        match axis {
            GridAxis::Row => &self.row_constraints,
            GridAxis::Column => &self.column_constraints,
        }
    }

    pub fn index_property(&self, axis: GridAxis) -> &str {
        match axis {
            GridAxis::Row => &self.row_index,
            GridAxis::Column => &self.column_index,
        }
    }

    pub fn constraint_class(&self, axis: GridAxis) -> &ClassName {
        match axis {
            GridAxis::Row => &self.row_constraint_class,
            GridAxis::Column => &self.column_constraint_class,
        }
    }
}

/// Declared shape of a single property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpec {
    pub name: String,
    pub kind: ValueKind,
    pub default: Option<Value>,
    pub read_write: bool,
    pub component: bool,
    /// Declared on an owner class, usable on any instance
    pub attached: bool,
}

impl PropertySpec {
    /// Writable scalar property without a default
    pub fn scalar(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            read_write: true,
            component: false,
            attached: false,
        }
    }

    /// Collection-of-nodes property
    pub fn component(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ValueKind::List,
            default: None,
            read_write: true,
            component: true,
            attached: false,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_write = false;
        self
    }

    /// Mark as attached; the name is qualified with the owner class at build time
    pub fn attached(mut self) -> Self {
        self.attached = true;
        self
    }
}

/// Everything the catalog knows about one class, inheritance already merged
#[derive(Debug, Clone, Default)]
pub struct ClassCapabilities {
    pub properties: HashMap<String, PropertySpec>,
    pub main_component: Option<String>,
    pub grid: Option<GridLayout>,
    /// The class itself first, then its ancestors nearest-first
    pub lineage: Vec<ClassName>,
}

/// Flattened, immutable catalog
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    classes: HashMap<ClassName, ClassCapabilities>,
    attached: HashMap<String, PropertySpec>,
    kinds: HashMap<String, ValueKind>,
}

impl Catalog {
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    pub fn class(&self, class: &ClassName) -> Option<&ClassCapabilities> {
        self.classes.get(class)
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Whether `class` is `ancestor` or inherits from it
    pub fn is_subclass_of(&self, class: &ClassName, ancestor: &ClassName) -> bool {
        self.classes
            .get(class)
            .map(|caps| caps.lineage.contains(ancestor))
            .unwrap_or(false)
    }

    /// Find the spec for `property` as seen from `class`
    pub fn property(&self, class: &ClassName, property: &str) -> Option<&PropertySpec> {
        self.classes
            .get(class)
            .and_then(|caps| caps.properties.get(property))
            .or_else(|| self.attached.get(property))
    }
}

impl PropertyCatalog for Catalog {
    fn is_read_write(&self, class: &ClassName, property: &str) -> bool {
        self.property(class, property)
            .map(|spec| spec.read_write)
            .unwrap_or(false)
    }

    fn default_value(&self, class: &ClassName, property: &str) -> Option<Value> {
        self.property(class, property)
            .and_then(|spec| spec.default.clone())
    }

    fn coerce(&self, property: &str, raw: Value) -> Result<Value, CoercionError> {
        let kind = self
            .kinds
            .get(property)
            .copied()
            .ok_or_else(|| CoercionError::UnknownProperty(property.to_string()))?;

        coerce_to(property, kind, raw)
    }

    fn is_component_property(&self, class: &ClassName, property: &str) -> bool {
        self.property(class, property)
            .map(|spec| spec.component)
            .unwrap_or(false)
    }

    fn main_component_property(&self, class: &ClassName) -> Option<String> {
        self.classes
            .get(class)
            .and_then(|caps| caps.main_component.clone())
    }

    fn grid_layout(&self, class: &ClassName) -> Option<GridLayout> {
        self.classes.get(class).and_then(|caps| caps.grid.clone())
    }
}

fn coerce_to(property: &str, kind: ValueKind, raw: Value) -> Result<Value, CoercionError> {
    let incompatible = |value: Value| CoercionError::Incompatible {
        property: property.to_string(),
        expected: kind,
        value,
    };

    if kind == ValueKind::Any || raw.is_null() || raw.kind() == kind {
        return Ok(raw);
    }

    match (kind, raw) {
        (ValueKind::Integer, Value::Text(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|_| incompatible(Value::Text(s))),
        (ValueKind::Integer, Value::Number(n)) => {
            // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
            if n.fract() == 0.0 && (i64::MIN as f64..i64::MAX as f64).contains(&n) {
                Ok(Value::Integer(n as i64))
            } else {
                Err(incompatible(Value::Number(n)))
            }
        }
        (ValueKind::Number, Value::Integer(i)) => Ok(Value::Number(i as f64)),
        (ValueKind::Number, Value::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| incompatible(Value::Text(s))),
        (ValueKind::Bool, Value::Text(s)) => match s.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(incompatible(Value::Text(s))),
        },
        (ValueKind::Text, Value::Integer(i)) => Ok(Value::Text(i.to_string())),
        (ValueKind::Text, Value::Number(n)) => Ok(Value::Text(n.to_string())),
        (ValueKind::Text, Value::Bool(b)) => Ok(Value::Text(b.to_string())),
        (_, other) => Err(incompatible(other)),
    }
}

#[derive(Debug, Clone)]
struct ClassDecl {
    name: ClassName,
    parent: Option<ClassName>,
    properties: Vec<PropertySpec>,
    main_component: Option<String>,
    grid: Option<GridLayout>,
}

/// Collects class declarations and flattens them into a [`Catalog`]
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    decls: Vec<ClassDecl>,
}

/// Fluent handle for one class declaration
pub struct ClassBuilder<'a> {
    decl: &'a mut ClassDecl,
}

impl<'a> ClassBuilder<'a> {
    pub fn extends(self, parent: impl Into<ClassName>) -> Self {
        self.decl.parent = Some(parent.into());
        self
    }

    pub fn property(self, spec: PropertySpec) -> Self {
        self.decl.properties.push(spec);
        self
    }

    /// Declare the component property holding this class's children
    pub fn main_component(self, property: impl Into<String>) -> Self {
        self.decl.main_component = Some(property.into());
        self
    }

    pub fn grid_layout(self, layout: GridLayout) -> Self {
        self.decl.grid = Some(layout);
        self
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start declaring a class
    pub fn class(&mut self, name: impl Into<ClassName>) -> ClassBuilder<'_> {
        self.decls.push(ClassDecl {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
            main_component: None,
            grid: None,
        });
        let last = self.decls.len() - 1;
        ClassBuilder {
            decl: &mut self.decls[last],
        }
    }

    /// Resolve inheritance and produce the flat catalog
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut by_name: HashMap<ClassName, &ClassDecl> = HashMap::new();
        for decl in &self.decls {
            if by_name.insert(decl.name.clone(), decl).is_some() {
                return Err(CatalogError::DuplicateClass(decl.name.to_string()));
            }
        }

        let mut catalog = Catalog::default();

        for decl in &self.decls {
            let chain = Self::resolve_chain(decl, &by_name)?;

            let mut caps = ClassCapabilities {
                lineage: chain.iter().map(|d| d.name.clone()).collect(),
                ..ClassCapabilities::default()
            };

            // Apply root ancestor first so subclasses override
            for ancestor in chain.iter().rev() {
                for spec in &ancestor.properties {
                    if spec.attached {
                        continue;
                    }
                    caps.properties.insert(spec.name.clone(), spec.clone());
                }
                if ancestor.main_component.is_some() {
                    caps.main_component = ancestor.main_component.clone();
                }
                if ancestor.grid.is_some() {
                    caps.grid = ancestor.grid.clone();
                }
            }

            if let Some(main) = &caps.main_component {
                let is_component = caps
                    .properties
                    .get(main)
                    .map(|spec| spec.component)
                    .unwrap_or(false);
                if !is_component {
                    return Err(CatalogError::InvalidMainProperty {
                        class: decl.name.to_string(),
                        property: main.clone(),
                    });
                }
            }

            for spec in decl.properties.iter().filter(|spec| spec.attached) {
                let qualified = format!("{}.{}", decl.name, spec.name);
                let mut spec = spec.clone();
                spec.name = qualified.clone();
                catalog.attached.insert(qualified, spec);
            }

            catalog.classes.insert(decl.name.clone(), caps);
        }

        let mut kinds: HashMap<String, ValueKind> = HashMap::new();
        let all_specs = catalog
            .classes
            .values()
            .flat_map(|caps| caps.properties.values())
            .chain(catalog.attached.values());
        for spec in all_specs {
            kinds
                .entry(spec.name.clone())
                .and_modify(|kind| {
                    if *kind != spec.kind {
                        *kind = ValueKind::Any;
                    }
                })
                .or_insert(spec.kind);
        }
        catalog.kinds = kinds;

        debug!(
            classes = catalog.classes.len(),
            attached = catalog.attached.len(),
            "Catalog built"
        );

        Ok(catalog)
    }

    /// The declaration itself followed by its ancestors, nearest first
    fn resolve_chain<'d>(
        decl: &'d ClassDecl,
        by_name: &HashMap<ClassName, &'d ClassDecl>,
    ) -> Result<Vec<&'d ClassDecl>, CatalogError> {
        let mut chain = vec![decl];
        let mut seen = HashSet::new();
        seen.insert(decl.name.clone());

        let mut current = decl;
        while let Some(parent) = &current.parent {
            let next = by_name
                .get(parent)
                .copied()
                .ok_or_else(|| CatalogError::UnknownParent {
                    class: current.name.to_string(),
                    parent: parent.to_string(),
                })?;

            if !seen.insert(next.name.clone()) {
                return Err(CatalogError::InheritanceCycle(next.name.to_string()));
            }

            chain.push(next);
            current = next;
        }

        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Catalog {
        let mut builder = CatalogBuilder::new();
        builder
            .class("Node")
            .property(PropertySpec::scalar("visible", ValueKind::Bool).with_default(true))
            .property(PropertySpec::scalar("id", ValueKind::Text));
        builder
            .class("Pane")
            .extends("Node")
            .property(PropertySpec::component("children"))
            .main_component("children");
        builder
            .class("GridPane")
            .extends("Pane")
            .property(PropertySpec::scalar("rowIndex", ValueKind::Integer).with_default(0).attached())
            .property(PropertySpec::scalar("hgap", ValueKind::Number).with_default(0.0));
        builder
            .class("Label")
            .extends("Node")
            .property(PropertySpec::scalar("text", ValueKind::Text))
            .property(PropertySpec::scalar("baseline", ValueKind::Number).read_only());
        builder.build().unwrap()
    }

    #[test]
    fn test_inherited_properties_are_flattened() {
        let catalog = sample();
        let grid = ClassName::from("GridPane");

        assert!(catalog.is_read_write(&grid, "visible"));
        assert!(catalog.is_component_property(&grid, "children"));
        assert_eq!(catalog.main_component_property(&grid), Some("children".to_string()));
        assert!(catalog.is_subclass_of(&grid, &ClassName::from("Node")));
        assert!(!catalog.is_subclass_of(&ClassName::from("Node"), &grid));
    }

    #[test]
    fn test_attached_properties_resolve_on_any_class() {
        let catalog = sample();
        let label = ClassName::from("Label");

        assert!(catalog.is_read_write(&label, "GridPane.rowIndex"));
        assert_eq!(
            catalog.default_value(&label, "GridPane.rowIndex"),
            Some(Value::Integer(0))
        );
        // Unqualified attached names are not class properties
        assert!(!catalog.is_read_write(&ClassName::from("GridPane"), "rowIndex"));
    }

    #[test]
    fn test_read_only_property() {
        let catalog = sample();
        assert!(!catalog.is_read_write(&ClassName::from("Label"), "baseline"));
        assert!(!catalog.is_read_write(&ClassName::from("Label"), "missing"));
    }

    #[test]
    fn test_coercion() {
        let catalog = sample();

        assert_eq!(
            catalog.coerce("GridPane.rowIndex", Value::from("3")),
            Ok(Value::Integer(3))
        );
        assert_eq!(catalog.coerce("hgap", Value::Integer(2)), Ok(Value::Number(2.0)));
        assert_eq!(catalog.coerce("visible", Value::from("false")), Ok(Value::Bool(false)));
        assert_eq!(catalog.coerce("text", Value::Integer(7)), Ok(Value::from("7")));
        assert!(matches!(
            catalog.coerce("visible", Value::from("maybe")),
            Err(CoercionError::Incompatible { .. })
        ));
        assert!(matches!(
            catalog.coerce("nope", Value::Null),
            Err(CoercionError::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_number_to_integer_coercion_checks_range() {
        let catalog = sample();

        assert_eq!(
            catalog.coerce("GridPane.rowIndex", Value::Number(4.0)),
            Ok(Value::Integer(4))
        );
        assert_eq!(
            catalog.coerce("GridPane.rowIndex", Value::Number(-9.223372036854775808e18)),
            Ok(Value::Integer(i64::MIN))
        );
        for out_of_range in [1e300, -1e300, 9.223372036854775808e18, f64::INFINITY, f64::NAN] {
            assert!(matches!(
                catalog.coerce("GridPane.rowIndex", Value::Number(out_of_range)),
                Err(CoercionError::Incompatible { .. })
            ));
        }
        assert!(matches!(
            catalog.coerce("GridPane.rowIndex", Value::Number(1.5)),
            Err(CoercionError::Incompatible { .. })
        ));
    }

    #[test]
    fn test_unknown_parent_is_rejected() {
        let mut builder = CatalogBuilder::new();
        builder.class("Button").extends("Control");

        assert_eq!(
            builder.build().unwrap_err(),
            CatalogError::UnknownParent {
                class: "Button".to_string(),
                parent: "Control".to_string(),
            }
        );
    }

    #[test]
    fn test_inheritance_cycle_is_rejected() {
        let mut builder = CatalogBuilder::new();
        builder.class("A").extends("B");
        builder.class("B").extends("A");

        assert!(matches!(builder.build(), Err(CatalogError::InheritanceCycle(_))));
    }

    #[test]
    fn test_main_component_must_be_component() {
        let mut builder = CatalogBuilder::new();
        builder
            .class("Box")
            .property(PropertySpec::scalar("spacing", ValueKind::Number))
            .main_component("spacing");

        assert!(matches!(
            builder.build(),
            Err(CatalogError::InvalidMainProperty { .. })
        ));
    }
}
