//! Error types for the metadata catalog

use crate::value::{Value, ValueKind};
use thiserror::Error;

/// Raised while flattening class declarations into a [`crate::Catalog`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Class {class} extends unknown class {parent}")]
    UnknownParent { class: String, parent: String },

    #[error("Inheritance cycle through class {0}")]
    InheritanceCycle(String),

    #[error("Class declared twice: {0}")]
    DuplicateClass(String),

    #[error("Main component property {property} of {class} is not a component property")]
    InvalidMainProperty { class: String, property: String },
}

/// A raw value could not be converted to the kind a property expects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoercionError {
    #[error("Unknown property: {0}")]
    UnknownProperty(String),

    #[error("Cannot convert {value:?} to {expected:?} for property {property}")]
    Incompatible {
        property: String,
        expected: ValueKind,
        value: Value,
    },
}
