//! # Stagecraft Metadata
//!
//! Static description of the classes and properties a document may use.
//!
//! The editor never walks class hierarchies while editing. Instead a
//! [`CatalogBuilder`] resolves inheritance once and produces a flat
//! [`Catalog`] keyed by class name; every question the editor asks
//! ("is this property writable?", "which property holds the children?")
//! is a single table lookup.
//!
//! The [`PropertyCatalog`] trait is the narrow contract the document model
//! consumes, so hosts with their own metadata source can plug it in instead.

mod catalog;
mod error;
mod value;

pub use catalog::{
    Catalog, CatalogBuilder, ClassBuilder, ClassCapabilities, GridAxis, GridLayout,
    PropertyCatalog, PropertySpec,
};
pub use error::{CatalogError, CoercionError};
pub use value::{ClassName, Value, ValueKind};
