//! Runtime object contract
//!
//! The model never looks inside a runtime object. It asks the host's
//! [`ObjectFactory`] to build one per instance node and to push property
//! values and child links into it.

use crate::error::MaterializationError;
use stagecraft_metadata::{ClassName, Value};
use std::any::Any;
use std::fmt;

/// Opaque live object paired with an instance node
pub struct RuntimeObject {
    class: ClassName,
    inner: Box<dyn Any + Send>,
}

impl RuntimeObject {
    pub fn new<T: Any + Send>(class: ClassName, inner: T) -> Self {
        Self {
            class,
            inner: Box::new(inner),
        }
    }

    pub fn class(&self) -> &ClassName {
        &self.class
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut::<T>()
    }
}

impl fmt::Debug for RuntimeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeObject")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// Builds and updates runtime objects
///
/// Every method may fail; the model turns a failure into a
/// [`crate::MutationError`] after undoing its own declarative change.
/// Child indexes count only children that own a runtime object.
pub trait ObjectFactory: fmt::Debug + Send + Sync {
    fn instantiate(&self, class: &ClassName) -> Result<RuntimeObject, MaterializationError>;

    fn apply_property(
        &self,
        object: &mut RuntimeObject,
        property: &str,
        value: &Value,
    ) -> Result<(), MaterializationError>;

    /// Return `property` to its unset state
    fn reset_property(
        &self,
        object: &mut RuntimeObject,
        property: &str,
        default: Option<&Value>,
    ) -> Result<(), MaterializationError> {
        let value = default.cloned().unwrap_or(Value::Null);
        self.apply_property(object, property, &value)
    }

    fn insert_child(
        &self,
        _parent: &mut RuntimeObject,
        _property: &str,
        _index: usize,
        _child: &RuntimeObject,
    ) -> Result<(), MaterializationError> {
        Ok(())
    }

    fn remove_child(
        &self,
        _parent: &mut RuntimeObject,
        _property: &str,
        _index: usize,
    ) -> Result<(), MaterializationError> {
        Ok(())
    }
}
