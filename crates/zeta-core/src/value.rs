use std::any::{self, Any, TypeId};
use std::fmt;

trait DynValue: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clone_boxed(&self) -> Box<dyn DynValue>;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Clone> DynValue for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clone_boxed(&self) -> Box<dyn DynValue> {
        Box::new(self.clone())
    }

    fn type_name(&self) -> &'static str {
        any::type_name::<T>()
    }
}

/// A type-erased, clonable value.
///
/// Fields of a [`Rolodex`](crate::Rolodex) are stored as `AnyValue`s, and property
/// getters/setters exchange them. Cloning an `AnyValue` clones the wrapped value.
///
/// `AnyValue::new` always wraps its argument, so wrapping an `AnyValue` nests it. Use the
/// `*_value` store methods to pass already-erased values through unchanged.
pub struct AnyValue(Box<dyn DynValue>);

impl AnyValue {
    pub fn new<T: Any + Clone>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn value_type_id(&self) -> TypeId {
        Any::type_id(self.0.as_any())
    }

    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.0.as_any_mut().downcast_mut::<T>()
    }

    /// Unwraps the value as `T`, handing the `AnyValue` back untouched on a type mismatch.
    pub fn downcast<T: Any + Clone>(self) -> Result<T, Self> {
        if let Some(value) = self.downcast_ref::<T>() {
            return Ok(value.clone());
        }
        Err(self)
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self(self.0.clone_boxed())
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AnyValue").field(&self.type_name()).finish()
    }
}
