use std::any::{self, Any, TypeId};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::{AnyValue, Result, StoreError};

/// Read capability of a property binding.
pub type Getter = Rc<dyn Fn() -> AnyValue>;

/// Write capability of a property binding. A rejected value is handed back.
pub type Setter = Rc<dyn Fn(AnyValue) -> std::result::Result<(), AnyValue>>;

#[derive(Clone)]
struct Property {
    getter: Getter,
    setter: Setter,
    bound: TypeId,
    bound_name: &'static str,
}

impl Property {
    fn typed<T, G, S>(getter: G, setter: S) -> Self
    where
        T: Any + Clone,
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Self {
            getter: Rc::new(move || AnyValue::new(getter())),
            setter: Rc::new(move |value: AnyValue| -> std::result::Result<(), AnyValue> {
                setter(value.downcast::<T>()?);
                Ok(())
            }),
            bound: TypeId::of::<T>(),
            bound_name: any::type_name::<T>(),
        }
    }
}

/// A named-slot store of owned values ("fields") and bound external references
/// ("properties").
///
/// A name lives in at most one of the two mappings. Writes to a property always go through
/// its setter and must match the property's bound type; writes to any other name create or
/// overwrite a field. Registering a property over an existing field migrates the field's
/// value into the property.
#[derive(Default, Clone)]
pub struct Rolodex {
    properties: BTreeMap<String, Property>,
    fields: BTreeMap<String, AnyValue>,
}

impl Rolodex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.properties.len() + self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name) || self.fields.contains_key(name)
    }

    pub fn is_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn is_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Property names first, then field names, each in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.properties
            .keys()
            .chain(self.fields.keys())
            .map(String::as_str)
    }

    /// Type-erased write.
    ///
    /// Returns `Ok(true)` if `name` is a property (the value went through its setter), and
    /// `Ok(false)` if a field was created or overwritten.
    pub fn push_value(&mut self, name: &str, value: AnyValue) -> Result<bool> {
        if let Some(property) = self.properties.get(name) {
            (property.setter)(value).map_err(|rejected| {
                StoreError::mismatch(name, property.bound_name, rejected.type_name())
            })?;
            return Ok(true);
        }

        self.fields.insert(name.to_owned(), value);
        Ok(false)
    }

    /// Typed write. Fails with [`StoreError::TypeMismatch`] if `name` is a property bound to
    /// a type other than `T`; the store is left unchanged in that case.
    pub fn push<T: Any + Clone>(&mut self, name: &str, value: T) -> Result<bool> {
        if let Some(property) = self.properties.get(name) {
            if property.bound != TypeId::of::<T>() {
                return Err(StoreError::mismatch(
                    name,
                    property.bound_name,
                    any::type_name::<T>(),
                ));
            }
        }
        self.push_value(name, AnyValue::new(value))
    }

    /// Installs or replaces the property `name`.
    ///
    /// A field of the same name is migrated: the setter is invoked once with the field's
    /// value and the field is dropped. Returns `true` if a property or field already
    /// existed under `name`.
    pub fn register<T, G, S>(&mut self, name: &str, getter: G, setter: S) -> Result<bool>
    where
        T: Any + Clone,
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        self.install(name, Property::typed(getter, setter))
    }

    /// Registers a property that reads and writes a shared cell.
    pub fn bind<T: Any + Clone>(&mut self, name: &str, cell: &Rc<RefCell<T>>) -> Result<bool> {
        let read = Rc::clone(cell);
        let write = Rc::clone(cell);
        self.register(
            name,
            move || read.borrow().clone(),
            move |value| *write.borrow_mut() = value,
        )
    }

    fn check_install(&self, name: &str, property: &Property) -> Result<()> {
        match self.fields.get(name) {
            Some(field) if field.value_type_id() != property.bound => Err(StoreError::mismatch(
                name,
                property.bound_name,
                field.type_name(),
            )),
            _ => Ok(()),
        }
    }

    fn check_write(&self, name: &str, value: &AnyValue) -> Result<()> {
        match self.properties.get(name) {
            Some(property) if value.value_type_id() != property.bound => Err(
                StoreError::mismatch(name, property.bound_name, value.type_name()),
            ),
            _ => Ok(()),
        }
    }

    fn install(&mut self, name: &str, property: Property) -> Result<bool> {
        self.check_install(name, &property)?;

        if let Some(field) = self.fields.remove(name) {
            tracing::trace!(name, "migrating field into property");
            // Types were checked above, so the setter accepts the value.
            let _ = (property.setter)(field);
            self.properties.insert(name.to_owned(), property);
            return Ok(true);
        }

        Ok(self.properties.insert(name.to_owned(), property).is_some())
    }

    /// Reads `name` as `T` through its getter or field. `None` if absent or of another type.
    pub fn try_get<T: Any + Clone>(&self, name: &str) -> Option<T> {
        if let Some(property) = self.properties.get(name) {
            return (property.getter)().downcast::<T>().ok();
        }
        self.fields.get(name)?.downcast_ref::<T>().cloned()
    }

    /// Type-erased read.
    pub fn try_get_value(&self, name: &str) -> Option<AnyValue> {
        if let Some(property) = self.properties.get(name) {
            return Some((property.getter)());
        }
        self.fields.get(name).cloned()
    }

    /// Indexed read. Unlike [`Rolodex::try_get_value`], a missing name is an error.
    pub fn get(&self, name: &str) -> Result<AnyValue> {
        self.try_get_value(name).ok_or_else(|| StoreError::NotFound {
            name: name.to_owned(),
        })
    }

    /// Indexed typed read: `NotFound` if absent, `TypeMismatch` if present as another type.
    pub fn get_as<T: Any + Clone>(&self, name: &str) -> Result<T> {
        self.get(name)?.downcast::<T>().map_err(|found| {
            StoreError::mismatch(name, any::type_name::<T>(), found.type_name())
        })
    }

    /// Indexed write; sugar over [`Rolodex::push_value`].
    pub fn set(&mut self, name: &str, value: AnyValue) -> Result<bool> {
        self.push_value(name, value)
    }

    /// Returns the value under `name` if it is a `T`, otherwise stores `default` as a field
    /// and returns it. The name is populated afterwards.
    pub fn pull<T: Any + Clone>(&mut self, name: &str, default: T) -> Result<T> {
        if let Some(value) = self.try_get::<T>(name) {
            return Ok(value);
        }
        self.push(name, default.clone())?;
        Ok(default)
    }

    /// Borrows a field in place. Properties are never borrowed.
    pub fn field<T: Any>(&self, name: &str) -> Option<&T> {
        self.fields.get(name)?.downcast_ref::<T>()
    }

    pub fn field_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.fields.get_mut(name)?.downcast_mut::<T>()
    }

    /// Copies every property binding of `other` by reference and every field by value.
    ///
    /// Fields of `other` that land on a property here go through that property's setter.
    /// Every entry is checked before anything is written, so on error `self` is unchanged.
    pub fn push_all(&mut self, other: &Rolodex) -> Result<()> {
        for (name, property) in &other.properties {
            self.check_install(name, property)?;
        }
        for (name, value) in &other.fields {
            self.check_write(name, value)?;
        }

        for (name, property) in &other.properties {
            self.install(name, property.clone())?;
        }
        for (name, value) in &other.fields {
            self.push_value(name, value.clone())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Rolodex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rolodex")
            .field(
                "properties",
                &self
                    .properties
                    .iter()
                    .map(|(name, p)| (name.as_str(), p.bound_name))
                    .collect::<BTreeMap<_, _>>(),
            )
            .field("fields", &self.fields)
            .finish()
    }
}
