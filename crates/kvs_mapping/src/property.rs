use alloc::borrow::Cow;
use alloc::boxed::Box;
use alloc::sync::Arc;
use core::any::Any;
use core::fmt;

// -----------------------------------------------------------------------------
// Property

/// An explicit binding of a property identifier to a getter and a setter.
///
/// The identifier names the property's segment in the flat key space, the
/// getter is used while serializing and the setter while deserializing.
/// Bindings are resolved once, when the mapping tree is built; the
/// serializer never inspects types on its own.
///
/// The [`property!`](crate::property!) macro builds a binding for a plain
/// struct field.
///
/// # Examples
///
/// ```
/// use kvs_mapping::Property;
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
/// }
///
/// let name = Property::new(
///     "Name",
///     |person: &Person| &person.name,
///     |person: &mut Person, value| person.name = value,
/// );
///
/// assert_eq!(name.name(), "Name");
/// ```
pub struct Property<O, V> {
    name: Cow<'static, str>,
    get: Arc<dyn Fn(&O) -> &V + Send + Sync>,
    set: Arc<dyn Fn(&mut O, V) + Send + Sync>,
}

impl<O: 'static, V: 'static> Property<O, V> {
    /// Binds `name` to a getter and a setter.
    pub fn new<G, S>(name: impl Into<Cow<'static, str>>, get: G, set: S) -> Self
    where
        G: Fn(&O) -> &V + Send + Sync + 'static,
        S: Fn(&mut O, V) + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            get: Arc::new(get),
            set: Arc::new(set),
        }
    }

    /// The property identifier.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub(crate) fn into_access(self) -> (Cow<'static, str>, Arc<dyn PropertyAccess>) {
        (self.name.clone(), Arc::new(self))
    }
}

impl<O, V> Clone for Property<O, V> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            get: Arc::clone(&self.get),
            set: Arc::clone(&self.set),
        }
    }
}

impl<O, V> fmt::Debug for Property<O, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("owner", &core::any::type_name::<O>())
            .field("value", &core::any::type_name::<V>())
            .finish()
    }
}

/// Builds a [`Property`] for a named struct field.
///
/// `property!(Owner, field)` uses the field name as identifier,
/// `property!(Owner, field => "Name")` uses the given identifier.
///
/// # Examples
///
/// ```
/// use kvs_mapping::property;
///
/// #[derive(Default)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let name = property!(Person, name => "Name");
/// let age = property!(Person, age);
///
/// assert_eq!(name.name(), "Name");
/// assert_eq!(age.name(), "age");
/// ```
#[macro_export]
macro_rules! property {
    ($owner:ty, $field:ident) => {
        $crate::property!($owner, $field => ::core::stringify!($field))
    };
    ($owner:ty, $field:ident => $name:expr) => {
        $crate::Property::new(
            $name,
            |owner: &$owner| &owner.$field,
            |owner: &mut $owner, value| owner.$field = value,
        )
    };
}

// -----------------------------------------------------------------------------
// PropertyAccess

/// Type-erased access to one property of an object.
pub(crate) trait PropertyAccess: Send + Sync {
    /// Borrows the property value out of `object`.
    ///
    /// Returns `None` if `object` is not of the owner type.
    fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any>;

    /// Moves `value` into the property of `object`.
    ///
    /// Returns `false` if either type does not match.
    fn set(&self, object: &mut dyn Any, value: Box<dyn Any>) -> bool;
}

impl<O: 'static, V: 'static> PropertyAccess for Property<O, V> {
    fn get<'a>(&self, object: &'a dyn Any) -> Option<&'a dyn Any> {
        let object = object.downcast_ref::<O>()?;
        Some((self.get)(object) as &dyn Any)
    }

    fn set(&self, object: &mut dyn Any, value: Box<dyn Any>) -> bool {
        match (object.downcast_mut::<O>(), value.downcast::<V>()) {
            (Some(object), Ok(value)) => {
                (self.set)(object, *value);
                true
            }
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
