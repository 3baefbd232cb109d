use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;
use core::marker::PhantomData;

use kvs_utils::KeyValueMap;

use crate::engine;
use crate::error::{Error, InvalidMappingError, Operation};
use crate::naming::{DEFAULT_NAMING, SharedKeyNaming};
use crate::node::{IntoMapping, Node, ROOT_PATH};

// -----------------------------------------------------------------------------
// KeyValueSerializer

/// Converts values of type `T` to and from a [`KeyValueMap`], following a
/// frozen mapping tree.
///
/// Creating the serializer validates the tree and resolves the naming
/// policy of every node; after that the tree is immutable. The serializer is
/// cheap to clone and can be shared between threads, each call working on
/// its own data.
///
/// Both directions return:
///
/// - `Ok(Some(_))` on success,
/// - `Ok(None)` if the root soft-failed,
/// - `Err(_)` if a mandatory node failed, or if the tree cannot perform the
///   operation at all (a simple node without renderer or parser).
///
/// # Examples
///
/// ```
/// use kvs_mapping::{ClassMapping, KeyValueMap, KeyValueSerializer, SimpleMapping, property};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Login { user: String, remember: bool }
///
/// let mapping = ClassMapping::<Login>::new()
///     .map(property!(Login, user => "User"), SimpleMapping::parsed().mandatory())
///     .map(property!(Login, remember => "Remember"), SimpleMapping::parsed());
///
/// let serializer = KeyValueSerializer::new(mapping).unwrap();
///
/// let login = Login { user: "craig".into(), remember: true };
/// let data = serializer.serialize(&login).unwrap().unwrap();
/// assert_eq!(data.get("User"), Some("craig"));
/// assert_eq!(data.get("Remember"), Some("true"));
///
/// assert_eq!(serializer.deserialize(&data).unwrap(), Some(login));
///
/// // `User` is mandatory.
/// let error = serializer.deserialize(&KeyValueMap::new()).unwrap_err();
/// assert_eq!(error.as_mandatory().unwrap().key(), "User");
/// ```
pub struct KeyValueSerializer<T> {
    root: Arc<Node>,
    missing_renderer: Option<InvalidMappingError>,
    missing_parser: Option<InvalidMappingError>,
    _marker: PhantomData<fn(T) -> T>,
}

impl<T: 'static> KeyValueSerializer<T> {
    /// Validates and freezes `root` with the [`DefaultKeyNaming`] policy.
    ///
    /// [`DefaultKeyNaming`]: crate::naming::DefaultKeyNaming
    pub fn new(root: impl IntoMapping<T>) -> Result<Self, InvalidMappingError> {
        Self::with_naming(root, Arc::new(DEFAULT_NAMING.clone()))
    }

    /// Validates and freezes `root`.
    ///
    /// `naming` is used by every node that has no policy of its own.
    pub fn with_naming(root: impl IntoMapping<T>, naming: SharedKeyNaming) -> Result<Self, InvalidMappingError> {
        let mut root = root.into_node();
        root.validate_at(ROOT_PATH)?;
        root.freeze(&naming);

        Ok(Self {
            missing_renderer: root.find_missing(Operation::Serialize, ROOT_PATH),
            missing_parser: root.find_missing(Operation::Deserialize, ROOT_PATH),
            root: Arc::new(root),
            _marker: PhantomData,
        })
    }

    /// The root of the frozen mapping tree.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Checks the structural rules of the tree.
    ///
    /// These are already enforced by [`new`](Self::new). A read-only or
    /// write-only tree is valid; it only fails when asked for the operation
    /// it cannot perform.
    pub fn validate(&self) -> Result<(), InvalidMappingError> {
        self.root.validate_at(ROOT_PATH)
    }

    /// Serializes `value` into a new [`KeyValueMap`].
    pub fn serialize(&self, value: &T) -> Result<Option<KeyValueMap>, Error> {
        if let Some(error) = &self.missing_renderer {
            return Err(error.clone().into());
        }

        let output = engine::serialize(&self.root, value, "", &mut Vec::new())?;
        Ok(output)
    }

    /// Deserializes a value out of `data`.
    pub fn deserialize(&self, data: &KeyValueMap) -> Result<Option<T>, Error> {
        if let Some(error) = &self.missing_parser {
            return Err(error.clone().into());
        }

        let value = engine::deserialize(&self.root, data, "", &mut Vec::new())?;
        Ok(value.and_then(downcast_value))
    }
}

#[inline]
fn downcast_value<T: 'static>(value: Box<dyn Any>) -> Option<T> {
    value.downcast::<T>().ok().map(|value| *value)
}

impl<T> Clone for KeyValueSerializer<T> {
    fn clone(&self) -> Self {
        Self {
            root: Arc::clone(&self.root),
            missing_renderer: self.missing_renderer.clone(),
            missing_parser: self.missing_parser.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for KeyValueSerializer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyValueSerializer")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::KeyValueSerializer;
    use crate::naming::DefaultKeyNaming;
    use crate::{ClassMapping, InvalidMappingKind, SimpleMapping, property};
    use alloc::string::String;
    use alloc::sync::Arc;

    #[test]
    fn missing_functions_fail_eagerly() {
        let serializer = KeyValueSerializer::new(SimpleMapping::<i32>::parsed()).unwrap();
        assert!(serializer.validate().is_ok());

        let read_only = SimpleMapping::<i32>::new().deserialize_with(|s| s.len() as i32);
        let serializer = KeyValueSerializer::new(read_only).unwrap();

        let error = serializer.serialize(&3).unwrap_err();
        let error = error.as_invalid_mapping().unwrap();
        assert_eq!(error.kind(), &InvalidMappingKind::MissingRenderer);
        assert!(serializer.validate().is_ok());
        assert_eq!(serializer.deserialize(&crate::KeyValueMap::from_iter([("", "abc")])).unwrap(), Some(3));

        let write_only = SimpleMapping::<i32>::new().serialize_with(|v| alloc::format!("{v}"));
        let serializer = KeyValueSerializer::new(write_only).unwrap();
        let error = serializer.deserialize(&crate::KeyValueMap::new()).unwrap_err();
        assert_eq!(error.as_invalid_mapping().unwrap().kind(), &InvalidMappingKind::MissingParser);
        assert!(serializer.validate().is_ok());
    }

    #[test]
    fn validate_accepts_one_way_classes() {
        #[derive(Default)]
        struct Account {
            name: String,
        }

        let account = ClassMapping::<Account>::new().map(
            property!(Account, name => "Name"),
            SimpleMapping::<String>::new().deserialize_with(|s| s.into()),
        );
        let serializer = KeyValueSerializer::new(account).unwrap();
        assert!(serializer.validate().is_ok());

        let error = serializer.serialize(&Account::default()).unwrap_err();
        let error = error.as_invalid_mapping().unwrap();
        assert_eq!(error.path(), "Name");
        assert_eq!(error.kind(), &InvalidMappingKind::MissingRenderer);
    }

    #[test]
    fn clones_share_the_tree() {
        let naming = Arc::new(DefaultKeyNaming::new().with_separator("/"));
        let serializer =
            KeyValueSerializer::<String>::with_naming(SimpleMapping::parsed(), naming).unwrap();
        let clone = serializer.clone();
        assert!(core::ptr::eq(serializer.root(), clone.root()));
    }
}
