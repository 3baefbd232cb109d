//! Key naming policies.
//!
//! Every node of a mapping tree owns exactly one segment of the flat key
//! space. The full key of a node is computed from its parent's key, the
//! node's [`KeySegment`] and the list of collection indices passed through on
//! the way down from the root.
//!
//! With [`DefaultKeyNaming`]:
//!
//! | node                          | key                      |
//! |-------------------------------|--------------------------|
//! | property `Name` of the root   | `Name`                   |
//! | property `Inner` of `Outer`   | `Outer.Inner`            |
//! | item 2 of collection `Coll`   | `Coll[2]`                |
//! | component `Year` of `Coll[2]` | `Coll[2]Year`            |
//!
//! Policies must be pure: serialization and deserialization both rely on
//! a node producing the same key for the same indices.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

// -----------------------------------------------------------------------------
// KeyNamingPolicy

/// Computes the key segments of a mapping tree.
///
/// A policy attached to a node is inherited by all of its descendants unless
/// one of them attaches its own.
///
/// # Examples
///
/// ```
/// use kvs_mapping::naming::KeyNamingPolicy;
///
/// struct Underscored;
///
/// impl KeyNamingPolicy for Underscored {
///     fn property_key(&self, parent_key: &str, property: &str) -> String {
///         if parent_key.is_empty() {
///             property.to_owned()
///         } else {
///             format!("{parent_key}_{property}")
///         }
///     }
///
///     fn item_key(&self, collection_key: &str, index: usize) -> String {
///         format!("{collection_key}_{index}")
///     }
/// }
///
/// assert_eq!(Underscored.property_key("Outer", "Inner"), "Outer_Inner");
/// assert_eq!(Underscored.item_key("Coll", 3), "Coll_3");
/// assert_eq!(Underscored.component_key("Coll_3", "Year"), "Coll_3Year");
/// ```
pub trait KeyNamingPolicy: Send + Sync + 'static {
    /// The key of a property node, given the key of the node that owns it.
    fn property_key(&self, parent_key: &str, property: &str) -> String;

    /// The key of one item of an indexed collection.
    fn item_key(&self, collection_key: &str, index: usize) -> String;

    /// The key of one component of a composite node.
    fn component_key(&self, composite_key: &str, component: &str) -> String {
        let mut key = String::with_capacity(composite_key.len() + component.len());
        key.push_str(composite_key);
        key.push_str(component);
        key
    }
}

/// A shared, type-erased naming policy.
pub type SharedKeyNaming = Arc<dyn KeyNamingPolicy>;

// -----------------------------------------------------------------------------
// DefaultKeyNaming

/// The default naming policy: `Parent.Property`, `Collection[index]` and
/// `CompositeComponent`.
///
/// The separator and index delimiters can be changed.
///
/// # Examples
///
/// ```
/// use kvs_mapping::naming::{DefaultKeyNaming, KeyNamingPolicy};
///
/// let naming = DefaultKeyNaming::new();
/// assert_eq!(naming.property_key("", "Name"), "Name");
/// assert_eq!(naming.property_key("Person", "Name"), "Person.Name");
/// assert_eq!(naming.item_key("Friends", 1), "Friends[1]");
///
/// let naming = DefaultKeyNaming::new()
///     .with_separator("/")
///     .with_index_delimiters("(", ")");
/// assert_eq!(naming.property_key("Person", "Name"), "Person/Name");
/// assert_eq!(naming.item_key("Friends", 1), "Friends(1)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct DefaultKeyNaming {
    separator: Cow<'static, str>,
    index_open: Cow<'static, str>,
    index_close: Cow<'static, str>,
}

impl DefaultKeyNaming {
    /// Creates the policy with `.` as separator and `[`/`]` around indices.
    #[inline]
    pub const fn new() -> Self {
        Self {
            separator: Cow::Borrowed("."),
            index_open: Cow::Borrowed("["),
            index_close: Cow::Borrowed("]"),
        }
    }

    /// Replaces the separator placed between a parent key and a property.
    #[inline]
    pub fn with_separator(mut self, separator: impl Into<Cow<'static, str>>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Replaces the delimiters placed around collection indices.
    #[inline]
    pub fn with_index_delimiters(
        mut self,
        open: impl Into<Cow<'static, str>>,
        close: impl Into<Cow<'static, str>>,
    ) -> Self {
        self.index_open = open.into();
        self.index_close = close.into();
        self
    }

    #[inline]
    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Default for DefaultKeyNaming {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultKeyNaming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultKeyNaming")
            .field("separator", &self.separator)
            .field("index", &format_args!("{}i{}", self.index_open, self.index_close))
            .finish()
    }
}

impl KeyNamingPolicy for DefaultKeyNaming {
    fn property_key(&self, parent_key: &str, property: &str) -> String {
        if parent_key.is_empty() {
            return String::from(property);
        }

        let mut key = String::with_capacity(parent_key.len() + self.separator.len() + property.len());
        key.push_str(parent_key);
        key.push_str(&self.separator);
        key.push_str(property);
        key
    }

    fn item_key(&self, collection_key: &str, index: usize) -> String {
        use core::fmt::Write;

        let mut key = String::with_capacity(collection_key.len() + 8);
        key.push_str(collection_key);
        key.push_str(&self.index_open);
        // Writing into a `String` cannot fail.
        let _ = write!(key, "{index}");
        key.push_str(&self.index_close);
        key
    }
}

/// Used by nodes that have not been frozen into a serializer yet.
pub(crate) static DEFAULT_NAMING: DefaultKeyNaming = DefaultKeyNaming::new();

// -----------------------------------------------------------------------------
// KeySegment

/// The part of the key space a node owns relative to its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySegment {
    /// The node shares its parent's key.
    ///
    /// Used by the root, by `map_as` nodes and by the items of
    /// comma-separated collections.
    Inherit,
    /// A property node, keyed by its property identifier.
    Property(Cow<'static, str>),
    /// An item of an indexed collection, keyed by the last collection index.
    Item,
}

impl KeySegment {
    /// Computes the key of a node with this segment.
    pub fn key_name(&self, policy: &dyn KeyNamingPolicy, parent_key: &str, indices: &[usize]) -> String {
        match self {
            Self::Inherit => String::from(parent_key),
            Self::Property(name) => policy.property_key(parent_key, name),
            Self::Item => match indices.last() {
                Some(&index) => policy.item_key(parent_key, index),
                None => String::from(parent_key),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
