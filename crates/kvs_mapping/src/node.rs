use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::any::type_name;
use core::fmt;

use kvs_utils::hash::{FixedHashState, HashSet};

use crate::class::ClassNode;
use crate::collection::{CollectionNode, ListStyle};
use crate::composite::{ComponentNode, CompositeNode};
use crate::error::{InvalidMappingError, InvalidMappingKind, Operation};
use crate::naming::{DEFAULT_NAMING, KeyNamingPolicy, KeySegment, SharedKeyNaming};
use crate::property::PropertyAccess;
use crate::simple::SimpleNode;

/// The path reported for errors on the root node.
pub(crate) const ROOT_PATH: &str = "<root>";

// -----------------------------------------------------------------------------
// Node

/// One node of a mapping tree, with its value type erased.
///
/// Nodes are built by the typed builders ([`SimpleMapping`],
/// [`CompositeMapping`], [`CollectionMapping`] and [`ClassMapping`]) and
/// frozen by [`KeyValueSerializer::new`]. A frozen tree is immutable and can
/// be inspected through [`KeyValueSerializer::root`], for instance to
/// predict the keys it reads and writes.
///
/// [`SimpleMapping`]: crate::SimpleMapping
/// [`CompositeMapping`]: crate::CompositeMapping
/// [`CollectionMapping`]: crate::CollectionMapping
/// [`ClassMapping`]: crate::ClassMapping
/// [`KeyValueSerializer::new`]: crate::KeyValueSerializer::new
/// [`KeyValueSerializer::root`]: crate::KeyValueSerializer::root
///
/// # Examples
///
/// ```
/// use kvs_mapping::{ClassMapping, CollectionMapping, KeyValueSerializer, SimpleMapping, property};
///
/// #[derive(Default)]
/// struct Pet { name: String }
///
/// #[derive(Default)]
/// struct Owner { pets: Vec<Pet> }
///
/// let pet = ClassMapping::<Pet>::new().map(property!(Pet, name => "Name"), SimpleMapping::parsed());
/// let owner = ClassMapping::<Owner>::new()
///     .map(property!(Owner, pets => "Pets"), CollectionMapping::new(pet));
///
/// let serializer = KeyValueSerializer::new(owner).unwrap();
///
/// let pets = serializer.root().property("Pets").unwrap();
/// let pet = pets.item().unwrap();
/// let name = pet.property("Name").unwrap();
///
/// let pets_key = pets.key_name("", &[]);
/// let pet_key = pet.key_name(&pets_key, &[2]);
/// assert_eq!(name.key_name(&pet_key, &[2]), "Pets[2].Name");
/// ```
pub struct Node {
    pub(crate) segment: KeySegment,
    pub(crate) binding: Option<Arc<dyn PropertyAccess>>,
    pub(crate) naming: Option<SharedKeyNaming>,
    pub(crate) mandatory: bool,
    pub(crate) flag_key: Option<String>,
    pub(crate) value_type: &'static str,
    pub(crate) kind: NodeKind,
}

/// The closed set of node variants.
pub(crate) enum NodeKind {
    Simple(SimpleNode),
    Composite(CompositeNode),
    Collection(CollectionNode),
    Class(ClassNode),
}

/// The variant of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MappingKind {
    Simple,
    Composite,
    Collection(ListStyle),
    Class,
}

impl Node {
    #[inline]
    pub(crate) fn new<V: 'static>(kind: NodeKind) -> Self {
        Self {
            segment: KeySegment::Inherit,
            binding: None,
            naming: None,
            mandatory: false,
            flag_key: None,
            value_type: type_name::<V>(),
            kind,
        }
    }

    /// The naming policy in effect for this node.
    #[inline]
    pub(crate) fn policy(&self) -> &dyn KeyNamingPolicy {
        match &self.naming {
            Some(naming) => naming.as_ref(),
            None => &DEFAULT_NAMING,
        }
    }

    /// Returns the variant of this node.
    pub fn kind(&self) -> MappingKind {
        match &self.kind {
            NodeKind::Simple(_) => MappingKind::Simple,
            NodeKind::Composite(_) => MappingKind::Composite,
            NodeKind::Collection(collection) => MappingKind::Collection(collection.style),
            NodeKind::Class(_) => MappingKind::Class,
        }
    }

    /// The part of the key space this node owns relative to its parent.
    #[inline]
    pub fn segment(&self) -> &KeySegment {
        &self.segment
    }

    /// The name of the mapped value type.
    #[inline]
    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    /// The bound property identifier, `None` for the root, items and
    /// `map_as` nodes.
    pub fn property_name(&self) -> Option<&str> {
        match &self.segment {
            KeySegment::Property(name) => Some(name),
            KeySegment::Inherit | KeySegment::Item => None,
        }
    }

    #[inline]
    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// The presence flag key, if any.
    #[inline]
    pub fn flag_key(&self) -> Option<&str> {
        self.flag_key.as_deref()
    }

    /// Computes the key of this node.
    ///
    /// `parent_key` is the key of the owning node and `indices` the
    /// collection indices accumulated from the root, innermost last.
    #[inline]
    pub fn key_name(&self, parent_key: &str, indices: &[usize]) -> String {
        self.segment.key_name(self.policy(), parent_key, indices)
    }

    /// Computes the key of one component of this node.
    ///
    /// Returns `None` if this is not a composite node or has no such
    /// component.
    pub fn component_key_name(&self, component: &str, parent_key: &str, indices: &[usize]) -> Option<String> {
        let NodeKind::Composite(composite) = &self.kind else {
            return None;
        };
        composite.components.iter().find(|c| c.id == component)?;
        let key = self.key_name(parent_key, indices);
        Some(self.policy().component_key(&key, component))
    }

    /// Iterates over the component identifiers of a composite node.
    pub fn components(&self) -> impl Iterator<Item = &str> + '_ {
        let components: &[ComponentNode] = match &self.kind {
            NodeKind::Composite(composite) => &composite.components,
            _ => &[],
        };
        components.iter().map(|c| c.id.as_str())
    }

    /// Returns the property mapping bound to `name`, for class nodes.
    pub fn property(&self, name: &str) -> Option<&Node> {
        self.properties().find(|p| p.property_name() == Some(name))
    }

    /// Iterates over the property mappings of a class node, in mapping order.
    pub fn properties(&self) -> impl Iterator<Item = &Node> + '_ {
        let properties: &[Node] = match &self.kind {
            NodeKind::Class(class) => &class.properties,
            _ => &[],
        };
        properties.iter()
    }

    /// Returns the item mapping, for collection nodes.
    pub fn item(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Collection(collection) => Some(&collection.item),
            _ => None,
        }
    }

    /// Returns the `map_as` mapping, for class nodes that have one.
    pub fn map_as(&self) -> Option<&Node> {
        match &self.kind {
            NodeKind::Class(class) => class.map_as.as_deref(),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Freeze

impl Node {
    /// Resolves the naming policy of every node of the tree.
    ///
    /// Nodes without a policy of their own take `inherited`.
    pub(crate) fn freeze(&mut self, inherited: &SharedKeyNaming) {
        let policy = Arc::clone(self.naming.get_or_insert_with(|| Arc::clone(inherited)));

        match &mut self.kind {
            NodeKind::Simple(_) | NodeKind::Composite(_) => {}
            NodeKind::Collection(collection) => collection.item.freeze(&policy),
            NodeKind::Class(class) => {
                for property in &mut class.properties {
                    property.freeze(&policy);
                }
                if let Some(map_as) = &mut class.map_as {
                    map_as.freeze(&policy);
                }
            }
        }
    }
}

// -----------------------------------------------------------------------------
// Validation

fn child_path(path: &str, name: &str) -> String {
    if path == ROOT_PATH {
        String::from(name)
    } else {
        format!("{path}.{name}")
    }
}

impl Node {
    /// Checks the structural rules of the subtree rooted at this node.
    pub(crate) fn validate_at(&self, path: &str) -> Result<(), InvalidMappingError> {
        let invalid = |kind| Err(InvalidMappingError::new(path, kind));

        match &self.kind {
            NodeKind::Simple(simple) => {
                if simple.parser.is_none() && simple.renderer.is_none() {
                    return invalid(InvalidMappingKind::UselessMapping);
                }
            }
            NodeKind::Composite(composite) => {
                if composite.components.is_empty() {
                    return invalid(InvalidMappingKind::NoComponents);
                }
                let mut seen = HashSet::with_capacity_and_hasher(composite.components.len(), FixedHashState);
                for component in &composite.components {
                    if !seen.insert(component.id.as_str()) {
                        return invalid(InvalidMappingKind::DuplicateComponent(component.id.clone()));
                    }
                }
                if composite.parser.is_none() && composite.components.iter().any(|c| c.renderer.is_none()) {
                    return invalid(InvalidMappingKind::CompositeWithoutParser);
                }
            }
            NodeKind::Collection(collection) => {
                match (&collection.item.kind, collection.style) {
                    (NodeKind::Collection(_), _) => return invalid(InvalidMappingKind::UnsupportedItem),
                    (NodeKind::Simple(_), ListStyle::CommaSeparated) | (_, ListStyle::Indexed) => {}
                    (_, ListStyle::CommaSeparated) => {
                        return invalid(InvalidMappingKind::CommaSeparatedRequiresSimple);
                    }
                }
                // Comma-separated items share the collection key and have no
                // presence of their own.
                if collection.style == ListStyle::CommaSeparated && collection.item.flag_key.is_some() {
                    return invalid(InvalidMappingKind::FlaggedCommaSeparatedItem);
                }
                collection.item.validate_at(&format!("{path}[]"))?;
            }
            NodeKind::Class(class) => {
                match (&class.map_as, class.properties.is_empty()) {
                    (Some(_), false) => return invalid(InvalidMappingKind::MapAsWithProperties),
                    (None, true) => return invalid(InvalidMappingKind::EmptyClass),
                    (None, false) if class.factory.is_none() => {
                        return invalid(InvalidMappingKind::MissingFactory);
                    }
                    _ => {}
                }

                if let Some(map_as) = &class.map_as {
                    if !matches!(map_as.kind, NodeKind::Simple(_) | NodeKind::Composite(_)) {
                        return invalid(InvalidMappingKind::UnsupportedMapAs);
                    }
                    map_as.validate_at(&format!("{path}(map_as)"))?;
                }

                let mut seen = HashSet::with_capacity_and_hasher(class.properties.len(), FixedHashState);
                for property in &class.properties {
                    let name = property.property_name().unwrap_or_default();
                    if !seen.insert(name) {
                        return invalid(InvalidMappingKind::DuplicateProperty(String::from(name)));
                    }
                    property.validate_at(&child_path(path, name))?;
                }
            }
        }

        Ok(())
    }

    /// Finds the first simple node lacking the function `operation` needs.
    pub(crate) fn find_missing(&self, operation: Operation, path: &str) -> Option<InvalidMappingError> {
        match &self.kind {
            NodeKind::Simple(simple) => match operation {
                Operation::Serialize if simple.renderer.is_none() => {
                    Some(InvalidMappingError::new(path, InvalidMappingKind::MissingRenderer))
                }
                Operation::Deserialize if simple.parser.is_none() => {
                    Some(InvalidMappingError::new(path, InvalidMappingKind::MissingParser))
                }
                _ => None,
            },
            NodeKind::Composite(_) => None,
            NodeKind::Collection(collection) => collection.item.find_missing(operation, &format!("{path}[]")),
            NodeKind::Class(class) => {
                if let Some(map_as) = &class.map_as {
                    return map_as.find_missing(operation, &format!("{path}(map_as)"));
                }
                class.properties.iter().find_map(|property| {
                    let name = property.property_name().unwrap_or_default();
                    property.find_missing(operation, &child_path(path, name))
                })
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Node");
        debug
            .field("kind", &self.kind())
            .field("segment", &self.segment)
            .field("value_type", &self.value_type)
            .field("mandatory", &self.mandatory)
            .field("flag_key", &self.flag_key);

        match &self.kind {
            NodeKind::Simple(_) => {}
            NodeKind::Composite(_) => {
                debug.field("components", &self.components().collect::<Vec<_>>());
            }
            NodeKind::Collection(collection) => {
                debug.field("item", &collection.item);
            }
            NodeKind::Class(class) => {
                debug.field("properties", &class.properties);
                if let Some(map_as) = &class.map_as {
                    debug.field("map_as", map_as);
                }
            }
        }
        debug.finish()
    }
}

// -----------------------------------------------------------------------------
// Builders

/// Converts a typed builder into the erased node for values of type `V`.
///
/// Implemented by every builder; used wherever a nested mapping is
/// attached.
pub trait IntoMapping<V: 'static> {
    fn into_node(self) -> Node;
}

/// Adds the options shared by every builder.
macro_rules! impl_node_options {
    ($name:ident < $($param:ident),+ >) => {
        impl<$($param: 'static),+> $name<$($param),+> {
            /// Escalates any failure of this node into a
            /// [`MandatoryError`](crate::MandatoryError) that aborts the call.
            #[inline]
            pub fn mandatory(mut self) -> Self {
                self.node.mandatory = true;
                self
            }

            /// Sets the presence flag key.
            ///
            /// The key is written with `"true"` whenever this node serializes
            /// successfully. While deserializing, the node is only read when
            /// the flag key holds `true` (in any ASCII case).
            #[inline]
            pub fn flag_key(mut self, key: impl Into<::alloc::string::String>) -> Self {
                self.node.flag_key = Some(key.into());
                self
            }

            /// Attaches a key naming policy to this node and its descendants.
            #[inline]
            pub fn naming<P: $crate::naming::KeyNamingPolicy>(self, policy: P) -> Self {
                self.shared_naming(::alloc::sync::Arc::new(policy))
            }

            /// Attaches a shared key naming policy to this node and its
            /// descendants.
            #[inline]
            pub fn shared_naming(mut self, policy: $crate::naming::SharedKeyNaming) -> Self {
                self.node.naming = Some(policy);
                self
            }

            /// The erased node built so far.
            #[inline]
            pub fn node(&self) -> &$crate::Node {
                &self.node
            }
        }
    };
}

pub(crate) use impl_node_options;

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{MappingKind, ROOT_PATH};
    use crate::{
        ClassMapping, CollectionMapping, CompositeMapping, InvalidMappingKind, IntoMapping, ListStyle,
        Operation, SimpleMapping, property,
    };
    use alloc::string::{String, ToString};
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Inner {
        value: i32,
        other: i32,
    }

    #[derive(Default)]
    struct Outer {
        inner: Inner,
        list: Vec<i32>,
    }

    fn kind_of(node: impl IntoMapping<Outer>) -> InvalidMappingKind {
        node.into_node().validate_at(ROOT_PATH).unwrap_err().kind().clone()
    }

    #[test]
    fn useless_simple() {
        let node = SimpleMapping::<i32>::new().into_node();
        let error = node.validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.path(), "<root>");
        assert_eq!(error.kind(), &InvalidMappingKind::UselessMapping);
    }

    #[test]
    fn composite_rules() {
        let node = CompositeMapping::<i32>::new().parser(|_| Some(1)).into_node();
        assert_eq!(node.validate_at(ROOT_PATH).unwrap_err().kind(), &InvalidMappingKind::NoComponents);

        let node = CompositeMapping::<i32>::new()
            .component_with("A", |v| v.to_string())
            .component_with("A", |v| v.to_string())
            .into_node();
        assert_eq!(
            node.validate_at(ROOT_PATH).unwrap_err().kind(),
            &InvalidMappingKind::DuplicateComponent(String::from("A"))
        );

        let node = CompositeMapping::<i32>::new()
            .component_with("A", |v| v.to_string())
            .read_only_component("B")
            .into_node();
        assert_eq!(
            node.validate_at(ROOT_PATH).unwrap_err().kind(),
            &InvalidMappingKind::CompositeWithoutParser
        );

        // Serialize-only and deserialize-only composites are both fine.
        let node = CompositeMapping::<i32>::new().component_with("A", |v| v.to_string()).into_node();
        assert!(node.validate_at(ROOT_PATH).is_ok());
        let node = CompositeMapping::<i32>::new().read_only_component("A").parser(|_| Some(1)).into_node();
        assert!(node.validate_at(ROOT_PATH).is_ok());
    }

    #[test]
    fn class_rules_report_paths() {
        let inner = ClassMapping::<Inner>::new()
            .map(property!(Inner, value => "Value"), SimpleMapping::parsed())
            .map(property!(Inner, other => "Value"), SimpleMapping::parsed());
        let outer = ClassMapping::<Outer>::new().map(property!(Outer, inner => "Inner"), inner);
        let error = outer.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.path(), "Inner");
        assert_eq!(error.kind(), &InvalidMappingKind::DuplicateProperty(String::from("Value")));

        assert_eq!(kind_of(ClassMapping::<Outer>::new()), InvalidMappingKind::EmptyClass);

        let inner = ClassMapping::<Inner>::new().map(property!(Inner, value => "Value"), SimpleMapping::<i32>::new());
        let outer = ClassMapping::<Outer>::new().map(property!(Outer, inner => "Inner"), inner);
        let error = outer.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.path(), "Inner.Value");
        assert_eq!(error.kind(), &InvalidMappingKind::UselessMapping);
    }

    #[test]
    fn collection_rules() {
        let list = CollectionMapping::<Vec<i32>, i32>::new(
            CompositeMapping::new().component_with("X", |v: &i32| v.to_string()),
        )
        .comma_separated();
        let outer = ClassMapping::<Outer>::new().map(property!(Outer, list => "List"), list);
        let error = outer.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.path(), "List");
        assert_eq!(error.kind(), &InvalidMappingKind::CommaSeparatedRequiresSimple);

        let nested = CollectionMapping::<Vec<Vec<i32>>, Vec<i32>>::new(CollectionMapping::new(
            SimpleMapping::<i32>::parsed(),
        ));
        let error = nested.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.kind(), &InvalidMappingKind::UnsupportedItem);

        let flagged = CollectionMapping::<Vec<i32>, i32>::new(SimpleMapping::parsed().flag_key("HasItem"))
            .comma_separated();
        let outer = ClassMapping::<Outer>::new().map(property!(Outer, list => "List"), flagged);
        let error = outer.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.path(), "List");
        assert_eq!(error.kind(), &InvalidMappingKind::FlaggedCommaSeparatedItem);

        // Indexed items may carry a flag.
        let flagged = CollectionMapping::<Vec<i32>, i32>::new(SimpleMapping::parsed().flag_key("HasItem"));
        assert!(flagged.into_node().validate_at(ROOT_PATH).is_ok());
    }

    #[test]
    fn map_as_rules() {
        let both = ClassMapping::<Inner>::mapped_as(SimpleMapping::<Inner>::new().deserialize_with(|_| Inner::default()))
            .map(property!(Inner, value), SimpleMapping::parsed());
        let error = both.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.kind(), &InvalidMappingKind::MapAsWithProperties);

        let class_as_class = ClassMapping::<Inner>::mapped_as(
            ClassMapping::<Inner>::new().map(property!(Inner, value), SimpleMapping::parsed()),
        );
        let error = class_as_class.into_node().validate_at(ROOT_PATH).unwrap_err();
        assert_eq!(error.kind(), &InvalidMappingKind::UnsupportedMapAs);
    }

    #[test]
    fn missing_functions_are_found_per_direction() {
        let inner = ClassMapping::<Inner>::new()
            .map(property!(Inner, value => "Value"), SimpleMapping::<i32>::new().deserialize_with(|_| 1));
        let outer = ClassMapping::<Outer>::new().map(property!(Outer, inner => "Inner"), inner);
        let node = outer.into_node();

        assert!(node.find_missing(Operation::Deserialize, ROOT_PATH).is_none());
        let error = node.find_missing(Operation::Serialize, ROOT_PATH).unwrap();
        assert_eq!(error.path(), "Inner.Value");
        assert_eq!(error.kind(), &InvalidMappingKind::MissingRenderer);
    }

    #[test]
    fn navigation() {
        let list = CollectionMapping::<Vec<i32>, i32>::new(SimpleMapping::parsed()).comma_separated();
        let outer = ClassMapping::<Outer>::new()
            .map(property!(Outer, list => "List"), list)
            .flag_key("HasOuter")
            .mandatory();
        let node = outer.into_node();

        assert_eq!(node.kind(), MappingKind::Class);
        assert_eq!(node.flag_key(), Some("HasOuter"));
        assert!(node.is_mandatory());
        assert!(node.property("Missing").is_none());

        let list = node.property("List").unwrap();
        assert_eq!(list.kind(), MappingKind::Collection(ListStyle::CommaSeparated));
        assert_eq!(list.property_name(), Some("List"));
        assert_eq!(list.value_type(), core::any::type_name::<Vec<i32>>());

        // Items of a comma-separated collection share its key.
        let item = list.item().unwrap();
        assert_eq!(item.kind(), MappingKind::Simple);
        assert_eq!(item.key_name("List", &[5]), "List");
    }
}
