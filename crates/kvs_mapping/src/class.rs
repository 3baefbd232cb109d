use alloc::boxed::Box;
use alloc::vec::Vec;
use core::marker::PhantomData;

use crate::guard::{self, DynFactory};
use crate::naming::KeySegment;
use crate::node::{IntoMapping, Node, NodeKind, impl_node_options};
use crate::property::Property;

// -----------------------------------------------------------------------------
// Erased node

pub(crate) struct ClassNode {
    pub properties: Vec<Node>,
    pub factory: Option<DynFactory>,
    pub map_as: Option<Box<Node>>,
}

// -----------------------------------------------------------------------------
// ClassMapping

/// Maps an object through mappings of its properties.
///
/// Every property mapping is bound to a [`Property`] of `O` and keyed by the
/// property identifier under the class's own key. Deserialization creates
/// the object with the factory, then fills every property that deserializes
/// successfully; the others keep the value the factory gave them. Only a
/// mandatory property can make the whole object fail.
///
/// Instead of property mappings, a class can be mapped as a single simple or
/// composite value with [`map_as`](Self::map_as). This is how a class is
/// spread over a few keys when it is used as a root or collection item.
///
/// # Examples
///
/// ```
/// use kvs_mapping::{ClassMapping, KeyValueMap, KeyValueSerializer, SimpleMapping, property};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Person { name: String, age: u32 }
///
/// let person = ClassMapping::<Person>::new()
///     .map(property!(Person, name => "Name"), SimpleMapping::parsed().mandatory())
///     .map(property!(Person, age => "Age"), SimpleMapping::parsed());
///
/// let serializer = KeyValueSerializer::new(person).unwrap();
///
/// let data: KeyValueMap = [("Name", "Craig"), ("Age", "unknown")].into_iter().collect();
/// let person = serializer.deserialize(&data).unwrap().unwrap();
///
/// // `Age` failed to parse, so it keeps its default.
/// assert_eq!(person, Person { name: "Craig".into(), age: 0 });
/// ```
pub struct ClassMapping<O> {
    node: Node,
    _marker: PhantomData<fn(O) -> O>,
}

impl<O: Default + 'static> ClassMapping<O> {
    /// Creates a class mapping whose objects start as `O::default()`.
    pub fn new() -> Self {
        Self::with_factory(O::default)
    }
}

impl<O: Default + 'static> Default for ClassMapping<O> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<O: 'static> ClassMapping<O> {
    /// Creates a class mapping whose objects are built by `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
    {
        Self {
            node: Node::new::<O>(NodeKind::Class(ClassNode {
                properties: Vec::new(),
                factory: Some(guard::erase_factory(factory)),
                map_as: None,
            })),
            _marker: PhantomData,
        }
    }

    /// Creates a class mapping that is mapped as a single value.
    ///
    /// No factory is needed; see [`map_as`](Self::map_as).
    pub fn mapped_as(mapping: impl IntoMapping<O>) -> Self {
        let this = Self {
            node: Node::new::<O>(NodeKind::Class(ClassNode {
                properties: Vec::new(),
                factory: None,
                map_as: None,
            })),
            _marker: PhantomData,
        };
        this.map_as(mapping)
    }

    fn payload(&mut self) -> &mut ClassNode {
        match &mut self.node.kind {
            NodeKind::Class(class) => class,
            _ => unreachable!("`ClassMapping` always wraps a class node"),
        }
    }

    /// Replaces the factory used to create objects.
    pub fn using_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
    {
        self.payload().factory = Some(guard::erase_factory(factory));
        self
    }

    /// Maps `property` with `mapping`.
    ///
    /// Properties are visited in the order they are mapped.
    pub fn map<V: 'static>(mut self, property: Property<O, V>, mapping: impl IntoMapping<V>) -> Self {
        let (name, access) = property.into_access();
        let mut node = mapping.into_node();
        node.segment = KeySegment::Property(name);
        node.binding = Some(access);

        self.payload().properties.push(node);
        self
    }

    /// Maps the object itself as a simple or composite value, sharing the
    /// class's key.
    ///
    /// Cannot be combined with property mappings.
    pub fn map_as(mut self, mapping: impl IntoMapping<O>) -> Self {
        let mut node = mapping.into_node();
        node.segment = KeySegment::Inherit;

        self.payload().map_as = Some(Box::new(node));
        self
    }
}

impl_node_options!(ClassMapping<O>);

impl<O: 'static> IntoMapping<O> for ClassMapping<O> {
    #[inline]
    fn into_node(self) -> Node {
        self.node
    }
}
