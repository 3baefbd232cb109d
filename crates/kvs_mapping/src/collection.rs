use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::marker::PhantomData;

use crate::naming::KeySegment;
use crate::node::{IntoMapping, Node, NodeKind, impl_node_options};

// -----------------------------------------------------------------------------
// ListStyle

/// How the items of a collection are laid out in the flat key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListStyle {
    /// Every item owns an independent key subtree: `Coll[0]`, `Coll[1]`, ...
    ///
    /// Deserialization scans from index 0 and stops at the first index for
    /// which no key of the item is present.
    #[default]
    Indexed,
    /// All items share the collection's key, joined by `,`.
    ///
    /// Only valid with a simple item mapping. Every item must parse and
    /// render for the collection to succeed.
    CommaSeparated,
}

/// The delimiter of [`ListStyle::CommaSeparated`] collections.
pub const COMMA_DELIMITER: char = ',';

// -----------------------------------------------------------------------------
// Erased node

pub(crate) struct CollectionNode {
    pub style: ListStyle,
    pub item: Box<Node>,
    /// Borrows every item of a collection value, in enumeration order.
    pub items: for<'a> fn(&'a dyn Any) -> Vec<&'a dyn Any>,
    /// Builds a collection value from deserialized items.
    pub collect: fn(Vec<Box<dyn Any>>) -> Box<dyn Any>,
}

fn items_of<C, T>(collection: &dyn Any) -> Vec<&dyn Any>
where
    C: 'static,
    T: 'static,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    match collection.downcast_ref::<C>() {
        Some(collection) => collection.into_iter().map(|item| item as &dyn Any).collect(),
        None => Vec::new(),
    }
}

fn collect_into<C, T>(items: Vec<Box<dyn Any>>) -> Box<dyn Any>
where
    C: FromIterator<T> + 'static,
    T: 'static,
{
    let collection: C = items
        .into_iter()
        .filter_map(|item| item.downcast::<T>().ok())
        .map(|item| *item)
        .collect();
    Box::new(collection)
}

// -----------------------------------------------------------------------------
// CollectionMapping

/// Maps a homogeneous collection `C` of items `T`.
///
/// Each item is handled by a nested item mapping: a [`SimpleMapping`] or a
/// [`CompositeMapping`] for value items, a [`ClassMapping`] for items with
/// properties of their own. Items of a class mapping are created by the
/// class mapping's factory.
///
/// Any `C` that can be iterated by reference and collected from an iterator
/// works, e.g. `Vec<T>`, `VecDeque<T>` or `BTreeSet<T>`.
///
/// [`SimpleMapping`]: crate::SimpleMapping
/// [`CompositeMapping`]: crate::CompositeMapping
/// [`ClassMapping`]: crate::ClassMapping
///
/// # Examples
///
/// ```
/// use kvs_mapping::{CollectionMapping, KeyValueMap, KeyValueSerializer, SimpleMapping};
///
/// let tags = CollectionMapping::<Vec<String>, String>::new(SimpleMapping::parsed());
/// let serializer = KeyValueSerializer::new(tags).unwrap();
///
/// let data: KeyValueMap = [("[0]", "a"), ("[1]", "b"), ("[3]", "d")].into_iter().collect();
/// let tags = serializer.deserialize(&data).unwrap().unwrap();
///
/// // Scanning stops at the first missing index.
/// assert_eq!(tags, ["a", "b"]);
/// ```
pub struct CollectionMapping<C, T> {
    node: Node,
    _marker: PhantomData<fn(C, T) -> (C, T)>,
}

impl<C, T> CollectionMapping<C, T>
where
    C: FromIterator<T> + 'static,
    T: 'static,
    for<'a> &'a C: IntoIterator<Item = &'a T>,
{
    /// Creates an [`Indexed`](ListStyle::Indexed) collection mapping.
    pub fn new(item: impl IntoMapping<T>) -> Self {
        let mut item = item.into_node();
        item.segment = KeySegment::Item;

        Self {
            node: Node::new::<C>(NodeKind::Collection(CollectionNode {
                style: ListStyle::Indexed,
                item: Box::new(item),
                items: items_of::<C, T>,
                collect: collect_into::<C, T>,
            })),
            _marker: PhantomData,
        }
    }
}

impl<C: 'static, T: 'static> CollectionMapping<C, T> {
    fn payload(&mut self) -> &mut CollectionNode {
        match &mut self.node.kind {
            NodeKind::Collection(collection) => collection,
            _ => unreachable!("`CollectionMapping` always wraps a collection node"),
        }
    }

    /// Selects the list style.
    pub fn style(mut self, style: ListStyle) -> Self {
        let collection = self.payload();
        collection.style = style;
        collection.item.segment = match style {
            ListStyle::Indexed => KeySegment::Item,
            ListStyle::CommaSeparated => KeySegment::Inherit,
        };
        self
    }

    /// Shorthand for `style(ListStyle::CommaSeparated)`.
    #[inline]
    pub fn comma_separated(self) -> Self {
        self.style(ListStyle::CommaSeparated)
    }

    /// Shorthand for `style(ListStyle::Indexed)`.
    #[inline]
    pub fn indexed(self) -> Self {
        self.style(ListStyle::Indexed)
    }
}

impl_node_options!(CollectionMapping<C, T>);

impl<C: 'static, T: 'static> IntoMapping<C> for CollectionMapping<C, T> {
    #[inline]
    fn into_node(self) -> Node {
        self.node
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{collect_into, items_of};
    use alloc::boxed::Box;
    use alloc::collections::BTreeSet;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::any::Any;

    #[test]
    fn erased_sequences() {
        let values = vec![3_u8, 1, 2];
        let items = items_of::<Vec<u8>, u8>(&values);
        let items: Vec<u8> = items.iter().filter_map(|v| v.downcast_ref::<u8>()).copied().collect();
        assert_eq!(items, [3, 1, 2]);

        // Wrong collection type yields nothing.
        assert!(items_of::<Vec<u16>, u16>(&values).is_empty());

        let boxed: Vec<Box<dyn Any>> = vec![Box::new(2_u8), Box::new(1_u8), Box::new(2_u8)];
        let set = collect_into::<BTreeSet<u8>, u8>(boxed);
        let set = set.downcast::<BTreeSet<u8>>().map(|s| *s).unwrap_or_default();
        assert_eq!(set.into_iter().collect::<Vec<_>>(), [1, 2]);
    }
}
