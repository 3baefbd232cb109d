use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;
use core::ops::Index;
use core::str::FromStr;

use crate::guard::{self, DynCompositeParser, DynRenderer};
use crate::node::{IntoMapping, Node, NodeKind, impl_node_options};

// -----------------------------------------------------------------------------
// ComponentValues

/// The raw string value of every component of a composite, keyed by
/// component identifier.
///
/// This is what a composite parser receives. It only ever holds a value for
/// every registered component: a composite with any component key missing
/// from the input is not parsed at all.
///
/// Indexing with an unknown identifier panics; inside a parser such a panic
/// is captured and treated as a parse failure.
#[derive(Clone, PartialEq, Eq)]
pub struct ComponentValues<'a> {
    entries: Vec<(&'a str, &'a str)>,
}

impl<'a> ComponentValues<'a> {
    #[inline]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    #[inline]
    pub(crate) fn push(&mut self, component: &'a str, value: &'a str) {
        self.entries.push((component, value));
    }

    /// Returns the raw value of `component`.
    pub fn get(&self, component: &str) -> Option<&'a str> {
        self.entries
            .iter()
            .find_map(|&(id, value)| (id == component).then_some(value))
    }

    /// Parses the raw value of `component` with [`FromStr`].
    ///
    /// Returns `None` if the component is unknown or does not parse.
    pub fn parse<T: FromStr>(&self, component: &str) -> Option<T> {
        self.get(component)?.parse().ok()
    }

    /// Iterates over `(component, value)` pairs in registration order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a str)> + '_ {
        self.entries.iter().copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> Index<&str> for ComponentValues<'a> {
    type Output = str;

    fn index(&self, component: &str) -> &str {
        match self.get(component) {
            Some(value) => value,
            None => panic!("no composite component named `{component}`"),
        }
    }
}

impl fmt::Debug for ComponentValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().copied()).finish()
    }
}

// -----------------------------------------------------------------------------
// Erased node

pub(crate) struct ComponentNode {
    pub id: String,
    pub renderer: Option<DynRenderer>,
}

pub(crate) struct CompositeNode {
    pub components: Vec<ComponentNode>,
    pub parser: Option<DynCompositeParser>,
}

// -----------------------------------------------------------------------------
// CompositeMapping

/// Maps one value to several keys, one per component.
///
/// The key of a component is the composite's own key followed by the
/// component identifier, so a `Birthday` property with components `Year`,
/// `Month` and `Day` occupies `BirthdayYear`, `BirthdayMonth` and
/// `BirthdayDay`.
///
/// Serialization is all-or-nothing: if any component renderer is missing or
/// fails, no key is written at all. Deserialization requires every component
/// key to be present before the parser runs.
///
/// # Examples
///
/// ```
/// use kvs_mapping::{CompositeMapping, KeyValueSerializer};
///
/// #[derive(Debug, PartialEq)]
/// struct Date { year: u16, month: u8, day: u8 }
///
/// let date = CompositeMapping::<Date>::new()
///     .component_with("Year", |d| d.year.to_string())
///     .component_with("Month", |d| d.month.to_string())
///     .component_with("Day", |d| d.day.to_string())
///     .parser(|parts| Some(Date {
///         year: parts.parse("Year")?,
///         month: parts.parse("Month")?,
///         day: parts.parse("Day")?,
///     }));
///
/// let serializer = KeyValueSerializer::new(date).unwrap();
///
/// let data = serializer.serialize(&Date { year: 1982, month: 4, day: 6 }).unwrap().unwrap();
/// assert_eq!(data.get("Year"), Some("1982"));
/// assert_eq!(data.get("Day"), Some("6"));
///
/// let back = serializer.deserialize(&data).unwrap();
/// assert_eq!(back, Some(Date { year: 1982, month: 4, day: 6 }));
/// ```
pub struct CompositeMapping<V> {
    node: Node,
    _marker: PhantomData<fn(V) -> V>,
}

impl<V: 'static> CompositeMapping<V> {
    /// Creates a composite without components or parser.
    pub fn new() -> Self {
        Self {
            node: Node::new::<V>(NodeKind::Composite(CompositeNode {
                components: Vec::new(),
                parser: None,
            })),
            _marker: PhantomData,
        }
    }

    fn payload(&mut self) -> &mut CompositeNode {
        match &mut self.node.kind {
            NodeKind::Composite(composite) => composite,
            _ => unreachable!("`CompositeMapping` always wraps a composite node"),
        }
    }

    fn push_component(mut self, id: impl Into<String>, renderer: Option<DynRenderer>) -> Self {
        self.payload().components.push(ComponentNode {
            id: id.into(),
            renderer,
        });
        self
    }

    /// Adds a component with a fallible renderer.
    pub fn component<F>(self, id: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&V) -> Option<String> + Send + Sync + 'static,
    {
        self.push_component(id, Some(guard::erase_renderer(renderer)))
    }

    /// Adds a component with a renderer that always succeeds.
    pub fn component_with<F>(self, id: impl Into<String>, renderer: F) -> Self
    where
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.push_component(id, Some(guard::erase_renderer(guard::total(renderer))))
    }

    /// Adds a component that is only read, never written.
    ///
    /// A composite with such a component needs a parser and cannot serialize.
    pub fn read_only_component(self, id: impl Into<String>) -> Self {
        self.push_component(id, None)
    }

    /// Sets the parser that rebuilds the value from its components.
    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&ComponentValues<'_>) -> Option<V> + Send + Sync + 'static,
    {
        self.payload().parser = Some(guard::erase_composite_parser(parser));
        self
    }

    /// Sets a parser that always succeeds (or panics).
    pub fn deserialize_with<F>(self, parser: F) -> Self
    where
        F: Fn(&ComponentValues<'_>) -> V + Send + Sync + 'static,
    {
        self.parser(move |components: &ComponentValues<'_>| Some(parser(components)))
    }
}

impl<V: 'static> Default for CompositeMapping<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl_node_options!(CompositeMapping<V>);

impl<V: 'static> IntoMapping<V> for CompositeMapping<V> {
    #[inline]
    fn into_node(self) -> Node {
        self.node
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ComponentValues;

    #[test]
    fn component_values() {
        let mut values = ComponentValues::with_capacity(2);
        values.push("Year", "1982");
        values.push("Month", "4");

        assert_eq!(values.len(), 2);
        assert_eq!(values.get("Year"), Some("1982"));
        assert_eq!(&values["Month"], "4");
        assert_eq!(values.parse::<u8>("Month"), Some(4));
        assert_eq!(values.parse::<u8>("Year"), None);
        assert_eq!(values.get("Day"), None);
        assert_eq!(values.iter().map(|(id, _)| id).collect::<alloc::vec::Vec<_>>(), ["Year", "Month"]);
    }

    #[test]
    #[should_panic(expected = "no composite component named `Day`")]
    fn unknown_component_panics() {
        let values = ComponentValues::with_capacity(0);
        let _ = &values["Day"];
    }
}
