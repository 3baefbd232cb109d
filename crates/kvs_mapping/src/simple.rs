use alloc::string::{String, ToString};
use core::fmt::Display;
use core::marker::PhantomData;
use core::str::FromStr;

use crate::guard::{self, DynParser, DynRenderer};
use crate::node::{IntoMapping, Node, NodeKind, impl_node_options};

// -----------------------------------------------------------------------------
// Erased node

pub(crate) struct SimpleNode {
    pub parser: Option<DynParser>,
    pub renderer: Option<DynRenderer>,
}

// -----------------------------------------------------------------------------
// SimpleMapping

/// Maps one value to exactly one key.
///
/// Holds a parser (`&str -> V`) and a renderer (`&V -> String`). Either may
/// be absent, but not both. A node without a renderer cannot serialize and a
/// node without a parser cannot deserialize; both are reported as
/// [`InvalidMappingError`](crate::InvalidMappingError) before any data is
/// touched.
///
/// Parsers and renderers come in two flavours: fallible ones return
/// `Option`, total ones return the value directly. Total functions may still
/// panic; with the `std` feature the panic is captured and treated like a
/// `None`.
///
/// # Examples
///
/// ```
/// use kvs_mapping::{KeyValueMap, KeyValueSerializer, SimpleMapping};
///
/// let flag = SimpleMapping::<bool>::new()
///     .parser(|s| match s { "yes" => Some(true), "no" => Some(false), _ => None })
///     .serialize_with(|b| if *b { "yes".into() } else { "no".into() });
///
/// let serializer = KeyValueSerializer::new(flag).unwrap();
///
/// let data = serializer.serialize(&true).unwrap().unwrap();
/// assert_eq!(data.get(""), Some("yes"));
///
/// let data: KeyValueMap = [("", "maybe")].into_iter().collect();
/// assert_eq!(serializer.deserialize(&data).unwrap(), None);
/// ```
pub struct SimpleMapping<V> {
    node: Node,
    _marker: PhantomData<fn(V) -> V>,
}

impl<V: 'static> SimpleMapping<V> {
    /// Creates a mapping with neither parser nor renderer.
    pub fn new() -> Self {
        Self {
            node: Node::new::<V>(NodeKind::Simple(SimpleNode {
                parser: None,
                renderer: None,
            })),
            _marker: PhantomData,
        }
    }

    fn payload(&mut self) -> &mut SimpleNode {
        match &mut self.node.kind {
            NodeKind::Simple(simple) => simple,
            _ => unreachable!("`SimpleMapping` always wraps a simple node"),
        }
    }

    /// Sets a fallible parser.
    pub fn parser<F>(mut self, parser: F) -> Self
    where
        F: Fn(&str) -> Option<V> + Send + Sync + 'static,
    {
        self.payload().parser = Some(guard::erase_parser(parser));
        self
    }

    /// Sets a parser reporting failure through `Result`.
    pub fn try_parser<E, F>(self, parser: F) -> Self
    where
        E: 'static,
        F: Fn(&str) -> Result<V, E> + Send + Sync + 'static,
    {
        self.parser(guard::fallible(parser))
    }

    /// Sets a parser that always succeeds (or panics).
    pub fn deserialize_with<F>(self, parser: F) -> Self
    where
        F: Fn(&str) -> V + Send + Sync + 'static,
    {
        self.parser(guard::total(parser))
    }

    /// Sets a fallible renderer.
    pub fn renderer<F>(mut self, renderer: F) -> Self
    where
        F: Fn(&V) -> Option<String> + Send + Sync + 'static,
    {
        self.payload().renderer = Some(guard::erase_renderer(renderer));
        self
    }

    /// Sets a renderer that always succeeds (or panics).
    pub fn serialize_with<F>(self, renderer: F) -> Self
    where
        F: Fn(&V) -> String + Send + Sync + 'static,
    {
        self.renderer(guard::total(renderer))
    }
}

impl<V> SimpleMapping<V>
where
    V: FromStr + Display + 'static,
    V::Err: 'static,
{
    /// Creates a mapping that parses with [`FromStr`] and renders with
    /// [`Display`].
    ///
    /// # Examples
    ///
    /// ```
    /// use kvs_mapping::{KeyValueMap, KeyValueSerializer, SimpleMapping};
    ///
    /// let serializer = KeyValueSerializer::new(SimpleMapping::<u32>::parsed()).unwrap();
    ///
    /// let data: KeyValueMap = [("", "20")].into_iter().collect();
    /// assert_eq!(serializer.deserialize(&data).unwrap(), Some(20));
    ///
    /// let data: KeyValueMap = [("", "twenty")].into_iter().collect();
    /// assert_eq!(serializer.deserialize(&data).unwrap(), None);
    /// ```
    pub fn parsed() -> Self {
        Self::new()
            .try_parser(|input: &str| input.parse::<V>())
            .serialize_with(|value: &V| value.to_string())
    }
}

impl<V: 'static> Default for SimpleMapping<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl_node_options!(SimpleMapping<V>);

impl<V: 'static> IntoMapping<V> for SimpleMapping<V> {
    #[inline]
    fn into_node(self) -> Node {
        self.node
    }
}
