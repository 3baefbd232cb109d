use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;

use kvs_utils::KeyValueMap;

use super::{flag_satisfied, probe};
use crate::class::ClassNode;
use crate::collection::{COMMA_DELIMITER, CollectionNode, ListStyle};
use crate::composite::{ComponentValues, CompositeNode};
use crate::error::{MandatoryError, Operation};
use crate::guard::guarded;
use crate::node::{Node, NodeKind};
use crate::simple::SimpleNode;

type Outcome = Result<Option<Box<dyn Any>>, MandatoryError>;

// -----------------------------------------------------------------------------
// Entry

/// Deserializes the value of `node` out of `data`.
pub(crate) fn deserialize(
    node: &Node,
    data: &KeyValueMap,
    parent_key: &str,
    indices: &mut Vec<usize>,
) -> Outcome {
    let key = node.key_name(parent_key, indices);

    let value = if flag_satisfied(node, data) {
        read(node, data, &key, indices)?
    } else {
        None
    };

    match value {
        Some(value) => Ok(Some(value)),
        None if node.mandatory => Err(MandatoryError::new(key, Operation::Deserialize)),
        None => {
            log::debug!("no value deserialized for key `{key}`, treated as absent");
            Ok(None)
        }
    }
}

fn read(node: &Node, data: &KeyValueMap, key: &str, indices: &mut Vec<usize>) -> Outcome {
    match &node.kind {
        NodeKind::Simple(simple) => Ok(read_simple(simple, data, key)),
        NodeKind::Composite(composite) => Ok(read_composite(node, composite, data, key)),
        NodeKind::Collection(collection) => match collection.style {
            ListStyle::Indexed => read_indexed(collection, data, key, indices),
            ListStyle::CommaSeparated => read_comma_separated(collection, data, key),
        },
        NodeKind::Class(class) => read_class(class, data, key, indices),
    }
}

// -----------------------------------------------------------------------------
// Leaves

fn read_simple(simple: &SimpleNode, data: &KeyValueMap, key: &str) -> Option<Box<dyn Any>> {
    let input = data.get(key)?;
    let parser = simple.parser.as_ref()?;
    guarded(key, || parser(input))
}

fn read_composite(
    node: &Node,
    composite: &CompositeNode,
    data: &KeyValueMap,
    key: &str,
) -> Option<Box<dyn Any>> {
    let parser = composite.parser.as_ref()?;
    let policy = node.policy();

    let mut values = ComponentValues::with_capacity(composite.components.len());
    for component in &composite.components {
        let input = data.get(&policy.component_key(key, &component.id))?;
        values.push(&component.id, input);
    }

    guarded(key, || parser(&values))
}

// -----------------------------------------------------------------------------
// Collections

fn read_indexed(
    collection: &CollectionNode,
    data: &KeyValueMap,
    key: &str,
    indices: &mut Vec<usize>,
) -> Outcome {
    let mut items = Vec::new();

    // A present item owns at least one key, so no more than `data.len()`
    // items can be found.
    for index in 0..data.len() {
        indices.push(index);
        let present = probe::is_present(&collection.item, data, key, indices);
        let item = if present {
            deserialize(&collection.item, data, key, indices)
        } else {
            Ok(None)
        };
        indices.pop();

        if !present {
            log::trace!("collection `{key}` ends before index {index}");
            break;
        }
        if let Some(item) = item? {
            items.push(item);
        }
    }

    if items.is_empty() {
        return Ok(None);
    }
    Ok(Some((collection.collect)(items)))
}

fn read_comma_separated(collection: &CollectionNode, data: &KeyValueMap, key: &str) -> Outcome {
    let Some(input) = data.get(key) else {
        return Ok(None);
    };
    let NodeKind::Simple(SimpleNode {
        parser: Some(parser), ..
    }) = &collection.item.kind
    else {
        return Ok(None);
    };

    let mut items = Vec::new();
    if !input.is_empty() {
        for piece in input.split(COMMA_DELIMITER) {
            match guarded(key, || parser(piece)) {
                Some(item) => items.push(item),
                None if collection.item.mandatory => {
                    return Err(MandatoryError::new(key.into(), Operation::Deserialize));
                }
                None => return Ok(None),
            }
        }
    }

    Ok(Some((collection.collect)(items)))
}

// -----------------------------------------------------------------------------
// Classes

fn read_class(class: &ClassNode, data: &KeyValueMap, key: &str, indices: &mut Vec<usize>) -> Outcome {
    if let Some(map_as) = &class.map_as {
        return deserialize(map_as, data, key, indices);
    }

    let Some(factory) = &class.factory else {
        return Ok(None);
    };
    let Some(mut object) = guarded(key, || Some(factory())) else {
        return Ok(None);
    };

    for property in &class.properties {
        let Some(value) = deserialize(property, data, key, indices)? else {
            continue;
        };
        if let Some(binding) = &property.binding {
            let object = object.as_mut();
            if guarded(key, move || binding.set(object, value).then_some(())).is_none() {
                let name = property.property_name().unwrap_or_default();
                log::debug!("property `{name}` of `{key}` could not be set, left as built");
            }
        }
    }

    Ok(Some(object))
}

// -----------------------------------------------------------------------------
// Tests
