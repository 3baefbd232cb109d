use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;

use kvs_utils::KeyValueMap;

use super::FLAG_TRUE;
use crate::class::ClassNode;
use crate::collection::{COMMA_DELIMITER, CollectionNode, ListStyle};
use crate::composite::CompositeNode;
use crate::error::{MandatoryError, Operation};
use crate::guard::guarded;
use crate::node::{Node, NodeKind};
use crate::simple::SimpleNode;

type Outcome = Result<Option<KeyValueMap>, MandatoryError>;

// -----------------------------------------------------------------------------
// Entry

/// Serializes `value` with `node`.
///
/// `value` must be of the node's value type; anything else is a soft
/// failure.
pub(crate) fn serialize(
    node: &Node,
    value: &dyn Any,
    parent_key: &str,
    indices: &mut Vec<usize>,
) -> Outcome {
    let key = node.key_name(parent_key, indices);

    match write(node, value, &key, indices)? {
        Some(mut output) => {
            if let Some(flag) = &node.flag_key {
                output.insert(flag.as_str(), FLAG_TRUE);
            }
            Ok(Some(output))
        }
        None if node.mandatory => Err(MandatoryError::new(key, Operation::Serialize)),
        None => {
            log::debug!("no value serialized for key `{key}`, omitted");
            Ok(None)
        }
    }
}

fn write(node: &Node, value: &dyn Any, key: &str, indices: &mut Vec<usize>) -> Outcome {
    match &node.kind {
        NodeKind::Simple(simple) => Ok(write_simple(simple, value, key)),
        NodeKind::Composite(composite) => Ok(write_composite(node, composite, value, key)),
        NodeKind::Collection(collection) => match collection.style {
            ListStyle::Indexed => write_indexed(collection, value, key, indices),
            ListStyle::CommaSeparated => write_comma_separated(collection, value, key),
        },
        NodeKind::Class(class) => write_class(class, value, key, indices),
    }
}

// -----------------------------------------------------------------------------
// Leaves

fn write_simple(simple: &SimpleNode, value: &dyn Any, key: &str) -> Option<KeyValueMap> {
    let renderer = simple.renderer.as_ref()?;
    let rendered = guarded(key, || renderer(value))?;

    let mut output = KeyValueMap::with_capacity(1);
    output.insert(key, rendered);
    Some(output)
}

fn write_composite(
    node: &Node,
    composite: &CompositeNode,
    value: &dyn Any,
    key: &str,
) -> Option<KeyValueMap> {
    let policy = node.policy();
    let mut output = KeyValueMap::with_capacity(composite.components.len());

    // Any missing or failing component discards the whole node.
    for component in &composite.components {
        let renderer = component.renderer.as_ref()?;
        let rendered = guarded(key, || renderer(value))?;
        output.insert(policy.component_key(key, &component.id), rendered);
    }

    Some(output)
}

// -----------------------------------------------------------------------------
// Collections

fn write_indexed(
    collection: &CollectionNode,
    value: &dyn Any,
    key: &str,
    indices: &mut Vec<usize>,
) -> Outcome {
    let mut output = KeyValueMap::new();

    for (index, item) in (collection.items)(value).into_iter().enumerate() {
        indices.push(index);
        let result = serialize(&collection.item, item, key, indices);
        indices.pop();

        // A skipped index would end the scan when reading the list back.
        let Some(item) = result? else {
            log::debug!("item {index} of collection `{key}` failed, collection dropped");
            return Ok(None);
        };
        output.append(item);
    }

    Ok(Some(output))
}

fn write_comma_separated(collection: &CollectionNode, value: &dyn Any, key: &str) -> Outcome {
    let NodeKind::Simple(SimpleNode {
        renderer: Some(renderer),
        ..
    }) = &collection.item.kind
    else {
        return Ok(None);
    };

    let mut joined = String::new();
    for (index, item) in (collection.items)(value).into_iter().enumerate() {
        let Some(rendered) = guarded(key, || renderer(item)) else {
            if collection.item.mandatory {
                return Err(MandatoryError::new(key.into(), Operation::Serialize));
            }
            return Ok(None);
        };

        if index > 0 {
            joined.push(COMMA_DELIMITER);
        }
        joined.push_str(&rendered);
    }

    let mut output = KeyValueMap::with_capacity(1);
    output.insert(key, joined);
    Ok(Some(output))
}

// -----------------------------------------------------------------------------
// Classes

fn write_class(class: &ClassNode, value: &dyn Any, key: &str, indices: &mut Vec<usize>) -> Outcome {
    if let Some(map_as) = &class.map_as {
        return serialize(map_as, value, key, indices);
    }

    let mut output = KeyValueMap::new();

    for property in &class.properties {
        let Some(binding) = &property.binding else {
            continue;
        };
        let current = guarded(key, || binding.get(value));

        let result = match current {
            Some(current) => serialize(property, current, key, indices)?,
            None if property.mandatory => {
                let property_key = property.key_name(key, indices);
                return Err(MandatoryError::new(property_key, Operation::Serialize));
            }
            None => None,
        };

        if let Some(result) = result {
            output.append(result);
        }
    }

    Ok(Some(output))
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::serialize;
    use crate::node::IntoMapping;
    use crate::{CollectionMapping, CompositeMapping, KeyValueMap, SimpleMapping};
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;

    fn pairs(output: &KeyValueMap) -> Vec<(&str, &str)> {
        output.to_sorted_vec()
    }

    #[test]
    fn simple_writes_flag() {
        let node = SimpleMapping::<i32>::parsed().flag_key("HasValue").into_node();
        let output = serialize(&node, &4_i32, "Value", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("HasValue", "true"), ("Value", "4")]);
    }

    #[test]
    fn composite_is_all_or_nothing() {
        let node = CompositeMapping::<i32>::new()
            .component_with("A", |v| v.to_string())
            .component("B", |v| (*v > 0).then(|| v.to_string()))
            .flag_key("HasX")
            .into_node();

        let output = serialize(&node, &3_i32, "X", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("HasX", "true"), ("XA", "3"), ("XB", "3")]);

        // `A` renders, `B` fails: nothing is written, not even the flag.
        assert!(serialize(&node, &-3_i32, "X", &mut Vec::new()).unwrap().is_none());
    }

    #[test]
    fn indexed_items_are_enumerated() {
        let node = CollectionMapping::<Vec<i32>, i32>::new(SimpleMapping::parsed()).into_node();
        let output = serialize(&node, &vec![5, 6], "Coll", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("Coll[0]", "5"), ("Coll[1]", "6")]);

        let output = serialize(&node, &Vec::<i32>::new(), "Coll", &mut Vec::new()).unwrap().unwrap();
        assert!(output.is_empty());
    }

    #[test]
    fn failing_item_drops_indexed_collection() {
        let item = SimpleMapping::<i32>::parsed().renderer(|v| (*v != 2).then(|| v.to_string()));
        let node = CollectionMapping::<Vec<i32>, i32>::new(item).into_node();

        assert!(serialize(&node, &vec![1, 2, 3], "Numbers", &mut Vec::new()).unwrap().is_none());

        let output = serialize(&node, &vec![1, 3], "Numbers", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("Numbers[0]", "1"), ("Numbers[1]", "3")]);
    }

    #[test]
    fn comma_separated_joins() {
        let node = CollectionMapping::<Vec<i32>, i32>::new(SimpleMapping::parsed())
            .comma_separated()
            .into_node();

        let output = serialize(&node, &vec![1, 2, 3], "Coll", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("Coll", "1,2,3")]);

        let output = serialize(&node, &Vec::<i32>::new(), "Coll", &mut Vec::new()).unwrap().unwrap();
        assert_eq!(pairs(&output), [("Coll", "")]);
    }

    #[test]
    fn wrong_value_type_is_soft() {
        let node = SimpleMapping::<i32>::parsed().into_node();
        assert!(serialize(&node, &4_u8, "Value", &mut Vec::new()).unwrap().is_none());
    }
}
