use alloc::vec::Vec;

use kvs_utils::KeyValueMap;

use crate::collection::ListStyle;
use crate::node::{Node, NodeKind};

/// Returns `true` if any data key of the subtree rooted at `node` exists.
///
/// Flag keys are not considered: they are absolute and would make every
/// index of a collection look present. Nested indexed collections are
/// probed at index 0 only.
pub(super) fn is_present(
    node: &Node,
    data: &KeyValueMap,
    parent_key: &str,
    indices: &mut Vec<usize>,
) -> bool {
    let key = node.key_name(parent_key, indices);

    match &node.kind {
        NodeKind::Simple(_) => data.contains_key(&key),
        NodeKind::Composite(composite) => {
            let policy = node.policy();
            composite
                .components
                .iter()
                .any(|component| data.contains_key(&policy.component_key(&key, &component.id)))
        }
        NodeKind::Collection(collection) => match collection.style {
            ListStyle::CommaSeparated => data.contains_key(&key),
            ListStyle::Indexed => {
                indices.push(0);
                let present = is_present(&collection.item, data, &key, indices);
                indices.pop();
                present
            }
        },
        NodeKind::Class(class) => match &class.map_as {
            Some(map_as) => is_present(map_as, data, &key, indices),
            None => class
                .properties
                .iter()
                .any(|property| is_present(property, data, &key, indices)),
        },
    }
}
