//! The recursive evaluator.
//!
//! Both directions walk a frozen tree with one exhaustive match per node.
//! Each call threads the owning node's key and the list of collection
//! indices accumulated so far; the list is pushed and popped in place.
//!
//! At every node boundary the outcome is one of:
//!
//! - `Ok(Some(_))`: success.
//! - `Ok(None)`: soft failure, the node is treated as absent.
//! - `Err(MandatoryError)`: a mandatory node failed, aborting the call.

mod de;
mod probe;
mod ser;

pub(crate) use de::deserialize;
pub(crate) use ser::serialize;

use kvs_utils::KeyValueMap;

use crate::node::Node;

/// The value written to flag keys.
pub(crate) const FLAG_TRUE: &str = "true";

/// Checks the presence flag of `node`, if it has one.
#[inline]
fn flag_satisfied(node: &Node, data: &KeyValueMap) -> bool {
    match &node.flag_key {
        None => true,
        Some(flag) => data
            .get(flag)
            .is_some_and(|value| value.eq_ignore_ascii_case(FLAG_TRUE)),
    }
}
