#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

// -----------------------------------------------------------------------------
// No STD Support

#[cfg(feature = "std")]
extern crate std;

extern crate alloc;

// -----------------------------------------------------------------------------
// Modules

mod class;
mod collection;
mod composite;
mod engine;
mod error;
mod guard;
mod node;
mod property;
mod serializer;
mod simple;

pub mod naming;

// -----------------------------------------------------------------------------
// Top-level exports

pub use class::ClassMapping;
pub use collection::{COMMA_DELIMITER, CollectionMapping, ListStyle};
pub use composite::{ComponentValues, CompositeMapping};
pub use error::{Error, InvalidMappingError, InvalidMappingKind, MandatoryError, Operation};
pub use node::{IntoMapping, MappingKind, Node};
pub use property::Property;
pub use serializer::KeyValueSerializer;
pub use simple::SimpleMapping;

pub use kvs_utils::KeyValueMap;
