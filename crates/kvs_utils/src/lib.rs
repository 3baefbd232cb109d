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

mod key_value_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use key_value_map::KeyValueMap;
