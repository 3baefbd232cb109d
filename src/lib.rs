#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use kvs_mapping as mapping;
pub use kvs_utils as utils;
