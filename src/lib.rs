#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![no_std]

pub use dec_defs as defs;
pub use dec_reflect as reflect;
pub use dec_utils as utils;
