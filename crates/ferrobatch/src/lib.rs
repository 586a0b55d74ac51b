#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod coordinator;
mod delay;
mod error;
mod mutex;
mod policy;
mod processor;
mod runtime;
mod status;

pub use crate::coordinator::*;
pub use crate::delay::*;
pub use crate::error::*;
pub use crate::policy::*;
pub use crate::processor::{BatchFn, SingleFn};
pub use crate::runtime::*;
pub use crate::status::*;
