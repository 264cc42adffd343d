#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod classify;
mod error;
pub mod mock;
pub mod record;
pub mod sink;

pub use error::BoxedError;
