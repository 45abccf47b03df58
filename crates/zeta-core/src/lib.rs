//! Dynamic, runtime-typed shared state for gated state machines.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod error;
pub mod rolodex;
pub mod value;

pub use error::{Result, StoreError};
pub use rolodex::{Getter, Rolodex, Setter};
pub use value::AnyValue;
