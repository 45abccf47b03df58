//! Umbrella crate that re-exports the `zeta-*` building blocks.
//!
//! `zeta::core` holds the [`Rolodex`](zeta_core::Rolodex) shared store, `zeta::csm` the
//! gated state machine, and `zeta::tools` the simulation trace.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

#[cfg(feature = "core")]
#[cfg_attr(docsrs, doc(cfg(feature = "core")))]
pub use zeta_core as core;

#[cfg(feature = "tools")]
#[cfg_attr(docsrs, doc(cfg(feature = "tools")))]
pub use zeta_tools as tools;

#[cfg(feature = "csm")]
#[cfg_attr(docsrs, doc(cfg(feature = "csm")))]
pub use zeta_csm as csm;

#[cfg(feature = "csm")]
#[cfg_attr(docsrs, doc(cfg(feature = "csm")))]
pub mod prelude {
    pub use zeta_core::{AnyValue, Rolodex, StoreError};
    pub use zeta_csm::{
        ActionKind, CsmError, Node, NodeBehavior, NodeContext, StateMachine, DEFAULT_GATE,
        START,
    };
}
