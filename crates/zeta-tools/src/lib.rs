//! Tooling for gated state machines: simulation traces recorded through a [`zeta_core::Rolodex`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod trace;

pub use trace::{
    emit, enable_trace_log, take_trace_log, NullTraceSink, SharedTraceSink, TraceEvent, TraceLog,
    TraceSink, VecTraceSink, TRACE_LOG, TRACE_SINK,
};
