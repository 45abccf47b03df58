#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;

use zeta_core::Rolodex;

/// One step of a simulation trace.
///
/// Plain data so it can be recorded during a tick and rendered later by tooling. `subject` is
/// usually a node name or a message; `detail` carries a gate or other qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub tag: Cow<'static, str>,
    pub subject: String,
    pub detail: String,
}

impl TraceEvent {
    pub fn new(tick: u64, tag: impl Into<Cow<'static, str>>) -> Self {
        Self {
            tick,
            tag: tag.into(),
            subject: String::new(),
            detail: String::new(),
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

pub trait TraceSink {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default)]
pub struct VecTraceSink {
    pub events: Vec<TraceEvent>,
}

impl TraceSink for VecTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Store values must be clonable, so sinks live behind a shared cell.
pub type SharedTraceSink = Rc<RefCell<dyn TraceSink>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a TraceEvent> + 'a {
        self.events.iter().filter(move |e| e.tag == tag)
    }
}

/// Store field collecting events in-memory.
pub const TRACE_LOG: &str = "__zeta.trace_log";
/// Store field streaming events into a user-provided [`SharedTraceSink`].
pub const TRACE_SINK: &str = "__zeta.trace_sink";

/// Starts collecting into a fresh [`TraceLog`], replacing any previous log field.
pub fn enable_trace_log(store: &mut Rolodex) {
    if let Err(err) = store.push(TRACE_LOG, TraceLog::default()) {
        tracing::warn!(%err, "trace log slot is bound to another type");
    }
}

/// Takes the collected log out of the store, leaving an empty one behind.
pub fn take_trace_log(store: &mut Rolodex) -> Option<TraceLog> {
    store.field_mut::<TraceLog>(TRACE_LOG).map(std::mem::take)
}

pub fn emit(store: &mut Rolodex, event: TraceEvent) {
    tracing::trace!(
        tick = event.tick,
        tag = %event.tag,
        subject = %event.subject,
        detail = %event.detail,
        "trace"
    );
    if let Some(log) = store.field_mut::<TraceLog>(TRACE_LOG) {
        log.push(event.clone());
    }
    if let Some(sink) = store.field::<SharedTraceSink>(TRACE_SINK) {
        sink.borrow_mut().emit(event);
    }
}
