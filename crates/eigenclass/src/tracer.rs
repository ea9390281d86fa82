//! Runtime event tracing.
//!
//! Provides a trait-based tracing system for class registration, subclass
//! synthesis, binding and override installation. When using [`NoopTracer`],
//! every hook compiles away through monomorphization: the runtime carries the
//! tracer as a type parameter (`Runtime<Tr: EigenTracer = NoopTracer>`).
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (production default) |
//! | [`LogTracer`] | Structured events through the `tracing` crate |
//! | [`RecordingTracer`] | Captures [`TraceEvent`]s for assertions and post-mortem |
//!
//! Hooks take `&self` because a runtime is shared across threads; tracers
//! that keep state use interior mutability.
//!
//! ```
//! use eigenclass::{RecordingTracer, Runtime, RuntimeConfig};
//!
//! let runtime = Runtime::with_tracer(RuntimeConfig::new(), RecordingTracer::new());
//! let object = runtime.root_class().instantiate();
//! runtime.eigen(&object).unwrap();
//! assert!(runtime.tracer().event_count() > 0);
//! ```

use std::fmt;

use parking_lot::Mutex;

use crate::{
    class::{Class, ClassId},
    error::RegistrationError,
    selector::Selector,
};

/// Event captured by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A class was added to the runtime's namespace.
    ClassRegistered {
        class: String,
        id: ClassId,
        synthesized: bool,
    },
    /// The registry created an override subclass for `original`.
    SubclassSynthesized { original: String, subclass: String },
    /// The registry returned a cached override subclass.
    SubclassReused { original: String, subclass: String },
    /// The registry could not create an override subclass.
    RegistrationFailed { class: String, reason: String },
    /// An object's dispatch now starts at `subclass`.
    ObjectBound {
        object: u64,
        subclass: String,
        /// The object was already bound and nothing changed.
        rebind: bool,
    },
    /// A method was installed on an override subclass.
    MethodInstalled {
        class: String,
        selector: Selector,
        /// An earlier entry for the selector was replaced.
        replaced: bool,
    },
}

/// Hooks called by the runtime at key events.
///
/// All methods default to no-ops so implementations only override what they
/// need. Hooks may run while the registry lock is held and must not call
/// back into the runtime.
pub trait EigenTracer: fmt::Debug + Send + Sync {
    /// Called after a class (defined or synthesized) is registered.
    #[inline(always)]
    fn on_class_registered(&self, _class: &Class) {}

    /// Called after the registry creates an override subclass.
    #[inline(always)]
    fn on_subclass_synthesized(&self, _original: &Class, _subclass: &Class) {}

    /// Called when the registry answers from its cache.
    #[inline(always)]
    fn on_subclass_reused(&self, _original: &Class, _subclass: &Class) {}

    /// Called when synthesis fails for `original`.
    #[inline(always)]
    fn on_registration_failed(&self, _original: &Class, _error: &RegistrationError) {}

    /// Called after binding an object.
    #[inline(always)]
    fn on_object_bound(&self, _object_id: u64, _subclass: &Class, _rebind: bool) {}

    /// Called after a method is installed on an override subclass.
    #[inline(always)]
    fn on_method_installed(&self, _subclass: &Class, _selector: &Selector, _replaced: bool) {}
}

// ============================================================================
// NoopTracer: zero-cost production default
// ============================================================================

/// A tracer that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl EigenTracer for NoopTracer {}

// ============================================================================
// LogTracer: structured log events
// ============================================================================

/// Tracer that forwards every event to the `tracing` crate.
///
/// Registration and binding are emitted at `debug` and the high-volume cache
/// hits at `trace`. Rejected registrations are logged at `warn` by the
/// registry regardless of the tracer. Install any `tracing` subscriber to
/// collect them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracer;

impl EigenTracer for LogTracer {
    fn on_class_registered(&self, class: &Class) {
        tracing::debug!(
            class = class.name(),
            id = class.id().raw(),
            synthesized = class.is_synthesized(),
            "class registered"
        );
    }

    fn on_subclass_synthesized(&self, original: &Class, subclass: &Class) {
        tracing::debug!(original = original.name(), subclass = subclass.name(), "subclass synthesized");
    }

    fn on_subclass_reused(&self, original: &Class, subclass: &Class) {
        tracing::trace!(original = original.name(), subclass = subclass.name(), "subclass reused");
    }

    fn on_object_bound(&self, object_id: u64, subclass: &Class, rebind: bool) {
        tracing::debug!(object = object_id, subclass = subclass.name(), rebind, "object bound");
    }

    fn on_method_installed(&self, subclass: &Class, selector: &Selector, replaced: bool) {
        tracing::debug!(
            class = subclass.name(),
            selector = selector.name(),
            replaced,
            "method installed"
        );
    }
}

// ============================================================================
// RecordingTracer: full event recording
// ============================================================================

/// Tracer that records every event in order.
///
/// Optionally capped so a long-running process cannot grow the log without
/// bound; events past the cap are dropped.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    events: Mutex<Vec<TraceEvent>>,
    limit: Option<usize>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracer that keeps at most `limit` events.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            limit: Some(limit),
        }
    }

    /// Copy of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().clone()
    }

    /// Removes and returns the events recorded so far.
    pub fn take_events(&self) -> Vec<TraceEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.lock().len()
    }

    fn record(&self, event: TraceEvent) {
        let mut events = self.events.lock();
        if self.limit.is_none_or(|limit| events.len() < limit) {
            events.push(event);
        }
    }
}

impl EigenTracer for RecordingTracer {
    fn on_class_registered(&self, class: &Class) {
        self.record(TraceEvent::ClassRegistered {
            class: class.name().to_owned(),
            id: class.id(),
            synthesized: class.is_synthesized(),
        });
    }

    fn on_subclass_synthesized(&self, original: &Class, subclass: &Class) {
        self.record(TraceEvent::SubclassSynthesized {
            original: original.name().to_owned(),
            subclass: subclass.name().to_owned(),
        });
    }

    fn on_subclass_reused(&self, original: &Class, subclass: &Class) {
        self.record(TraceEvent::SubclassReused {
            original: original.name().to_owned(),
            subclass: subclass.name().to_owned(),
        });
    }

    fn on_registration_failed(&self, original: &Class, error: &RegistrationError) {
        self.record(TraceEvent::RegistrationFailed {
            class: original.name().to_owned(),
            reason: error.reason.to_string(),
        });
    }

    fn on_object_bound(&self, object_id: u64, subclass: &Class, rebind: bool) {
        self.record(TraceEvent::ObjectBound {
            object: object_id,
            subclass: subclass.name().to_owned(),
            rebind,
        });
    }

    fn on_method_installed(&self, subclass: &Class, selector: &Selector, replaced: bool) {
        self.record(TraceEvent::MethodInstalled {
            class: subclass.name().to_owned(),
            selector: selector.clone(),
            replaced,
        });
    }
}
