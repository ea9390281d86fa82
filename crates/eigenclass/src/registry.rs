//! Registry of override subclasses, one per original class.
//!
//! The first request for a class creates a subclass named
//! `<prefix><OriginalName>` whose superclass is the original, registers it in
//! the runtime namespace and caches it. Every later request (from any thread)
//! returns the cached subclass, so all patched instances of a class share one
//! dispatch table.
//!
//! The lookup and the creation happen under one lock: two threads racing to
//! patch the first instance of a class cannot produce two subclasses.
//! Subclasses are never removed. Objects may hold them in their class pointer
//! for as long as they live, so there is no safe point to unregister one.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::{
    class::{Class, ClassId, ClassKind, ClassRef, MethodTable},
    error::{RegistrationError, RegistrationFailure},
    runtime::Runtime,
    tracer::EigenTracer,
};

/// Cached outcome for an original class.
#[derive(Debug)]
enum Slot {
    Ready(ClassRef),
    /// Creation was rejected; the same error is returned on every later request.
    Failed(RegistrationError),
}

#[derive(Debug, Default)]
struct RegistryState {
    /// Keyed by original class id.
    by_original: AHashMap<ClassId, Slot>,
    /// Every subclass this registry created, keyed by its own id.
    synthesized: AHashMap<ClassId, ClassRef>,
}

/// Process-lifetime cache of override subclasses.
///
/// Owned by a [`Runtime`]; reach it through [`Runtime::registry`].
#[derive(Debug, Default)]
pub struct SubclassRegistry {
    state: Mutex<RegistryState>,
}

impl SubclassRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the override subclass for `original`, creating it on first use.
    ///
    /// A class that is itself an override subclass from this registry is
    /// returned unchanged. A rejected creation is recorded and returned again
    /// for every later request, without retrying, except when the configured
    /// subclass limit is the reason.
    pub(crate) fn subclass_for<Tr: EigenTracer>(
        &self,
        runtime: &Runtime<Tr>,
        original: &ClassRef,
    ) -> Result<ClassRef, RegistrationError> {
        let mut state = self.state.lock();

        if original.is_synthesized() {
            return if state.synthesized.contains_key(&original.id()) {
                Ok(Arc::clone(original))
            } else {
                Err(RegistrationError::new(
                    original.name(),
                    RegistrationFailure::ForeignSynthesizedClass,
                ))
            };
        }

        match state.by_original.get(&original.id()) {
            Some(Slot::Ready(subclass)) => {
                runtime.tracer().on_subclass_reused(original, subclass);
                return Ok(Arc::clone(subclass));
            }
            Some(Slot::Failed(error)) => return Err(error.clone()),
            None => {}
        }

        let name = runtime.config().subclass_name(original.name());
        if let Some(limit) = runtime.config().max_synthesized_subclasses
            && state.synthesized.len() >= limit
        {
            let error = RegistrationError::new(name, RegistrationFailure::SubclassLimit { limit });
            report_failure(runtime, original, &error);
            return Err(error);
        }

        match runtime.create_class(
            &name,
            Some(Arc::clone(original)),
            ClassKind::Synthesized,
            MethodTable::default(),
        ) {
            Ok(subclass) => {
                state
                    .by_original
                    .insert(original.id(), Slot::Ready(Arc::clone(&subclass)));
                state.synthesized.insert(subclass.id(), Arc::clone(&subclass));
                runtime.tracer().on_subclass_synthesized(original, &subclass);
                Ok(subclass)
            }
            Err(error) => {
                state.by_original.insert(original.id(), Slot::Failed(error.clone()));
                report_failure(runtime, original, &error);
                Err(error)
            }
        }
    }

    /// Whether `class` is an override subclass created by this registry.
    #[must_use]
    pub fn owns(&self, class: &Class) -> bool {
        self.state.lock().synthesized.contains_key(&class.id())
    }

    /// The override subclass for `original`, if one has been created.
    #[must_use]
    pub fn existing_subclass(&self, original: &Class) -> Option<ClassRef> {
        match self.state.lock().by_original.get(&original.id()) {
            Some(Slot::Ready(subclass)) => Some(Arc::clone(subclass)),
            _ => None,
        }
    }

    /// Every override subclass created so far, in creation order.
    #[must_use]
    pub fn synthesized(&self) -> Vec<ClassRef> {
        let mut classes: Vec<ClassRef> = self.state.lock().synthesized.values().cloned().collect();
        classes.sort_by_key(|class| class.id());
        classes
    }

    /// Number of override subclasses created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().synthesized.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of original classes whose synthesis was rejected.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.state
            .lock()
            .by_original
            .values()
            .filter(|slot| matches!(slot, Slot::Failed(_)))
            .count()
    }
}

fn report_failure<Tr: EigenTracer>(runtime: &Runtime<Tr>, original: &Class, error: &RegistrationError) {
    tracing::warn!(original = original.name(), %error, "override subclass rejected");
    runtime.tracer().on_registration_failed(original, error);
}
