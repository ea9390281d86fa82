//! Name-keyed registry of every class in a runtime.

use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;

use crate::{
    class::ClassRef,
    error::{RegistrationError, RegistrationFailure},
};

/// Class names are unique within a runtime. The namespace owns a strong
/// reference to every class, so classes are never freed while the runtime
/// lives.
#[derive(Debug, Default)]
pub(crate) struct Namespace {
    classes: RwLock<AHashMap<Arc<str>, ClassRef>>,
}

impl Namespace {
    /// Creates a namespace holding only `class`.
    pub fn with_class(class: &ClassRef) -> Self {
        let mut classes = AHashMap::new();
        classes.insert(Arc::from(class.name()), Arc::clone(class));
        Self {
            classes: RwLock::new(classes),
        }
    }

    pub fn get(&self, name: &str) -> Option<ClassRef> {
        self.classes.read().get(name).cloned()
    }

    /// Registers `class` under its name, failing if the name is taken.
    pub fn insert(&self, class: &ClassRef) -> Result<(), RegistrationError> {
        let mut classes = self.classes.write();
        if classes.contains_key(class.name()) {
            return Err(RegistrationError::new(class.name(), RegistrationFailure::NameTaken));
        }
        classes.insert(Arc::from(class.name()), Arc::clone(class));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Snapshot of every registered class, oldest first.
    pub fn classes(&self) -> Vec<ClassRef> {
        let mut classes: Vec<ClassRef> = self.classes.read().values().cloned().collect();
        classes.sort_by_key(|class| class.id());
        classes
    }
}
