//! Objects with a swappable class pointer.
//!
//! Every [`Object`] records its class in a lock-protected pointer that
//! dispatch reads on each send. Rewriting that pointer (which only
//! [`Eigen::bind`](crate::Eigen::bind) does) redirects all later dispatch on
//! the object without touching any other instance.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use ahash::AHashMap;
use parking_lot::{Mutex, RwLock};

use crate::{
    class::ClassRef,
    error::{DispatchError, DispatchResult},
    selector::Selector,
    value::Value,
};

/// Shared handle to an object.
pub type ObjectRef = Arc<Object>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// An instance of a class.
pub struct Object {
    id: u64,
    /// Class pointer consulted by dispatch. Written only when binding.
    isa: RwLock<ClassRef>,
    ivars: Mutex<AHashMap<Arc<str>, Value>>,
}

impl Object {
    /// Creates an object of `class`.
    #[must_use]
    pub fn new(class: &ClassRef) -> ObjectRef {
        Arc::new(Self {
            id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
            isa: RwLock::new(Arc::clone(class)),
            ivars: Mutex::new(AHashMap::new()),
        })
    }

    /// Process-unique object id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The class dispatch currently starts from.
    ///
    /// After binding this is the synthesized override subclass, not the
    /// class the object was created with.
    #[must_use]
    pub fn class(&self) -> ClassRef {
        self.isa.read().clone()
    }

    /// Whether a send of `selector` would find an implementation.
    #[must_use]
    pub fn responds_to(&self, selector: &Selector) -> bool {
        self.class().responds_to(selector)
    }

    /// Sends a message: resolves `selector` from the current class, checks
    /// the arguments and result against the method signature and runs it.
    ///
    /// The class pointer lock is released before the implementation runs,
    /// so implementations may send further messages to the same object.
    pub fn send(self: &Arc<Self>, selector: &Selector, args: &[Value]) -> DispatchResult<Value> {
        let class = self.class();
        let method = class
            .lookup(selector)
            .ok_or_else(|| DispatchError::UnrecognizedSelector {
                class_name: class.name().to_owned(),
                selector: selector.clone(),
            })?;
        method.call(self, args)
    }

    /// Reads an instance variable.
    #[must_use]
    pub fn ivar(&self, name: &str) -> Option<Value> {
        self.ivars.lock().get(name).cloned()
    }

    /// Writes an instance variable, returning the previous value.
    pub fn set_ivar(&self, name: &str, value: impl Into<Value>) -> Option<Value> {
        self.ivars.lock().insert(Arc::from(name), value.into())
    }

    /// The class pointer itself, for binding.
    pub(crate) fn isa(&self) -> &RwLock<ClassRef> {
        &self.isa
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.id)
            .field("class", &self.class().name())
            .finish_non_exhaustive()
    }
}
