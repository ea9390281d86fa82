//! Classes: runtime-built dispatch tables linked by parent pointers.
//!
//! A [`Class`] owns a method table keyed by selector and an optional
//! superclass. Dispatch resolves a selector by checking the class's own table
//! first and then walking the superclass chain, so a subclass that defines
//! nothing behaves exactly like its parent.
//!
//! # Publishing methods
//!
//! The table sits behind a read/write lock as an `Arc` snapshot. Installing a
//! method builds the new table and swaps it in while holding the write lock,
//! so a concurrent lookup sees either the old entry or the new one, never a
//! half-written one. Readers that need a stable listing take a snapshot with
//! [`Class::methods`] and hold it without blocking writers.
//!
//! # Kinds
//!
//! Classes defined through [`ClassBuilder`] are [`ClassKind::Defined`].
//! Override subclasses created by the
//! [`SubclassRegistry`](crate::SubclassRegistry) are
//! [`ClassKind::Synthesized`]; they are never created any other way and
//! cannot be used as a superclass, so registration through [`ClassBuilder`]
//! rejects them.

use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::{
    error::{EigenError, SignatureMismatchError},
    method::{Implementation, Method, TypedMethod},
    object::{Object, ObjectRef},
    runtime::Runtime,
    selector::Selector,
    signature::Signature,
    tracer::EigenTracer,
};

/// Shared handle to a class. Classes live as long as anything references them.
pub type ClassRef = Arc<Class>;

/// A class's own methods, in installation order.
pub type MethodTable = IndexMap<Selector, Method, ahash::RandomState>;

/// Unique identity of a class within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct ClassId(u64);

impl ClassId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id value.
    #[must_use]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a class came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ClassKind {
    /// Declared by the host through [`ClassBuilder`].
    Defined,
    /// Created by the registry to host per-instance overrides.
    Synthesized,
}

/// A class: a named dispatch table with an optional superclass.
pub struct Class {
    id: ClassId,
    name: Arc<str>,
    superclass: Option<ClassRef>,
    kind: ClassKind,
    /// Number of ancestors; the root class has depth 0.
    depth: usize,
    methods: RwLock<Arc<MethodTable>>,
}

impl Class {
    pub(crate) fn new(
        id: ClassId,
        name: Arc<str>,
        superclass: Option<ClassRef>,
        kind: ClassKind,
        methods: MethodTable,
    ) -> Self {
        let depth = superclass.as_ref().map_or(0, |parent| parent.depth + 1);
        Self {
            id,
            name,
            superclass,
            kind,
            depth,
            methods: RwLock::new(Arc::new(methods)),
        }
    }

    #[must_use]
    pub fn id(&self) -> ClassId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn superclass(&self) -> Option<&ClassRef> {
        self.superclass.as_ref()
    }

    #[must_use]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    /// Whether this class hosts per-instance overrides.
    #[must_use]
    pub fn is_synthesized(&self) -> bool {
        self.kind == ClassKind::Synthesized
    }

    /// Number of ancestors above this class.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Iterates this class followed by each ancestor up to the root.
    pub fn ancestors(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Whether `other` is this class or one of its ancestors.
    #[must_use]
    pub fn is_subclass_of(&self, other: &Self) -> bool {
        self.ancestors().any(|class| class.id == other.id)
    }

    /// Looks up a method in this class's own table only.
    #[must_use]
    pub fn lookup_own(&self, selector: &Selector) -> Option<Method> {
        self.methods.read().get(selector).cloned()
    }

    /// Resolves a selector the way dispatch does: own table, then ancestors.
    #[must_use]
    pub fn lookup(&self, selector: &Selector) -> Option<Method> {
        self.ancestors().find_map(|class| class.lookup_own(selector))
    }

    /// Whether instances of this class respond to `selector`.
    #[must_use]
    pub fn responds_to(&self, selector: &Selector) -> bool {
        self.ancestors()
            .any(|class| class.methods.read().contains_key(selector))
    }

    /// Snapshot of this class's own methods in installation order.
    #[must_use]
    pub fn methods(&self) -> Arc<MethodTable> {
        self.methods.read().clone()
    }

    /// Number of methods in this class's own table.
    #[must_use]
    pub fn own_method_count(&self) -> usize {
        self.methods.read().len()
    }

    /// Creates a new instance whose class pointer is this class.
    ///
    /// Instantiating an override subclass yields an object that is already
    /// bound: it shares the subclass's overrides, and binding it again
    /// returns a handle to the same subclass.
    #[must_use]
    pub fn instantiate(self: &Arc<Self>) -> ObjectRef {
        Object::new(self)
    }

    /// Installs or replaces a method in this class's own table.
    ///
    /// Returns the entry that was replaced, if any. When an entry for the
    /// selector already exists the new signature must be compatible with it;
    /// on mismatch the table is left untouched.
    pub(crate) fn install_method(&self, method: Method) -> Result<Option<Method>, SignatureMismatchError> {
        let mut table = self.methods.write();
        if let Some(existing) = table.get(method.selector())
            && !existing.signature().is_compatible_with(method.signature())
        {
            return Err(SignatureMismatchError {
                selector: method.selector().clone(),
                existing: existing.signature().clone(),
                requested: method.signature().clone(),
            });
        }
        let selector = method.selector().clone();
        Ok(Arc::make_mut(&mut *table).insert(selector, method))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("superclass", &self.superclass.as_ref().map(|parent| parent.name()))
            .field("methods", &self.own_method_count())
            .finish()
    }
}

/// Iterator over a class and its ancestors, nearest first.
pub struct Ancestors<'a> {
    next: Option<&'a Class>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Class;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.superclass.as_deref();
        Some(current)
    }
}

/// Declares a class and registers it with a [`Runtime`].
///
/// ```
/// use eigenclass::{ClassBuilder, ObjectRef, Runtime, Selector};
///
/// let runtime = Runtime::new();
/// let shape = ClassBuilder::new("Shape")
///     .typed_method(Selector::new("area"), |_: &ObjectRef| 10_i64)
///     .register(&runtime)
///     .unwrap();
/// assert_eq!(shape.superclass().unwrap().name(), "Object");
/// ```
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    superclass: Option<ClassRef>,
    methods: Vec<Method>,
}

impl ClassBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            superclass: None,
            methods: Vec::new(),
        }
    }

    /// Sets the superclass. Defaults to the runtime's root class.
    #[must_use]
    pub fn superclass(mut self, superclass: &ClassRef) -> Self {
        self.superclass = Some(Arc::clone(superclass));
        self
    }

    #[must_use]
    pub fn method(mut self, selector: Selector, signature: Signature, implementation: Implementation) -> Self {
        self.methods.push(Method::new(selector, signature, implementation));
        self
    }

    #[must_use]
    pub fn typed_method<Args, F: TypedMethod<Args>>(mut self, selector: Selector, f: F) -> Self {
        self.methods.push(Method::typed(selector, f));
        self
    }

    /// Builds the method table and registers the class.
    ///
    /// Fails with a registration error if the name is taken, the superclass
    /// is an override subclass or the hierarchy is too deep. Fails with a
    /// signature mismatch if the same selector was declared twice with
    /// different signatures.
    pub fn register<Tr: EigenTracer>(self, runtime: &Runtime<Tr>) -> Result<ClassRef, EigenError> {
        let mut table = MethodTable::default();
        for method in self.methods {
            if let Some(existing) = table.get(method.selector())
                && !existing.signature().is_compatible_with(method.signature())
            {
                return Err(SignatureMismatchError {
                    selector: method.selector().clone(),
                    existing: existing.signature().clone(),
                    requested: method.signature().clone(),
                }
                .into());
            }
            table.insert(method.selector().clone(), method);
        }
        let superclass = self
            .superclass
            .unwrap_or_else(|| Arc::clone(runtime.root_class()));
        let class = runtime.create_class(&self.name, Some(superclass), ClassKind::Defined, table)?;
        Ok(class)
    }
}
