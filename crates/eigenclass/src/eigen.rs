//! Per-object override handles.
//!
//! [`Eigen::bind`] points an object's class pointer at the override subclass
//! of its class, so messages sent to that object consult the override table
//! first while every other instance keeps dispatching through the original
//! class. Overrides installed through the handle live on the shared override
//! subclass: they apply to every object of the same original class that has
//! been bound, and to none that has not.
//!
//! ```
//! use eigenclass::{ClassBuilder, ObjectRef, Runtime, Selector, Value};
//!
//! let runtime = Runtime::new();
//! let shape = ClassBuilder::new("Shape")
//!     .typed_method(Selector::new("area"), |_: &ObjectRef| 10_i64)
//!     .register(&runtime)
//!     .unwrap();
//! let area = Selector::new("area");
//! let patched = shape.instantiate();
//! let plain = shape.instantiate();
//!
//! let eigen = runtime.eigen(&patched).unwrap();
//! let original = eigen.original_implementation(&area).unwrap();
//! eigen
//!     .set_typed(area.clone(), move |this: &ObjectRef| -> i64 {
//!         let base = original.invoke(this, &Selector::new("area"), &[]).unwrap();
//!         base.as_int().unwrap() + 1
//!     })
//!     .unwrap();
//!
//! assert_eq!(patched.send(&area, &[]), Ok(Value::Int(11)));
//! assert_eq!(plain.send(&area, &[]), Ok(Value::Int(10)));
//! ```

use std::sync::Arc;

use crate::{
    class::{ClassRef, MethodTable},
    error::{DispatchResult, RegistrationError, RegistrationFailure, SelectorNotFoundError, SignatureMismatchError},
    method::{Implementation, Method, TypedMethod},
    object::ObjectRef,
    runtime::Runtime,
    selector::Selector,
    signature::Signature,
    tracer::{EigenTracer, NoopTracer},
    value::Value,
};

/// Handle binding one object to its override subclass.
///
/// Handles are cheap and short-lived; request one whenever needed; binding
/// the same object again returns a handle to the same subclass.
#[derive(Debug)]
pub struct Eigen<'rt, Tr: EigenTracer = NoopTracer> {
    runtime: &'rt Runtime<Tr>,
    object: ObjectRef,
    subclass: ClassRef,
    original: ClassRef,
}

impl<'rt, Tr: EigenTracer> Eigen<'rt, Tr> {
    /// Binds `object` to the override subclass of its current class.
    ///
    /// An object already bound through this runtime keeps its subclass. The
    /// class pointer is rewritten only after the subclass exists, so on error
    /// the object is left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistrationError`] if the override subclass cannot be
    /// registered, or if the object is bound to an override subclass owned by
    /// a different runtime.
    pub fn bind(runtime: &'rt Runtime<Tr>, object: &ObjectRef) -> Result<Self, RegistrationError> {
        let mut isa = object.isa().write();
        let current = isa.clone();

        let (subclass, original, rebind) = if current.is_synthesized() {
            let original = match current.superclass() {
                Some(original) if runtime.registry().owns(&current) => Arc::clone(original),
                _ => {
                    return Err(RegistrationError::new(
                        current.name(),
                        RegistrationFailure::ForeignSynthesizedClass,
                    ));
                }
            };
            (current, original, true)
        } else {
            let subclass = runtime.subclass_for(&current)?;
            *isa = Arc::clone(&subclass);
            (subclass, current, false)
        };
        drop(isa);

        runtime.tracer().on_object_bound(object.id(), &subclass, rebind);
        Ok(Self {
            runtime,
            object: Arc::clone(object),
            subclass,
            original,
        })
    }

    /// The bound object.
    #[must_use]
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// The override subclass the object now dispatches through.
    #[must_use]
    pub fn subclass(&self) -> &ClassRef {
        &self.subclass
    }

    /// The class the object had before it was first bound.
    #[must_use]
    pub fn original_class(&self) -> &ClassRef {
        &self.original
    }

    #[must_use]
    pub fn runtime(&self) -> &'rt Runtime<Tr> {
        self.runtime
    }

    /// Installs or replaces the override for `selector`.
    ///
    /// Takes effect for every object bound to the same subclass, including
    /// sends already in flight on other threads once they next look the
    /// selector up. Returns the override that was replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`SignatureMismatchError`] if an override for `selector` with
    /// an incompatible signature is already installed; nothing changes.
    pub fn set_method(
        &self,
        selector: Selector,
        signature: Signature,
        implementation: Implementation,
    ) -> Result<Option<Method>, SignatureMismatchError> {
        self.install(Method::new(selector, signature, implementation))
    }

    /// Installs a typed closure as the override for `selector`, deriving its
    /// signature from the closure's types.
    ///
    /// # Errors
    ///
    /// As for [`Eigen::set_method`].
    pub fn set_typed<Args, F: TypedMethod<Args>>(
        &self,
        selector: Selector,
        f: F,
    ) -> Result<Option<Method>, SignatureMismatchError> {
        self.install(Method::typed(selector, f))
    }

    /// Installs a prepared method table entry as an override.
    ///
    /// # Errors
    ///
    /// As for [`Eigen::set_method`].
    pub fn install(&self, method: Method) -> Result<Option<Method>, SignatureMismatchError> {
        let selector = method.selector().clone();
        let replaced = self.subclass.install_method(method)?;
        self.runtime
            .tracer()
            .on_method_installed(&self.subclass, &selector, replaced.is_some());
        Ok(replaced)
    }

    /// The installed override for `selector`, if any.
    #[must_use]
    pub fn override_for(&self, selector: &Selector) -> Option<Method> {
        self.subclass.lookup_own(selector)
    }

    /// Snapshot of every override installed on the subclass.
    #[must_use]
    pub fn overrides(&self) -> Arc<MethodTable> {
        self.subclass.methods()
    }

    /// The method the object would run for `selector` without overrides.
    ///
    /// Resolution starts at the original class and walks its ancestors,
    /// never consulting the override subclass, so the answer does not change
    /// when overrides are installed or replaced.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectorNotFoundError`] if no ancestor implements
    /// `selector`.
    pub fn original_method(&self, selector: &Selector) -> Result<Method, SelectorNotFoundError> {
        self.original
            .lookup(selector)
            .ok_or_else(|| SelectorNotFoundError {
                selector: selector.clone(),
                class_name: self.original.name().to_owned(),
            })
    }

    /// The implementation of [`Eigen::original_method`].
    ///
    /// # Errors
    ///
    /// As for [`Eigen::original_method`].
    pub fn original_implementation(&self, selector: &Selector) -> Result<Implementation, SelectorNotFoundError> {
        self.original_method(selector)
            .map(|method| method.implementation().clone())
    }

    /// Sends `selector` to the bound object using the original method,
    /// with the same argument and result checks as a normal send.
    pub fn call_original(&self, selector: &Selector, args: &[Value]) -> DispatchResult<Value> {
        self.original_method(selector)?.call(&self.object, args)
    }
}
