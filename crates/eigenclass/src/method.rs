//! Method implementations and the typed adapters that build them.
//!
//! An [`Implementation`] is the runtime's function pointer: a shared callable
//! receiving the receiver, the selector it was invoked for and the explicit
//! arguments. Identity is pointer identity, so two handles to the same
//! implementation compare equal no matter how they were obtained.
//!
//! Most implementations are written as typed closures instead:
//!
//! ```
//! use eigenclass::{Method, ObjectRef, Selector};
//!
//! let scale = Method::typed(Selector::new("scale:"), |_this: &ObjectRef, factor: i64| factor * 10);
//! assert_eq!(scale.signature().to_string(), "q@:q");
//! ```
//!
//! [`TypedMethod`] derives the [`Signature`] from the closure's argument and
//! return types and wraps the closure in an adapter that unpacks arguments.

use std::{fmt, sync::Arc};

use crate::{
    error::{DispatchError, DispatchResult},
    object::ObjectRef,
    selector::Selector,
    signature::{Signature, TypeEncoding},
    value::{FromValue, IntoReturn, Value},
};

type RawImplementation = dyn Fn(&ObjectRef, &Selector, &[Value]) -> DispatchResult<Value> + Send + Sync;

/// A callable method body.
#[derive(Clone)]
pub struct Implementation(Arc<RawImplementation>);

impl Implementation {
    /// Wraps an untyped implementation.
    ///
    /// The closure receives the receiver, the selector being dispatched and
    /// the explicit arguments. Argument counts and types have already been
    /// checked against the method's signature when it is reached through
    /// [`Object::send`](crate::Object::send), but not when invoked directly.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ObjectRef, &Selector, &[Value]) -> DispatchResult<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Calls the implementation directly, bypassing dispatch.
    ///
    /// This is how an override delegates to the original implementation.
    pub fn invoke(&self, receiver: &ObjectRef, selector: &Selector, args: &[Value]) -> DispatchResult<Value> {
        (self.0)(receiver, selector, args)
    }

    /// Whether both handles point at the same implementation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.0), Arc::as_ptr(&other.0))
    }

    /// Address of the implementation, stable for its lifetime.
    #[must_use]
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for Implementation {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Implementation {}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Implementation({:#x})", self.addr())
    }
}

/// A method table entry: selector, signature and implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    selector: Selector,
    signature: Signature,
    implementation: Implementation,
}

impl Method {
    #[must_use]
    pub fn new(selector: Selector, signature: Signature, implementation: Implementation) -> Self {
        Self {
            selector,
            signature,
            implementation,
        }
    }

    /// Builds a method from a typed closure, deriving its signature.
    #[must_use]
    pub fn typed<Args, F: TypedMethod<Args>>(selector: Selector, f: F) -> Self {
        let (signature, implementation) = f.into_parts();
        Self::new(selector, signature, implementation)
    }

    #[must_use]
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[must_use]
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// Checks `args` against the signature, invokes the implementation and
    /// checks the returned value.
    pub fn call(&self, receiver: &ObjectRef, args: &[Value]) -> DispatchResult<Value> {
        let params = self.signature.params();
        if params.len() != args.len() {
            return Err(DispatchError::ArgumentCount {
                selector: self.selector.clone(),
                expected: params.len(),
                given: args.len(),
            });
        }
        for (position, (expected, arg)) in params.iter().zip(args).enumerate() {
            if arg.encoding() != *expected {
                return Err(DispatchError::ArgumentType {
                    selector: self.selector.clone(),
                    position,
                    expected: *expected,
                    given: arg.encoding(),
                });
            }
        }

        let result = self.implementation.invoke(receiver, &self.selector, args)?;
        if result.encoding() != self.signature.ret() {
            return Err(DispatchError::ReturnType {
                selector: self.selector.clone(),
                expected: self.signature.ret(),
                given: result.encoding(),
            });
        }
        Ok(result)
    }
}

/// Closures usable as typed method implementations.
///
/// Implemented for `Fn(&ObjectRef, A1, .., An) -> R` with up to three
/// arguments, where every `Ai: FromValue` and `R: IntoReturn`. `Args` is a
/// marker tuple of the argument types and is always inferred.
pub trait TypedMethod<Args>: Send + Sync + 'static {
    /// The signature implied by the closure's types.
    fn signature() -> Signature;

    /// Splits the closure into its signature and an untyped implementation.
    fn into_parts(self) -> (Signature, Implementation);
}

/// Extracts argument `position`, reporting a typed mismatch.
fn typed_arg<T: FromValue>(selector: &Selector, args: &[Value], position: usize) -> DispatchResult<T> {
    let value = args.get(position).ok_or_else(|| DispatchError::ArgumentCount {
        selector: selector.clone(),
        expected: position + 1,
        given: args.len(),
    })?;
    T::from_value(value).ok_or_else(|| DispatchError::ArgumentType {
        selector: selector.clone(),
        position,
        expected: T::ENCODING,
        given: value.encoding(),
    })
}

macro_rules! impl_typed_method {
    ($($arg:ident $position:literal),*) => {
        impl<F, R, $($arg,)*> TypedMethod<($($arg,)*)> for F
        where
            F: Fn(&ObjectRef, $($arg),*) -> R + Send + Sync + 'static,
            R: IntoReturn + 'static,
            $($arg: FromValue + 'static,)*
        {
            fn signature() -> Signature {
                let params: &[TypeEncoding] = &[$($arg::ENCODING),*];
                Signature::new(R::ENCODING, params.iter().copied())
            }

            fn into_parts(self) -> (Signature, Implementation) {
                let signature = Self::signature();
                let arity = signature.arity();
                let f = self;
                let implementation = Implementation::new(move |this, selector, args| {
                    if args.len() != arity {
                        return Err(DispatchError::ArgumentCount {
                            selector: selector.clone(),
                            expected: arity,
                            given: args.len(),
                        });
                    }
                    f(this, $(typed_arg::<$arg>(selector, args, $position)?),*).into_return()
                });
                (signature, implementation)
            }
        }
    };
}

impl_typed_method!();
impl_typed_method!(A1 0);
impl_typed_method!(A1 0, A2 1);
impl_typed_method!(A1 0, A2 1, A3 2);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Runtime;

    #[test]
    fn typed_signature_follows_closure_types() {
        let method = Method::typed(Selector::new("repeat:unit:"), |_: &ObjectRef, count: i64, unit: f64| {
            if count > 0 { unit } else { 0.0 }
        });
        assert_eq!(method.signature().to_string(), "d@:qd");
    }

    #[test]
    fn void_closures_return_void() {
        let method = Method::typed(Selector::new("touch"), |_: &ObjectRef| ());
        assert_eq!(method.signature().ret(), TypeEncoding::Void);
    }

    #[test]
    fn clones_share_identity() {
        let imp = Implementation::new(|_, _, _| Ok(Value::Void));
        let other = Implementation::new(|_, _, _| Ok(Value::Void));
        assert_eq!(imp, imp.clone());
        assert_ne!(imp, other);
    }

    #[test]
    fn typed_adapter_rejects_wrong_argument_type_on_direct_invoke() {
        let runtime = Runtime::new();
        let object = runtime.root_class().instantiate();
        let method = Method::typed(Selector::new("double:"), |_: &ObjectRef, x: i64| x * 2);
        let err = method
            .implementation()
            .invoke(&object, method.selector(), &[Value::from("nope")])
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::ArgumentType {
                selector: Selector::new("double:"),
                position: 0,
                expected: TypeEncoding::Int,
                given: TypeEncoding::Str,
            }
        );
    }

    #[test]
    fn call_checks_argument_count() {
        let runtime = Runtime::new();
        let object = runtime.root_class().instantiate();
        let method = Method::typed(Selector::new("double:"), |_: &ObjectRef, x: i64| x * 2);
        assert_eq!(method.call(&object, &[Value::Int(4)]), Ok(Value::Int(8)));
        assert!(matches!(
            method.call(&object, &[]),
            Err(DispatchError::ArgumentCount {
                expected: 1,
                given: 0,
                ..
            })
        ));
    }

    #[test]
    fn call_checks_return_type_of_untyped_implementations() {
        let runtime = Runtime::new();
        let object = runtime.root_class().instantiate();
        let method = Method::new(
            Selector::new("count"),
            Signature::parse("q@:").unwrap(),
            Implementation::new(|_, _, _| Ok(Value::from("seven"))),
        );
        assert!(matches!(
            method.call(&object, &[]),
            Err(DispatchError::ReturnType {
                expected: TypeEncoding::Int,
                given: TypeEncoding::Str,
                ..
            })
        ));
    }
}
