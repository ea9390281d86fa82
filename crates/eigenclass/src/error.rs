//! Error types for class registration, override installation and dispatch.
//!
//! Each failure category gets its own type so callers can match on exactly
//! the failure an operation can produce: binding only fails with
//! [`RegistrationError`], override installation only with
//! [`SignatureMismatchError`], and call-through lookup only with
//! [`SelectorNotFoundError`]. [`EigenError`] unifies them for callers that
//! chain several operations with `?`.

use thiserror::Error;

use crate::{
    selector::Selector,
    signature::{Signature, TypeEncoding},
};

/// The runtime refused to create or register a class.
///
/// Raised while synthesizing an override subclass, this is fatal for the
/// original class involved: the registry records it and every later request
/// for that class returns the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot register class `{class_name}`: {reason}")]
pub struct RegistrationError {
    /// Name of the class that could not be registered.
    pub class_name: String,
    /// Why the runtime rejected it.
    pub reason: RegistrationFailure,
}

impl RegistrationError {
    pub(crate) fn new(class_name: impl Into<String>, reason: RegistrationFailure) -> Self {
        Self {
            class_name: class_name.into(),
            reason,
        }
    }
}

/// Reason attached to a [`RegistrationError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationFailure {
    /// Another class with a different shape already owns the name.
    #[error("the name is already taken by another class")]
    NameTaken,
    /// Class names must be non-empty.
    #[error("class name must not be empty")]
    EmptyName,
    /// The object is already bound to an override subclass created by another runtime.
    #[error("the class was synthesized by a different runtime")]
    ForeignSynthesizedClass,
    /// Override subclasses cannot be inherited from.
    #[error("superclass `{superclass}` is an override subclass")]
    SynthesizedSuperclass { superclass: String },
    /// The class would exceed the configured inheritance depth.
    #[error("inheritance chain too deep (maximum depth {limit})")]
    InheritanceTooDeep { limit: usize },
    /// The registry already holds the configured maximum number of override subclasses.
    #[error("synthesized subclass limit reached ({limit})")]
    SubclassLimit { limit: usize },
}

/// A method was installed with a signature that conflicts with the entry
/// already present for the same selector on the same class.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("signature `{requested}` for `{selector}` conflicts with installed signature `{existing}`")]
pub struct SignatureMismatchError {
    pub selector: Selector,
    pub existing: Signature,
    pub requested: Signature,
}

/// No class in the searched ancestor chain implements the selector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no ancestor of `{class_name}` implements `{selector}`")]
pub struct SelectorNotFoundError {
    pub selector: Selector,
    /// Class the search started from.
    pub class_name: String,
}

/// A type encoding string could not be parsed into a [`Signature`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureParseError {
    #[error("type encoding is empty")]
    Empty,
    /// The return type must be followed by the `@:` receiver and selector markers.
    #[error("type encoding `{encoding}` is missing the `@:` receiver prefix")]
    MissingReceiver { encoding: String },
    #[error("unknown type code `{code}` at position {position}")]
    UnknownCode { code: char, position: usize },
    #[error("`v` is only valid as a return type (position {position})")]
    VoidArgument { position: usize },
}

/// Failure while sending a message to an object.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DispatchError {
    /// Neither the object's class nor any ancestor implements the selector.
    #[error("`{class_name}` does not respond to `{selector}`")]
    UnrecognizedSelector { class_name: String, selector: Selector },
    #[error("`{selector}` takes {expected} argument(s) but {given} were given")]
    ArgumentCount {
        selector: Selector,
        expected: usize,
        given: usize,
    },
    #[error("argument {position} of `{selector}` must be {expected}, got {given}")]
    ArgumentType {
        selector: Selector,
        position: usize,
        expected: TypeEncoding,
        given: TypeEncoding,
    },
    #[error("`{selector}` must return {expected}, got {given}")]
    ReturnType {
        selector: Selector,
        expected: TypeEncoding,
        given: TypeEncoding,
    },
    /// An implementation reported a failure of its own.
    #[error("{0}")]
    Raised(String),
    /// Call-through from an override found no original implementation.
    #[error(transparent)]
    NotFound(#[from] SelectorNotFoundError),
}

impl DispatchError {
    /// Creates an implementation-reported failure.
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }
}

/// Result type for message dispatch and method implementations.
pub type DispatchResult<T> = Result<T, DispatchError>;

/// Umbrella error covering every failure the crate reports.
///
/// Keeping the categories distinct lets callers react to a rejected
/// registration differently from a bad signature without string matching.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EigenError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatchError),
    #[error(transparent)]
    SelectorNotFound(#[from] SelectorNotFoundError),
    #[error(transparent)]
    SignatureParse(#[from] SignatureParseError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}
