#![doc = include_str!("../../../README.md")]

mod class;
mod config;
mod eigen;
mod error;
mod method;
mod namespace;
mod object;
mod registry;
mod runtime;
mod selector;
mod signature;
pub mod tracer;
mod value;

pub use crate::{
    class::{Ancestors, Class, ClassBuilder, ClassId, ClassKind, ClassRef, MethodTable},
    config::{DEFAULT_SUBCLASS_PREFIX, MAX_INHERITANCE_DEPTH, ROOT_CLASS_NAME, RuntimeConfig},
    eigen::Eigen,
    error::{
        DispatchError, DispatchResult, EigenError, RegistrationError, RegistrationFailure, SelectorNotFoundError,
        SignatureMismatchError, SignatureParseError,
    },
    method::{Implementation, Method, TypedMethod},
    object::{Object, ObjectRef},
    registry::SubclassRegistry,
    runtime::{Runtime, RuntimeStats},
    selector::Selector,
    signature::{Signature, TypeEncoding},
    tracer::{EigenTracer, LogTracer, NoopTracer, RecordingTracer, TraceEvent},
    value::{Encode, FromValue, IntoReturn, IntoValue, Value},
};
