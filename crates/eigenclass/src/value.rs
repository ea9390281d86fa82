//! Dynamically typed message arguments and return values.
//!
//! Every [`Value`] carries its own [`TypeEncoding`], which dispatch checks
//! against the target method's [`Signature`](crate::Signature). The
//! [`FromValue`]/[`IntoValue`] traits connect Rust types to values so typed
//! implementations can be written as plain closures.

use std::{fmt, sync::Arc};

use crate::{
    error::{DispatchError, DispatchResult},
    object::ObjectRef,
    selector::Selector,
    signature::TypeEncoding,
};

/// A message argument or return value.
#[derive(Clone)]
pub enum Value {
    /// Result of a method that returns nothing.
    Void,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Arc<str>),
    Object(ObjectRef),
    Selector(Selector),
}

impl Value {
    /// Returns the type code this value satisfies.
    #[must_use]
    pub fn encoding(&self) -> TypeEncoding {
        match self {
            Self::Void => TypeEncoding::Void,
            Self::Bool(_) => TypeEncoding::Bool,
            Self::Int(_) => TypeEncoding::Int,
            Self::Float(_) => TypeEncoding::Float,
            Self::Str(_) => TypeEncoding::Str,
            Self::Object(_) => TypeEncoding::Object,
            Self::Selector(_) => TypeEncoding::Selector,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }
}

/// Objects compare by identity, everything else by content.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Void, Self::Void) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Selector(a), Self::Selector(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("Void"),
            Self::Bool(b) => write!(f, "Bool({b})"),
            Self::Int(i) => write!(f, "Int({i})"),
            Self::Float(x) => write!(f, "Float({x})"),
            Self::Str(s) => write!(f, "Str({s:?})"),
            Self::Object(o) => write!(f, "Object(#{} {})", o.id(), o.class().name()),
            Self::Selector(s) => write!(f, "Selector({s})"),
        }
    }
}

/// Rust types with a fixed type code.
pub trait Encode {
    const ENCODING: TypeEncoding;
}

/// Rust types that can be extracted from an argument value.
pub trait FromValue: Encode + Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

/// Rust types that can be returned as a value.
pub trait IntoValue: Encode {
    fn into_value(self) -> Value;
}

/// Return types accepted from typed implementations: a plain value or a
/// `DispatchResult` of one, so typed closures can use `?`.
pub trait IntoReturn {
    const ENCODING: TypeEncoding;

    fn into_return(self) -> DispatchResult<Value>;
}

macro_rules! impl_value_type {
    ($ty:ty, $encoding:ident, |$bind:ident| $into:expr, $from:pat => $out:expr) => {
        impl Encode for $ty {
            const ENCODING: TypeEncoding = TypeEncoding::$encoding;
        }

        impl IntoValue for $ty {
            fn into_value(self) -> Value {
                let $bind = self;
                $into
            }
        }

        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    $from => Some($out),
                    _ => None,
                }
            }
        }

        impl IntoReturn for $ty {
            const ENCODING: TypeEncoding = TypeEncoding::$encoding;

            fn into_return(self) -> DispatchResult<Value> {
                Ok(self.into_value())
            }
        }

        impl IntoReturn for DispatchResult<$ty> {
            const ENCODING: TypeEncoding = TypeEncoding::$encoding;

            fn into_return(self) -> DispatchResult<Value> {
                self.map(IntoValue::into_value)
            }
        }

        impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                value.into_value()
            }
        }

        impl TryFrom<Value> for $ty {
            type Error = DispatchError;

            fn try_from(value: Value) -> Result<Self, Self::Error> {
                <$ty as FromValue>::from_value(&value).ok_or_else(|| {
                    DispatchError::raised(format!(
                        "expected {}, got {}",
                        TypeEncoding::$encoding,
                        value.encoding()
                    ))
                })
            }
        }
    };
}

impl_value_type!(bool, Bool, |b| Value::Bool(b), Value::Bool(b) => *b);
impl_value_type!(i64, Int, |i| Value::Int(i), Value::Int(i) => *i);
impl_value_type!(f64, Float, |x| Value::Float(x), Value::Float(x) => *x);
impl_value_type!(String, Str, |s| Value::Str(Arc::from(s)), Value::Str(s) => s.to_string());
impl_value_type!(Arc<str>, Str, |s| Value::Str(s), Value::Str(s) => Arc::clone(s));
impl_value_type!(ObjectRef, Object, |o| Value::Object(o), Value::Object(o) => Arc::clone(o));
impl_value_type!(Selector, Selector, |s| Value::Selector(s), Value::Selector(s) => s.clone());

impl Encode for () {
    const ENCODING: TypeEncoding = TypeEncoding::Void;
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Void
    }
}

impl IntoReturn for () {
    const ENCODING: TypeEncoding = TypeEncoding::Void;

    fn into_return(self) -> DispatchResult<Value> {
        Ok(Value::Void)
    }
}

impl IntoReturn for DispatchResult<()> {
    const ENCODING: TypeEncoding = TypeEncoding::Void;

    fn into_return(self) -> DispatchResult<Value> {
        self.map(|()| Value::Void)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Runtime;

    #[test]
    fn try_from_extracts_matching_values() {
        assert_eq!(i64::try_from(Value::Int(3)), Ok(3));
        assert_eq!(bool::try_from(Value::Bool(true)), Ok(true));
        assert_eq!(f64::try_from(Value::Float(1.5)), Ok(1.5));
        assert_eq!(String::try_from(Value::from("text")), Ok("text".to_owned()));
        assert_eq!(Arc::<str>::try_from(Value::from("text")).as_deref(), Ok("text"));
        assert_eq!(
            Selector::try_from(Value::Selector(Selector::new("area"))),
            Ok(Selector::new("area"))
        );

        let runtime = Runtime::new();
        let object = runtime.root_class().instantiate();
        let extracted = ObjectRef::try_from(Value::Object(Arc::clone(&object))).unwrap();
        assert!(Arc::ptr_eq(&extracted, &object));
    }

    #[test]
    fn try_from_reports_both_encodings_on_mismatch() {
        let err = f64::try_from(Value::from("x")).unwrap_err();
        assert_eq!(err.to_string(), "expected float, got str");
        assert_eq!(
            Selector::try_from(Value::Int(1)).unwrap_err().to_string(),
            "expected selector, got int"
        );
        assert!(ObjectRef::try_from(Value::Void).is_err());
        assert!(i64::try_from(Value::Float(1.0)).is_err());
    }
}
