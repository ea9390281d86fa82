//! Method signatures as type-encoding strings.
//!
//! A signature is written the way the runtime's method tables print it: the
//! return type code, then the implicit receiver (`@`) and selector (`:`)
//! markers, then one code per explicit argument.
//!
//! | Code | Type |
//! |------|------|
//! | `v` | void (return only) |
//! | `B` | bool |
//! | `q` | 64-bit signed integer |
//! | `d` | 64-bit float |
//! | `*` | string |
//! | `@` | object |
//! | `:` | selector |
//!
//! So `"q@:"` is a no-argument method returning an integer, and `"v@:q@"`
//! returns nothing and takes an integer and an object.

use std::{fmt, str::FromStr};

use smallvec::SmallVec;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use crate::error::SignatureParseError;

/// A single type code in a signature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum TypeEncoding {
    Void,
    Bool,
    Int,
    Float,
    Str,
    Object,
    Selector,
}

impl TypeEncoding {
    /// Returns the single-character code used in encoding strings.
    #[must_use]
    pub fn code(self) -> char {
        match self {
            Self::Void => 'v',
            Self::Bool => 'B',
            Self::Int => 'q',
            Self::Float => 'd',
            Self::Str => '*',
            Self::Object => '@',
            Self::Selector => ':',
        }
    }

    /// Looks up the encoding for a type code.
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        Self::iter().find(|encoding| encoding.code() == code)
    }
}

impl fmt::Display for TypeEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name: &'static str = (*self).into();
        f.write_str(name)
    }
}

/// Argument and return shape of a method.
///
/// The receiver and selector are implicit and not stored in `params`.
/// Serializes as its encoding string and is validated on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Signature {
    ret: TypeEncoding,
    params: SmallVec<[TypeEncoding; 4]>,
}

impl Signature {
    /// Builds a signature from a return type and explicit argument types.
    ///
    /// # Panics
    /// Panics if any argument is `TypeEncoding::Void`; use [`Signature::parse`]
    /// for untrusted input.
    #[must_use]
    pub fn new(ret: TypeEncoding, params: impl IntoIterator<Item = TypeEncoding>) -> Self {
        let params: SmallVec<[TypeEncoding; 4]> = params.into_iter().collect();
        assert!(
            !params.contains(&TypeEncoding::Void),
            "void is not a valid argument type"
        );
        Self { ret, params }
    }

    /// Parses a type-encoding string such as `"q@:q"`.
    pub fn parse(encoding: &str) -> Result<Self, SignatureParseError> {
        let mut chars = encoding.chars().enumerate();
        let (_, ret_code) = chars.next().ok_or(SignatureParseError::Empty)?;
        let ret = TypeEncoding::from_code(ret_code).ok_or(SignatureParseError::UnknownCode {
            code: ret_code,
            position: 0,
        })?;

        let receiver = chars.next().map(|(_, c)| c);
        let selector = chars.next().map(|(_, c)| c);
        if receiver != Some('@') || selector != Some(':') {
            return Err(SignatureParseError::MissingReceiver {
                encoding: encoding.to_owned(),
            });
        }

        let mut params = SmallVec::new();
        for (position, code) in chars {
            match TypeEncoding::from_code(code) {
                Some(TypeEncoding::Void) => return Err(SignatureParseError::VoidArgument { position }),
                Some(param) => params.push(param),
                None => return Err(SignatureParseError::UnknownCode { code, position }),
            }
        }
        Ok(Self { ret, params })
    }

    /// Return type.
    #[must_use]
    pub fn ret(&self) -> TypeEncoding {
        self.ret
    }

    /// Explicit argument types, excluding the receiver and selector.
    #[must_use]
    pub fn params(&self) -> &[TypeEncoding] {
        &self.params
    }

    /// Number of explicit arguments.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Whether a call built for `other` can safely use this signature.
    ///
    /// Compatibility is structural: the same return type and the same
    /// argument types in the same order.
    #[must_use]
    pub fn is_compatible_with(&self, other: &Self) -> bool {
        self.ret == other.ret && self.params == other.params
    }
}

impl FromStr for Signature {
    type Err = SignatureParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Signature {
    type Error = SignatureParseError;

    fn try_from(encoding: String) -> Result<Self, Self::Error> {
        Self::parse(&encoding)
    }
}

impl From<Signature> for String {
    fn from(signature: Signature) -> Self {
        signature.to_string()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@:", self.ret.code())?;
        for param in &self.params {
            write!(f, "{}", param.code())?;
        }
        Ok(())
    }
}
