use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A scalar bound as a statement parameter or read back from a row.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
}

impl Value {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I64(v) => Some(*v),
            Self::F64(v) if v.fract() == 0.0 => Some(*v as i64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => Display::fmt(v, f),
            Self::I64(v) => Display::fmt(v, f),
            Self::F64(v) => Display::fmt(v, f),
            Self::String(v) => write!(f, "'{v}'"),
        }
    }
}

macro_rules! from {
    ($t:ty => $n:ident) => {
        impl From<$t> for Value {
            #[inline]
            fn from(v: $t) -> Self {
                Self::$n(v.into())
            }
        }
    };
}

from!(bool => Bool);
from!(f32 => F64);
from!(f64 => F64);
from!(i16 => I64);
from!(i32 => I64);
from!(i64 => I64);
from!(u8 => I64);
from!(u16 => I64);
from!(u32 => I64);
from!(&str => String);
from!(String => String);

impl From<&String> for Value {
    #[inline]
    fn from(v: &String) -> Self {
        Self::String(v.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
