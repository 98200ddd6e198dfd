use crate::encoding::{primitives::normalize_real, tag::AppTag};
use crate::types::{ObjectId, StatusFlags};
use alloc::string::String;
use alloc::vec::Vec;

/// A property value as held by a simulated object.
///
/// The variant set is closed: these are the only application types the
/// simulator stores, reads back and writes. Any other application tag on the
/// wire is rejected with [`DecodeError::UnsupportedTag`].
///
/// Reals are held at four fractional digits; build them with
/// [`TypedValue::real`] so comparisons against decoded values hold.
///
/// [`DecodeError::UnsupportedTag`]: crate::DecodeError::UnsupportedTag
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypedValue {
    Null,
    Boolean(bool),
    UnsignedInt(u32),
    Real(f32),
    Enumerated(u32),
    CharacterString(String),
    StatusFlags(StatusFlags),
    ObjectId(ObjectId),
}

impl TypedValue {
    pub fn real(value: f32) -> Self {
        Self::Real(normalize_real(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::CharacterString(value.into())
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The application tag this value is encoded under.
    pub const fn app_tag(&self) -> AppTag {
        match self {
            Self::Null => AppTag::Null,
            Self::Boolean(_) => AppTag::Boolean,
            Self::UnsignedInt(_) => AppTag::UnsignedInt,
            Self::Real(_) => AppTag::Real,
            Self::Enumerated(_) => AppTag::Enumerated,
            Self::CharacterString(_) => AppTag::CharacterString,
            Self::StatusFlags(_) => AppTag::BitString,
            Self::ObjectId(_) => AppTag::ObjectId,
        }
    }

    pub fn as_real(&self) -> Option<f32> {
        match self {
            Self::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_unsigned(&self) -> Option<u32> {
        match self {
            Self::UnsignedInt(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_enumerated(&self) -> Option<u32> {
        match self {
            Self::Enumerated(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::CharacterString(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_status_flags(&self) -> Option<StatusFlags> {
        match self {
            Self::StatusFlags(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for TypedValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f32> for TypedValue {
    fn from(value: f32) -> Self {
        Self::real(value)
    }
}

impl From<StatusFlags> for TypedValue {
    fn from(value: StatusFlags) -> Self {
        Self::StatusFlags(value)
    }
}

impl From<ObjectId> for TypedValue {
    fn from(value: ObjectId) -> Self {
        Self::ObjectId(value)
    }
}

/// The payload of a property: one value, or a list for array properties
/// such as `priorityArray`, `stateText` and `objectList`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PropertyValue {
    Value(TypedValue),
    List(Vec<TypedValue>),
}

impl PropertyValue {
    /// The single value, or `None` for a list.
    pub fn value(&self) -> Option<&TypedValue> {
        match self {
            Self::Value(v) => Some(v),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[TypedValue]> {
        match self {
            Self::List(items) => Some(items),
            Self::Value(_) => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(TypedValue::Null))
    }

    /// Builds a payload from decoded elements; exactly one element is a
    /// plain value.
    pub fn from_values(mut values: Vec<TypedValue>) -> Self {
        if values.len() == 1 {
            if let Some(v) = values.pop() {
                return Self::Value(v);
            }
        }
        Self::List(values)
    }
}

impl Default for PropertyValue {
    fn default() -> Self {
        Self::Value(TypedValue::Null)
    }
}

impl From<TypedValue> for PropertyValue {
    fn from(value: TypedValue) -> Self {
        Self::Value(value)
    }
}

impl From<Vec<TypedValue>> for PropertyValue {
    fn from(values: Vec<TypedValue>) -> Self {
        Self::List(values)
    }
}
