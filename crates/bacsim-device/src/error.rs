use bacsim_core::types::{ErrorClass, ErrorCode, ObjectId, ObjectType, PropertyId};
use bacsim_datalink::DataLinkError;
use thiserror::Error;

/// A write rejected by an object's property store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("priority {0} is outside 1..=16")]
    InvalidPriority(u32),
    #[error("property {0:?} is not writable")]
    WriteAccessDenied(PropertyId),
    #[error("value out of range")]
    ValueOutOfRange,
    #[error("invalid data type")]
    InvalidDataType,
    #[error("invalid array index {0}")]
    InvalidArrayIndex(u32),
    #[error("property {0:?} is not an array")]
    PropertyIsNotAnArray(PropertyId),
}

impl StoreError {
    /// The error class and code reported in an Error PDU.
    pub const fn to_bacnet(self) -> (ErrorClass, ErrorCode) {
        let code = match self {
            Self::InvalidPriority(_) | Self::ValueOutOfRange => ErrorCode::ValueOutOfRange,
            Self::WriteAccessDenied(_) => ErrorCode::WriteAccessDenied,
            Self::InvalidDataType => ErrorCode::InvalidDataType,
            Self::InvalidArrayIndex(_) => ErrorCode::InvalidArrayIndex,
            Self::PropertyIsNotAnArray(_) => ErrorCode::PropertyIsNotAnArray,
        };
        (ErrorClass::Property, code)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("object type {0:?} cannot be simulated")]
    UnsupportedObjectType(ObjectType),
    #[error("instance {0} does not fit in 22 bits")]
    InvalidInstance(u32),
    #[error("object {0} is defined twice")]
    DuplicateObject(ObjectId),
    #[error("state text table '{0}' is not defined")]
    UnknownStateText(String),
}

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("datalink error: {0}")]
    DataLink(#[from] DataLinkError),
    #[error("encode error: {0}")]
    Encode(#[from] bacsim_core::EncodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
}
