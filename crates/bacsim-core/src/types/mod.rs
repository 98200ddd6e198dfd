pub mod object_id;
pub mod object_type;
pub mod property_id;
pub mod spec;
pub mod status_flags;
pub mod typed_value;

pub use object_id::ObjectId;
pub use object_type::ObjectType;
pub use property_id::PropertyId;
pub use spec::{
    BinaryPv, DeviceStatus, ErrorClass, ErrorCode, EventState, MaxApdu, Polarity, Reliability,
    Segmentation, MAX_APDU_LENGTH_ACCEPTED,
};
pub use status_flags::StatusFlags;
pub use typed_value::{PropertyValue, TypedValue};
