use crate::types::ObjectType;
use core::fmt;

/// Largest instance number representable in the 22-bit instance field.
pub const MAX_INSTANCE: u32 = 0x3F_FFFF;

/// A packed BACnet object identifier combining an [`ObjectType`] and a 22-bit
/// instance number into a single `u32`.
///
/// The upper 10 bits encode the object type and the lower 22 bits encode the
/// instance number, matching the BACnet wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(u32);

impl ObjectId {
    /// Creates an `ObjectId` from a type and instance number.
    pub const fn new(object_type: ObjectType, instance: u32) -> Self {
        Self((((object_type.to_u16() as u32) & 0x03FF) << 22) | (instance & MAX_INSTANCE))
    }

    /// Returns the raw packed `u32` representation.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Constructs an `ObjectId` from a pre-packed `u32`.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Extracts the [`ObjectType`] from the upper 10 bits.
    pub const fn object_type(self) -> ObjectType {
        ObjectType::from_u16(((self.0 >> 22) & 0x03FF) as u16)
    }

    /// Extracts the 22-bit instance number.
    pub const fn instance(self) -> u32 {
        self.0 & MAX_INSTANCE
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}:{}", self.object_type(), self.instance())
    }
}

#[cfg(test)]
mod tests {
    use super::{ObjectId, MAX_INSTANCE};
    use crate::types::ObjectType;
    use alloc::string::ToString;

    #[test]
    fn packs_type_into_high_bits() {
        let id = ObjectId::new(ObjectType::AnalogOutput, 1);
        assert_eq!(id.raw(), 0x0040_0001);
        assert_eq!(id.object_type(), ObjectType::AnalogOutput);
        assert_eq!(id.instance(), 1);
    }

    #[test]
    fn instance_is_masked_to_22_bits() {
        let id = ObjectId::new(ObjectType::Device, MAX_INSTANCE + 1);
        assert_eq!(id.instance(), 0);
        assert_eq!(id.object_type(), ObjectType::Device);
    }

    #[test]
    fn display_is_type_and_instance() {
        let id = ObjectId::new(ObjectType::BinaryValue, 12);
        assert_eq!(id.to_string(), "BinaryValue:12");
    }
}
