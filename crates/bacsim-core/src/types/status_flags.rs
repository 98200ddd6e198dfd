/// The four-bit `statusFlags` bit string.
///
/// On the wire this is an application bit string of two content bytes: the
/// unused-bit count (always 4) followed by the flags packed into bits 7..4 in
/// the order in-alarm, fault, overridden, out-of-service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusFlags {
    pub in_alarm: bool,
    pub fault: bool,
    pub overridden: bool,
    pub out_of_service: bool,
}

impl StatusFlags {
    /// Unused trailing bits in the packed byte.
    pub const UNUSED_BITS: u8 = 4;

    pub const fn to_byte(self) -> u8 {
        ((self.in_alarm as u8) << 7)
            | ((self.fault as u8) << 6)
            | ((self.overridden as u8) << 5)
            | ((self.out_of_service as u8) << 4)
    }

    pub const fn from_byte(byte: u8) -> Self {
        Self {
            in_alarm: byte & 0x80 != 0,
            fault: byte & 0x40 != 0,
            overridden: byte & 0x20 != 0,
            out_of_service: byte & 0x10 != 0,
        }
    }
}
