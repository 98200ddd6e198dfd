#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ApduType {
    ConfirmedRequest = 0,
    UnconfirmedRequest = 1,
    SimpleAck = 2,
    ComplexAck = 3,
    SegmentAck = 4,
    Error = 5,
    Reject = 6,
    Abort = 7,
}

impl ApduType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ConfirmedRequest),
            1 => Some(Self::UnconfirmedRequest),
            2 => Some(Self::SimpleAck),
            3 => Some(Self::ComplexAck),
            4 => Some(Self::SegmentAck),
            5 => Some(Self::Error),
            6 => Some(Self::Reject),
            7 => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Confirmed services the simulator encodes or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ConfirmedServiceChoice {
    ConfirmedCovNotification = 0x01,
    SubscribeCov = 0x05,
    ReadProperty = 0x0C,
    WriteProperty = 0x0F,
}

impl ConfirmedServiceChoice {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::ConfirmedCovNotification),
            0x05 => Some(Self::SubscribeCov),
            0x0C => Some(Self::ReadProperty),
            0x0F => Some(Self::WriteProperty),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::ConfirmedCovNotification => "ConfirmedCOVNotification",
            Self::SubscribeCov => "SubscribeCOV",
            Self::ReadProperty => "ReadProperty",
            Self::WriteProperty => "WriteProperty",
        }
    }
}

/// Unconfirmed services the simulator encodes or decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UnconfirmedServiceChoice {
    IAm = 0x00,
    UnconfirmedCovNotification = 0x02,
    WhoIs = 0x08,
}

impl UnconfirmedServiceChoice {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::IAm),
            0x02 => Some(Self::UnconfirmedCovNotification),
            0x08 => Some(Self::WhoIs),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::IAm => "IAm",
            Self::UnconfirmedCovNotification => "UnconfirmedCOVNotification",
            Self::WhoIs => "WhoIs",
        }
    }
}
