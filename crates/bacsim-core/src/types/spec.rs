/// Segmentation capability advertised during device discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Segmentation {
    SegmentedBoth = 0,
    SegmentedTransmit = 1,
    SegmentedReceive = 2,
    NoSegmentation = 3,
}

impl Segmentation {
    pub const fn to_u32(self) -> u32 {
        self as u32
    }
}

/// Encoded `max-apdu-length-accepted` field of a confirmed request header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MaxApdu {
    UpTo50 = 0,
    UpTo128 = 1,
    UpTo206 = 2,
    UpTo480 = 3,
    UpTo1024 = 4,
    UpTo1476 = 5,
}

/// Octets a simulated device accepts in one APDU; advertised in I-Am.
pub const MAX_APDU_LENGTH_ACCEPTED: u32 = 0x05C4;

/// BACnet error class reported in Error PDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorClass {
    Device = 0,
    Object = 1,
    Property = 2,
    Resources = 3,
    Security = 4,
    Services = 5,
}

impl ErrorClass {
    pub const fn to_u32(self) -> u32 {
        self as u32
    }
}

/// BACnet error code reported in Error PDUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    Other = 0,
    InvalidDataType = 9,
    UnknownObject = 31,
    UnknownProperty = 32,
    ValueOutOfRange = 37,
    WriteAccessDenied = 40,
    InvalidArrayIndex = 42,
    OptionalFunctionalityNotSupported = 45,
    PropertyIsNotAnArray = 50,
}

impl ErrorCode {
    pub const fn to_u32(self) -> u32 {
        self as u32
    }
}

/// `eventState` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventState {
    Normal,
    Fault,
    Offnormal,
    HighLimit,
    LowLimit,
    LifeSafetyAlarm,
    Other(u32),
}

impl EventState {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::Normal => 0,
            Self::Fault => 1,
            Self::Offnormal => 2,
            Self::HighLimit => 3,
            Self::LowLimit => 4,
            Self::LifeSafetyAlarm => 5,
            Self::Other(v) => v,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::Normal,
            1 => Self::Fault,
            2 => Self::Offnormal,
            3 => Self::HighLimit,
            4 => Self::LowLimit,
            5 => Self::LifeSafetyAlarm,
            v => Self::Other(v),
        }
    }
}

/// `reliability` enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    NoFaultDetected,
    NoSensor,
    OverRange,
    UnderRange,
    OpenLoop,
    ShortedLoop,
    NoOutput,
    UnreliableOther,
    ProcessError,
    CommunicationFailure,
    Other(u32),
}

impl Reliability {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::NoFaultDetected => 0,
            Self::NoSensor => 1,
            Self::OverRange => 2,
            Self::UnderRange => 3,
            Self::OpenLoop => 4,
            Self::ShortedLoop => 5,
            Self::NoOutput => 6,
            Self::UnreliableOther => 7,
            Self::ProcessError => 8,
            Self::CommunicationFailure => 12,
            Self::Other(v) => v,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            0 => Self::NoFaultDetected,
            1 => Self::NoSensor,
            2 => Self::OverRange,
            3 => Self::UnderRange,
            4 => Self::OpenLoop,
            5 => Self::ShortedLoop,
            6 => Self::NoOutput,
            7 => Self::UnreliableOther,
            8 => Self::ProcessError,
            12 => Self::CommunicationFailure,
            v => Self::Other(v),
        }
    }
}

/// `polarity` of binary objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Polarity {
    Normal = 0,
    Reverse = 1,
}

/// `presentValue` of binary objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BinaryPv {
    Inactive = 0,
    Active = 1,
}

/// `systemStatus` of the device object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceStatus {
    Operational = 0,
    OperationalReadOnly = 1,
    DownloadRequired = 2,
    DownloadInProgress = 3,
    NonOperational = 4,
}
