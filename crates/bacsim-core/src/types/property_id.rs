/// BACnet property identifiers used by simulated objects.
///
/// Identifiers outside this set use [`Proprietary`](Self::Proprietary); the
/// simulator still accepts them on the wire and answers reads with Null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum PropertyId {
    ActiveText,
    ApplicationSoftwareVersion,
    CovIncrement,
    CurrentCommandPriority,
    Description,
    EventState,
    FirmwareRevision,
    InactiveText,
    MaxApduLengthAccepted,
    MaxPresValue,
    MinPresValue,
    ModelName,
    NumberOfStates,
    ObjectIdentifier,
    ObjectList,
    ObjectName,
    ObjectType,
    OutOfService,
    Polarity,
    PresentValue,
    PriorityArray,
    ProtocolRevision,
    ProtocolVersion,
    Reliability,
    RelinquishDefault,
    SegmentationSupported,
    StateText,
    StatusFlags,
    SystemStatus,
    Units,
    VendorIdentifier,
    VendorName,
    Proprietary(u32),
}

impl PropertyId {
    pub const fn to_u32(self) -> u32 {
        match self {
            Self::ActiveText => 4,
            Self::ApplicationSoftwareVersion => 12,
            Self::CovIncrement => 22,
            Self::CurrentCommandPriority => 431,
            Self::Description => 28,
            Self::EventState => 36,
            Self::FirmwareRevision => 44,
            Self::InactiveText => 46,
            Self::MaxApduLengthAccepted => 62,
            Self::MaxPresValue => 65,
            Self::MinPresValue => 69,
            Self::ModelName => 70,
            Self::NumberOfStates => 74,
            Self::ObjectIdentifier => 75,
            Self::ObjectList => 76,
            Self::ObjectName => 77,
            Self::ObjectType => 79,
            Self::OutOfService => 81,
            Self::Polarity => 84,
            Self::PresentValue => 85,
            Self::PriorityArray => 87,
            Self::ProtocolRevision => 139,
            Self::ProtocolVersion => 98,
            Self::Reliability => 103,
            Self::RelinquishDefault => 104,
            Self::SegmentationSupported => 107,
            Self::StateText => 110,
            Self::StatusFlags => 111,
            Self::SystemStatus => 112,
            Self::Units => 117,
            Self::VendorIdentifier => 120,
            Self::VendorName => 121,
            Self::Proprietary(v) => v,
        }
    }

    pub const fn from_u32(value: u32) -> Self {
        match value {
            4 => Self::ActiveText,
            12 => Self::ApplicationSoftwareVersion,
            22 => Self::CovIncrement,
            431 => Self::CurrentCommandPriority,
            28 => Self::Description,
            36 => Self::EventState,
            44 => Self::FirmwareRevision,
            46 => Self::InactiveText,
            62 => Self::MaxApduLengthAccepted,
            65 => Self::MaxPresValue,
            69 => Self::MinPresValue,
            70 => Self::ModelName,
            74 => Self::NumberOfStates,
            75 => Self::ObjectIdentifier,
            76 => Self::ObjectList,
            77 => Self::ObjectName,
            79 => Self::ObjectType,
            81 => Self::OutOfService,
            84 => Self::Polarity,
            85 => Self::PresentValue,
            87 => Self::PriorityArray,
            139 => Self::ProtocolRevision,
            98 => Self::ProtocolVersion,
            103 => Self::Reliability,
            104 => Self::RelinquishDefault,
            107 => Self::SegmentationSupported,
            110 => Self::StateText,
            111 => Self::StatusFlags,
            112 => Self::SystemStatus,
            117 => Self::Units,
            120 => Self::VendorIdentifier,
            121 => Self::VendorName,
            v => Self::Proprietary(v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PropertyId;

    #[test]
    fn identifiers_roundtrip() {
        for raw in 0..512u32 {
            assert_eq!(PropertyId::from_u32(raw).to_u32(), raw);
        }
    }

    #[test]
    fn well_known_codes() {
        assert_eq!(PropertyId::PresentValue.to_u32(), 85);
        assert_eq!(PropertyId::PriorityArray.to_u32(), 87);
        assert_eq!(PropertyId::from_u32(431), PropertyId::CurrentCommandPriority);
    }
}
