use bacsim_core::encoding::{reader::Reader, writer::Writer};
use bacsim_core::{DecodeError, EncodeError, ParseError};
use std::net::{Ipv4Addr, SocketAddrV4};

pub const BVLC_TYPE_BIP: u8 = 0x81;

/// Size of the fixed BVLC header: type, function and total length.
pub const BVLC_HEADER_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvlcFunction {
    Result,
    WriteBroadcastDistributionTable,
    ReadBroadcastDistributionTable,
    ReadBroadcastDistributionTableAck,
    ForwardedNpdu,
    RegisterForeignDevice,
    ReadForeignDeviceTable,
    ReadForeignDeviceTableAck,
    DeleteForeignDeviceTableEntry,
    DistributeBroadcastToNetwork,
    OriginalUnicastNpdu,
    OriginalBroadcastNpdu,
    Unknown(u8),
}

impl BvlcFunction {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0x00 => Self::Result,
            0x01 => Self::WriteBroadcastDistributionTable,
            0x02 => Self::ReadBroadcastDistributionTable,
            0x03 => Self::ReadBroadcastDistributionTableAck,
            0x04 => Self::ForwardedNpdu,
            0x05 => Self::RegisterForeignDevice,
            0x06 => Self::ReadForeignDeviceTable,
            0x07 => Self::ReadForeignDeviceTableAck,
            0x08 => Self::DeleteForeignDeviceTableEntry,
            0x09 => Self::DistributeBroadcastToNetwork,
            0x0A => Self::OriginalUnicastNpdu,
            0x0B => Self::OriginalBroadcastNpdu,
            v => Self::Unknown(v),
        }
    }

    pub const fn to_u8(self) -> u8 {
        match self {
            Self::Result => 0x00,
            Self::WriteBroadcastDistributionTable => 0x01,
            Self::ReadBroadcastDistributionTable => 0x02,
            Self::ReadBroadcastDistributionTableAck => 0x03,
            Self::ForwardedNpdu => 0x04,
            Self::RegisterForeignDevice => 0x05,
            Self::ReadForeignDeviceTable => 0x06,
            Self::ReadForeignDeviceTableAck => 0x07,
            Self::DeleteForeignDeviceTableEntry => 0x08,
            Self::DistributeBroadcastToNetwork => 0x09,
            Self::OriginalUnicastNpdu => 0x0A,
            Self::OriginalBroadcastNpdu => 0x0B,
            Self::Unknown(v) => v,
        }
    }

    /// Functions whose payload is an NPDU, possibly behind a forwarding
    /// address.
    pub const fn carries_npdu(self) -> bool {
        matches!(
            self,
            Self::OriginalUnicastNpdu
                | Self::OriginalBroadcastNpdu
                | Self::DistributeBroadcastToNetwork
                | Self::ForwardedNpdu
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvlcHeader {
    pub function: BvlcFunction,
    pub length: u16,
}

impl BvlcHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8(BVLC_TYPE_BIP)?;
        w.write_u8(self.function.to_u8())?;
        w.write_be_u16(self.length)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        if r.read_u8()? != BVLC_TYPE_BIP {
            return Err(DecodeError::InvalidValue);
        }
        let function = BvlcFunction::from_u8(r.read_u8()?);
        let length = r.read_be_u16()?;
        if (length as usize) < BVLC_HEADER_LEN {
            return Err(DecodeError::InvalidLength);
        }
        Ok(Self { function, length })
    }

    /// Writes a BVLC header followed by whatever `body` writes, then fills
    /// in the total length.
    pub fn wrap(
        function: BvlcFunction,
        w: &mut Writer<'_>,
        body: impl FnOnce(&mut Writer<'_>) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        let start = w.position();
        Self {
            function,
            length: 0,
        }
        .encode(w)?;
        body(w)?;
        let total = w.position() - start;
        let length = u16::try_from(total).map_err(|_| EncodeError::ValueOutOfRange)?;
        w.patch_be_u16(start + 2, length)
    }
}

/// A datagram split at the BVLC layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BvlcFrame<'a> {
    pub function: BvlcFunction,
    /// Original sender of a Forwarded-NPDU.
    pub forwarded_from: Option<SocketAddrV4>,
    pub npdu: &'a [u8],
}

impl<'a> BvlcFrame<'a> {
    /// Checks the marker and the length field against the datagram and
    /// hands back the NPDU bytes.
    pub fn split(datagram: &'a [u8]) -> Result<Self, ParseError> {
        let at = ParseError::at("bvlc");
        let mut r = Reader::new(datagram);
        let header = BvlcHeader::decode(&mut r).map_err(&at)?;
        if header.length as usize != datagram.len() {
            return Err(at(DecodeError::InvalidLength));
        }
        if !header.function.carries_npdu() {
            return Err(at(DecodeError::Unsupported));
        }
        let forwarded_from = if header.function == BvlcFunction::ForwardedNpdu {
            let ip = r.read_exact(4).map_err(&at)?;
            let port = r.read_be_u16().map_err(&at)?;
            Some(SocketAddrV4::new(
                Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]),
                port,
            ))
        } else {
            None
        };
        Ok(Self {
            function: header.function,
            forwarded_from,
            npdu: r.read_rest(),
        })
    }
}
