use crate::bip::bvlc::{BvlcFrame, BvlcFunction, BvlcHeader};
use bacsim_core::apdu::Apdu;
use bacsim_core::encoding::writer::Writer;
use bacsim_core::npdu::Npdu;
use bacsim_core::{DecodeError, EncodeError, ParseError};
use std::net::SocketAddrV4;

/// Largest datagram the transport sends or accepts.
pub const MAX_BIP_FRAME_LEN: usize = 1600;

/// A fully decoded BACnet/IP datagram.
#[derive(Debug, Clone, PartialEq)]
pub struct BipFrame {
    pub function: BvlcFunction,
    pub forwarded_from: Option<SocketAddrV4>,
    pub npdu: Npdu,
    pub apdu: Apdu,
}

impl BipFrame {
    pub fn new(function: BvlcFunction, npdu: Npdu, apdu: Apdu) -> Self {
        Self {
            function,
            forwarded_from: None,
            npdu,
            apdu,
        }
    }

    /// Decodes all three layers. Errors carry the name of the layer or
    /// service that rejected the bytes.
    pub fn decode(datagram: &[u8]) -> Result<Self, ParseError> {
        let bvlc = BvlcFrame::split(datagram)?;
        let (npdu, apdu) = decode_message(bvlc.npdu)?;
        Ok(Self {
            function: bvlc.function,
            forwarded_from: bvlc.forwarded_from,
            npdu,
            apdu,
        })
    }

    /// Encodes the datagram into `buf` and returns its length. The BVLC
    /// length is back-patched once the inner layers are written.
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, EncodeError> {
        let mut w = Writer::new(buf);
        BvlcHeader::wrap(self.function, &mut w, |w| {
            if let Some(origin) = self.forwarded_from {
                w.write_all(&origin.ip().octets())?;
                w.write_be_u16(origin.port())?;
            }
            self.npdu.encode(w)?;
            self.apdu.encode(w)
        })?;
        Ok(w.position())
    }
}

/// Decodes the network-layer payload handed up by a [`DataLink`].
///
/// Network-layer messages carry no APDU and are reported as unsupported.
///
/// [`DataLink`]: crate::DataLink
pub fn decode_message(npdu_bytes: &[u8]) -> Result<(Npdu, Apdu), ParseError> {
    let (npdu, apdu_bytes) = Npdu::split(npdu_bytes)?;
    if npdu.is_network_message() {
        return Err(ParseError::new("npdu", DecodeError::Unsupported));
    }
    let apdu = Apdu::decode(apdu_bytes)?;
    Ok((npdu, apdu))
}

/// Encodes an NPDU and APDU into `buf`, returning the length written.
pub fn encode_message(npdu: &Npdu, apdu: &Apdu, buf: &mut [u8]) -> Result<usize, EncodeError> {
    let mut w = Writer::new(buf);
    npdu.encode(&mut w)?;
    apdu.encode(&mut w)?;
    Ok(w.position())
}
