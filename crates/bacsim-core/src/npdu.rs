use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError, ParseError};

/// BACnet network layer protocol version (always `0x01`).
pub const NPDU_VERSION: u8 = 0x01;

/// Hop count written on every NPDU that names a destination.
pub const DEFAULT_HOP_COUNT: u8 = 255;

const NETWORK_MESSAGE: u8 = 0x80;
const DEST_SPECIFIER: u8 = 0x20;
const SOURCE_SPECIFIER: u8 = 0x08;
const EXPECTING_REPLY: u8 = 0x04;
const PRIORITY_MASK: u8 = 0x03;

/// A network-layer address consisting of a network number and a MAC address.
///
/// A zero-length MAC with network `0xFFFF` is the global broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpduAddress {
    /// The DNET/SNET network number.
    pub network: u16,
    /// MAC address bytes (up to 6).
    pub mac: [u8; 6],
    /// Number of valid bytes in `mac`.
    pub mac_len: u8,
}

impl NpduAddress {
    pub const GLOBAL_BROADCAST: Self = Self {
        network: 0xFFFF,
        mac: [0; 6],
        mac_len: 0,
    };

    pub fn new(network: u16, mac: &[u8]) -> Result<Self, EncodeError> {
        if mac.len() > 6 {
            return Err(EncodeError::InvalidLength);
        }
        let mut buf = [0u8; 6];
        buf[..mac.len()].copy_from_slice(mac);
        Ok(Self {
            network,
            mac: buf,
            mac_len: mac.len() as u8,
        })
    }

    pub fn mac(&self) -> &[u8] {
        &self.mac[..(self.mac_len as usize).min(6)]
    }
}

/// BACnet Network Protocol Data Unit (NPDU) header.
///
/// The destination and source specifier bits of `control` always follow the
/// presence of `destination` and `source` when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Npdu {
    pub control: u8,
    pub destination: Option<NpduAddress>,
    pub source: Option<NpduAddress>,
    pub hop_count: Option<u8>,
    pub message_type: Option<u8>,
    pub vendor_id: Option<u16>,
}

impl Npdu {
    pub const fn new(control: u8) -> Self {
        Self {
            control,
            destination: None,
            source: None,
            hop_count: None,
            message_type: None,
            vendor_id: None,
        }
    }

    /// Header for an application message on the local network.
    pub const fn local(expecting_reply: bool) -> Self {
        Self::new(if expecting_reply { EXPECTING_REPLY } else { 0 })
    }

    /// Header for a global broadcast, e.g. an I-Am announcement.
    pub const fn global_broadcast() -> Self {
        Self {
            destination: Some(NpduAddress::GLOBAL_BROADCAST),
            hop_count: Some(DEFAULT_HOP_COUNT),
            ..Self::new(DEST_SPECIFIER)
        }
    }

    /// Header for a reply to `request`. When the request came from a remote
    /// network the reply is addressed back to that network and MAC.
    pub fn reply_to(request: &Npdu) -> Self {
        match request.source {
            Some(source) => Self {
                destination: Some(source),
                hop_count: Some(DEFAULT_HOP_COUNT),
                ..Self::new(DEST_SPECIFIER | (request.control & PRIORITY_MASK))
            },
            None => Self::new(request.control & PRIORITY_MASK),
        }
    }

    /// Sets or clears the expecting-reply bit, e.g. for confirmed requests
    /// sent with a reply header.
    pub const fn with_expecting_reply(mut self, expecting_reply: bool) -> Self {
        if expecting_reply {
            self.control |= EXPECTING_REPLY;
        } else {
            self.control &= !EXPECTING_REPLY;
        }
        self
    }

    pub const fn dest_specifier(&self) -> bool {
        self.control & DEST_SPECIFIER != 0
    }

    pub const fn source_specifier(&self) -> bool {
        self.control & SOURCE_SPECIFIER != 0
    }

    pub const fn expecting_reply(&self) -> bool {
        self.control & EXPECTING_REPLY != 0
    }

    pub const fn is_network_message(&self) -> bool {
        self.control & NETWORK_MESSAGE != 0
    }

    pub const fn priority(&self) -> u8 {
        self.control & PRIORITY_MASK
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut control = self.control & !(DEST_SPECIFIER | SOURCE_SPECIFIER);
        if self.destination.is_some() {
            control |= DEST_SPECIFIER;
        }
        if self.source.is_some() {
            control |= SOURCE_SPECIFIER;
        }
        w.write_u8(NPDU_VERSION)?;
        w.write_u8(control)?;

        if let Some(dest) = self.destination {
            encode_addr(w, dest)?;
        }
        if let Some(src) = self.source {
            encode_addr(w, src)?;
        }
        if self.destination.is_some() {
            w.write_u8(self.hop_count.unwrap_or(DEFAULT_HOP_COUNT))?;
        }
        if (control & NETWORK_MESSAGE) != 0 {
            w.write_u8(self.message_type.unwrap_or(0))?;
            if matches!(self.message_type, Some(0x80..=0xFF)) {
                w.write_be_u16(self.vendor_id.unwrap_or(0))?;
            }
        }
        Ok(())
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let version = r.read_u8()?;
        if version != NPDU_VERSION {
            return Err(DecodeError::InvalidValue);
        }

        let control = r.read_u8()?;
        let has_dest = (control & DEST_SPECIFIER) != 0;
        let has_src = (control & SOURCE_SPECIFIER) != 0;

        let destination = if has_dest {
            Some(decode_addr(r)?)
        } else {
            None
        };
        let source = if has_src { Some(decode_addr(r)?) } else { None };
        let hop_count = if has_dest { Some(r.read_u8()?) } else { None };

        let (message_type, vendor_id) = if (control & NETWORK_MESSAGE) != 0 {
            let mt = r.read_u8()?;
            let vid = if mt >= 0x80 {
                Some(r.read_be_u16()?)
            } else {
                None
            };
            (Some(mt), vid)
        } else {
            (None, None)
        };

        Ok(Self {
            control,
            destination,
            source,
            hop_count,
            message_type,
            vendor_id,
        })
    }

    /// Splits a network-layer payload into its header and the APDU bytes.
    pub fn split(bytes: &[u8]) -> Result<(Self, &[u8]), ParseError> {
        let mut r = Reader::new(bytes);
        let npdu = Self::decode(&mut r).map_err(ParseError::at("npdu"))?;
        Ok((npdu, r.read_rest()))
    }
}

fn encode_addr(w: &mut Writer<'_>, addr: NpduAddress) -> Result<(), EncodeError> {
    if addr.mac_len as usize > addr.mac.len() {
        return Err(EncodeError::InvalidLength);
    }
    w.write_be_u16(addr.network)?;
    w.write_u8(addr.mac_len)?;
    w.write_all(&addr.mac[..addr.mac_len as usize])
}

fn decode_addr(r: &mut Reader<'_>) -> Result<NpduAddress, DecodeError> {
    let network = r.read_be_u16()?;
    let mac_len = r.read_u8()?;
    if mac_len as usize > 6 {
        return Err(DecodeError::InvalidLength);
    }
    let mut mac = [0u8; 6];
    let src = r.read_exact(mac_len as usize)?;
    mac[..mac_len as usize].copy_from_slice(src);
    Ok(NpduAddress {
        network,
        mac,
        mac_len,
    })
}

#[cfg(test)]
mod tests {
    use super::{Npdu, NpduAddress};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::{DecodeError, ParseError};

    #[test]
    fn broadcast_from_remote_network() {
        let bytes = [
            0x01, 0x28, 0xFF, 0xFF, 0x00, 0x00, 0x01, 0x01, 0x7F, 0xFF, 0x10, 0x08,
        ];
        let (npdu, apdu) = Npdu::split(&bytes).unwrap();
        assert!(npdu.dest_specifier());
        assert!(npdu.source_specifier());
        assert!(!npdu.expecting_reply());
        assert_eq!(npdu.destination, Some(NpduAddress::GLOBAL_BROADCAST));
        assert_eq!(npdu.source.unwrap().mac(), &[0x7F]);
        assert_eq!(npdu.hop_count, Some(255));
        assert_eq!(apdu, &[0x10, 0x08]);
    }

    #[test]
    fn reply_is_addressed_to_the_source_network() {
        let mut request = Npdu::local(true);
        request.source = Some(NpduAddress::new(5, &[0x21]).unwrap());
        request.control |= 0x08;

        let reply = Npdu::reply_to(&request);
        assert_eq!(reply.destination, request.source);
        assert_eq!(reply.source, None);
        assert!(!reply.expecting_reply());

        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        reply.encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x01, 0x20, 0x00, 0x05, 0x01, 0x21, 0xFF]);

        assert_eq!(Npdu::reply_to(&Npdu::local(true)), Npdu::local(false));
        assert!(reply.with_expecting_reply(true).expecting_reply());
        assert_eq!(reply.with_expecting_reply(true).destination, request.source);
    }

    #[test]
    fn specifier_bits_follow_addresses() {
        let mut p = Npdu::new(0x00);
        p.destination = Some(NpduAddress::new(1, &[192, 168, 1, 2, 0xBA, 0xC0]).unwrap());

        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        p.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        let dec = Npdu::decode(&mut r).unwrap();
        assert!(dec.dest_specifier());
        assert_eq!(dec.hop_count, Some(255));
        assert_eq!(dec.destination.unwrap().network, 1);
    }

    #[test]
    fn network_message_vendor_id_only_for_vendor_types() {
        let mut p = Npdu::new(0x80);
        p.message_type = Some(0x80);
        p.vendor_id = Some(260);

        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        p.encode(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        let dec = Npdu::decode(&mut r).unwrap();
        assert!(dec.is_network_message());
        assert_eq!(dec.vendor_id, Some(260));
    }

    #[test]
    fn wrong_version_names_the_layer() {
        assert_eq!(
            Npdu::split(&[0x02, 0x00]).unwrap_err(),
            ParseError::new("npdu", DecodeError::InvalidValue)
        );
    }
}
