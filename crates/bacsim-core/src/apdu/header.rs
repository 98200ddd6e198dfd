use crate::apdu::ApduType;
use crate::encoding::{reader::Reader, writer::Writer};
use crate::types::MaxApdu;
use crate::{DecodeError, EncodeError};

const SEGMENTED: u8 = 0b0000_1000;
const MORE_FOLLOWS: u8 = 0b0000_0100;
const SEGMENTED_RESPONSE_ACCEPTED: u8 = 0b0000_0010;

fn expect_type(b0: u8, expected: ApduType) -> Result<(), DecodeError> {
    if (b0 >> 4) == expected as u8 {
        Ok(())
    } else {
        Err(DecodeError::InvalidValue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedRequestHeader {
    pub segmented: bool,
    pub more_follows: bool,
    pub segmented_response_accepted: bool,
    pub max_segments: u8,
    pub max_apdu: u8,
    pub invoke_id: u8,
    pub sequence_number: Option<u8>,
    pub proposed_window_size: Option<u8>,
    pub service_choice: u8,
}

impl ConfirmedRequestHeader {
    /// An unsegmented request header accepting responses up to 1476 octets.
    pub const fn new(invoke_id: u8, service_choice: u8) -> Self {
        Self {
            segmented: false,
            more_follows: false,
            segmented_response_accepted: false,
            max_segments: 0,
            max_apdu: MaxApdu::UpTo1476 as u8,
            invoke_id,
            sequence_number: None,
            proposed_window_size: None,
            service_choice,
        }
    }

    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        let mut b0 = (ApduType::ConfirmedRequest as u8) << 4;
        if self.segmented {
            b0 |= SEGMENTED;
        }
        if self.more_follows {
            b0 |= MORE_FOLLOWS;
        }
        if self.segmented_response_accepted {
            b0 |= SEGMENTED_RESPONSE_ACCEPTED;
        }

        w.write_u8(b0)?;
        w.write_u8((self.max_segments << 4) | (self.max_apdu & 0x0f))?;
        w.write_u8(self.invoke_id)?;
        if self.segmented {
            w.write_u8(self.sequence_number.unwrap_or(0))?;
            w.write_u8(self.proposed_window_size.unwrap_or(1))?;
        }
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        expect_type(b0, ApduType::ConfirmedRequest)?;
        let segmented = (b0 & SEGMENTED) != 0;
        let seg_apdu = r.read_u8()?;
        let invoke_id = r.read_u8()?;
        let (sequence_number, proposed_window_size) = if segmented {
            (Some(r.read_u8()?), Some(r.read_u8()?))
        } else {
            (None, None)
        };
        let service_choice = r.read_u8()?;
        Ok(Self {
            segmented,
            more_follows: (b0 & MORE_FOLLOWS) != 0,
            segmented_response_accepted: (b0 & SEGMENTED_RESPONSE_ACCEPTED) != 0,
            max_segments: seg_apdu >> 4,
            max_apdu: seg_apdu & 0x0f,
            invoke_id,
            sequence_number,
            proposed_window_size,
            service_choice,
        })
    }
}

/// Header of an unsegmented Complex-ACK; segmented acks are never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplexAckHeader {
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl ComplexAckHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::ComplexAck as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let b0 = r.read_u8()?;
        expect_type(b0, ApduType::ComplexAck)?;
        if b0 & SEGMENTED != 0 {
            return Err(DecodeError::Unsupported);
        }
        Ok(Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimpleAck {
    pub invoke_id: u8,
    pub service_choice: u8,
}

impl SimpleAck {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::SimpleAck as u8) << 4)?;
        w.write_u8(self.invoke_id)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        expect_type(r.read_u8()?, ApduType::SimpleAck)?;
        Ok(Self {
            invoke_id: r.read_u8()?,
            service_choice: r.read_u8()?,
        })
    }
}

/// Header for a BACnet Unconfirmed-Request APDU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnconfirmedRequestHeader {
    pub service_choice: u8,
}

impl UnconfirmedRequestHeader {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        w.write_u8((ApduType::UnconfirmedRequest as u8) << 4)?;
        w.write_u8(self.service_choice)
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        expect_type(r.read_u8()?, ApduType::UnconfirmedRequest)?;
        Ok(Self {
            service_choice: r.read_u8()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfirmedRequestHeader, SimpleAck, UnconfirmedRequestHeader};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::DecodeError;

    #[test]
    fn confirmed_header_layout() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        ConfirmedRequestHeader::new(17, 0x0C).encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x00, 0x05, 0x11, 0x0C]);

        let mut r = Reader::new(w.as_written());
        let hdr = ConfirmedRequestHeader::decode(&mut r).unwrap();
        assert_eq!(hdr, ConfirmedRequestHeader::new(17, 0x0C));
    }

    #[test]
    fn segmented_header_carries_sequence_fields() {
        let mut r = Reader::new(&[0x0A, 0x75, 0x01, 0x00, 0x04, 0x0F]);
        let hdr = ConfirmedRequestHeader::decode(&mut r).unwrap();
        assert!(hdr.segmented);
        assert!(hdr.segmented_response_accepted);
        assert_eq!(hdr.max_segments, 7);
        assert_eq!(hdr.sequence_number, Some(0));
        assert_eq!(hdr.proposed_window_size, Some(4));
        assert_eq!(hdr.service_choice, 0x0F);
    }

    #[test]
    fn type_nibble_is_checked() {
        let mut r = Reader::new(&[0x10, 0x08]);
        assert_eq!(
            SimpleAck::decode(&mut r).unwrap_err(),
            DecodeError::InvalidValue
        );
        let mut r = Reader::new(&[0x10, 0x08]);
        assert_eq!(
            UnconfirmedRequestHeader::decode(&mut r).unwrap().service_choice,
            0x08
        );
    }
}
