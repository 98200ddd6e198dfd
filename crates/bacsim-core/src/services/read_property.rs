use crate::apdu::ConfirmedServiceChoice;
use crate::encoding::{
    primitives::{encode_closing_tag, encode_ctx_object_id, encode_ctx_unsigned, encode_opening_tag},
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::value_codec::decode_values_until_closing;
use crate::services::{
    decode_optional_ctx_unsigned, decode_required_ctx_object_id, decode_required_ctx_unsigned,
};
use crate::types::{ObjectId, PropertyId, PropertyValue};
use crate::{DecodeError, EncodeError};

pub const SERVICE_READ_PROPERTY: u8 = ConfirmedServiceChoice::ReadProperty as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadPropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
}

impl ReadPropertyRequest {
    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(idx) = self.array_index {
            encode_ctx_unsigned(w, 2, idx)?;
        }
        Ok(())
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = decode_required_ctx_object_id(r, 0)?;
        let property_id = PropertyId::from_u32(decode_required_ctx_unsigned(r, 1)?);
        let array_index = decode_optional_ctx_unsigned(r, 2)?;
        Ok(Self {
            object_id,
            property_id,
            array_index,
        })
    }
}

/// Complex-ack payload answering a ReadProperty request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadPropertyAck {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: PropertyValue,
}

impl ReadPropertyAck {
    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(idx) = self.array_index {
            encode_ctx_unsigned(w, 2, idx)?;
        }
        encode_opening_tag(w, 3)?;
        self.value.encode(w)?;
        encode_closing_tag(w, 3)
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = decode_required_ctx_object_id(r, 0)?;
        let property_id = PropertyId::from_u32(decode_required_ctx_unsigned(r, 1)?);
        let array_index = decode_optional_ctx_unsigned(r, 2)?;

        if Tag::decode(r)? != (Tag::Opening { tag_num: 3 }) {
            return Err(DecodeError::InvalidTag);
        }
        let values = decode_values_until_closing(r, 3)?;

        Ok(Self {
            object_id,
            property_id,
            array_index,
            value: PropertyValue::from_values(values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{ReadPropertyAck, ReadPropertyRequest};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::types::{ObjectId, ObjectType, PropertyId, PropertyValue, TypedValue};
    use crate::DecodeError;
    use alloc::vec;

    #[test]
    fn request_with_array_index() {
        let req = ReadPropertyRequest {
            object_id: ObjectId::new(ObjectType::AnalogOutput, 1),
            property_id: PropertyId::PriorityArray,
            array_index: Some(8),
        };
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        req.encode_after_header(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x0C, 0x00, 0x40, 0x00, 0x01, 0x19, 0x57, 0x29, 0x08]
        );

        let mut r = Reader::new(w.as_written());
        assert_eq!(ReadPropertyRequest::decode_after_header(&mut r).unwrap(), req);
    }

    #[test]
    fn request_without_property_is_invalid() {
        let mut r = Reader::new(&[0x0C, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(
            ReadPropertyRequest::decode_after_header(&mut r).unwrap_err(),
            DecodeError::UnexpectedEof
        );
    }

    #[test]
    fn ack_carries_list_payloads() {
        let ack = ReadPropertyAck {
            object_id: ObjectId::new(ObjectType::MultiStateValue, 4),
            property_id: PropertyId::StateText,
            array_index: None,
            value: PropertyValue::List(vec![
                TypedValue::string("Off"),
                TypedValue::string("Auto"),
                TypedValue::string("On"),
            ]),
        };
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        ack.encode_after_header(&mut w).unwrap();

        let mut r = Reader::new(w.as_written());
        assert_eq!(ReadPropertyAck::decode_after_header(&mut r).unwrap(), ack);
        assert!(r.is_empty());
    }

    #[test]
    fn ack_with_single_real() {
        let ack = ReadPropertyAck {
            object_id: ObjectId::new(ObjectType::AnalogInput, 0),
            property_id: PropertyId::PresentValue,
            array_index: None,
            value: TypedValue::real(22.5).into(),
        };
        let mut buf = [0u8; 32];
        let mut w = Writer::new(&mut buf);
        ack.encode_after_header(&mut w).unwrap();
        assert_eq!(
            w.as_written(),
            &[0x0C, 0x00, 0x00, 0x00, 0x00, 0x19, 0x55, 0x3E, 0x44, 0x41, 0xB4, 0x00, 0x00, 0x3F]
        );
    }
}
