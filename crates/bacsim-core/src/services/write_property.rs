use crate::apdu::ConfirmedServiceChoice;
use crate::encoding::{
    primitives::{
        encode_closing_tag, encode_ctx_object_id, encode_ctx_unsigned, encode_opening_tag,
        expect_closing_tag,
    },
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::{
    decode_optional_ctx_unsigned, decode_required_ctx_object_id, decode_required_ctx_unsigned,
};
use crate::types::{ObjectId, PropertyId, TypedValue};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WRITE_PROPERTY: u8 = ConfirmedServiceChoice::WriteProperty as u8;

#[derive(Debug, Clone, PartialEq)]
pub struct WritePropertyRequest {
    pub object_id: ObjectId,
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: TypedValue,
    /// Requested command priority. Range checking is left to the receiver.
    pub priority: Option<u32>,
}

impl WritePropertyRequest {
    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_object_id(w, 0, self.object_id.raw())?;
        encode_ctx_unsigned(w, 1, self.property_id.to_u32())?;
        if let Some(idx) = self.array_index {
            encode_ctx_unsigned(w, 2, idx)?;
        }

        encode_opening_tag(w, 3)?;
        self.value.encode(w)?;
        encode_closing_tag(w, 3)?;

        if let Some(priority) = self.priority {
            encode_ctx_unsigned(w, 4, priority)?;
        }
        Ok(())
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let object_id = decode_required_ctx_object_id(r, 0)?;
        let property_id = PropertyId::from_u32(decode_required_ctx_unsigned(r, 1)?);
        let array_index = decode_optional_ctx_unsigned(r, 2)?;

        if Tag::decode(r)? != (Tag::Opening { tag_num: 3 }) {
            return Err(DecodeError::InvalidTag);
        }
        let value = TypedValue::decode(r)?;
        expect_closing_tag(r, 3)?;

        let priority = decode_optional_ctx_unsigned(r, 4)?;

        Ok(Self {
            object_id,
            property_id,
            array_index,
            value,
            priority,
        })
    }
}
