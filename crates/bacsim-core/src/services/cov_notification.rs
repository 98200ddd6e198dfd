use crate::apdu::{ConfirmedServiceChoice, UnconfirmedServiceChoice};
use crate::encoding::{
    primitives::{
        decode_unsigned, encode_closing_tag, encode_ctx_object_id, encode_ctx_unsigned,
        encode_opening_tag, expect_closing_tag,
    },
    reader::Reader,
    tag::Tag,
    writer::Writer,
};
use crate::services::{
    decode_optional_ctx_unsigned, decode_required_ctx_object_id, decode_required_ctx_unsigned,
    priority_from_u32,
};
use crate::types::{ObjectId, PropertyId, TypedValue};
use crate::{DecodeError, EncodeError};
use alloc::vec::Vec;

pub const SERVICE_CONFIRMED_COV_NOTIFICATION: u8 =
    ConfirmedServiceChoice::ConfirmedCovNotification as u8;
pub const SERVICE_UNCONFIRMED_COV_NOTIFICATION: u8 =
    UnconfirmedServiceChoice::UnconfirmedCovNotification as u8;

#[derive(Debug, Clone, PartialEq)]
pub struct CovPropertyValue {
    pub property_id: PropertyId,
    pub array_index: Option<u32>,
    pub value: TypedValue,
    pub priority: Option<u8>,
}

impl CovPropertyValue {
    pub fn new(property_id: PropertyId, value: TypedValue) -> Self {
        Self {
            property_id,
            array_index: None,
            value,
            priority: None,
        }
    }
}

/// Body shared by the confirmed and unconfirmed COV notification services.
#[derive(Debug, Clone, PartialEq)]
pub struct CovNotificationRequest {
    pub subscriber_process_id: u32,
    pub initiating_device_id: ObjectId,
    pub monitored_object_id: ObjectId,
    pub time_remaining_seconds: u32,
    pub values: Vec<CovPropertyValue>,
}

impl CovNotificationRequest {
    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_ctx_unsigned(w, 0, self.subscriber_process_id)?;
        encode_ctx_object_id(w, 1, self.initiating_device_id.raw())?;
        encode_ctx_object_id(w, 2, self.monitored_object_id.raw())?;
        encode_ctx_unsigned(w, 3, self.time_remaining_seconds)?;

        encode_opening_tag(w, 4)?;
        for entry in &self.values {
            encode_ctx_unsigned(w, 0, entry.property_id.to_u32())?;
            if let Some(idx) = entry.array_index {
                encode_ctx_unsigned(w, 1, idx)?;
            }
            encode_opening_tag(w, 2)?;
            entry.value.encode(w)?;
            encode_closing_tag(w, 2)?;
            if let Some(priority) = entry.priority {
                encode_ctx_unsigned(w, 3, priority as u32)?;
            }
        }
        encode_closing_tag(w, 4)
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let subscriber_process_id = decode_required_ctx_unsigned(r, 0)?;
        let initiating_device_id = decode_required_ctx_object_id(r, 1)?;
        let monitored_object_id = decode_required_ctx_object_id(r, 2)?;
        let time_remaining_seconds = decode_required_ctx_unsigned(r, 3)?;

        if Tag::decode(r)? != (Tag::Opening { tag_num: 4 }) {
            return Err(DecodeError::InvalidTag);
        }

        let mut values = Vec::new();
        loop {
            let property_id = match Tag::decode(r)? {
                Tag::Closing { tag_num: 4 } => break,
                Tag::Context { tag_num: 0, len } => {
                    PropertyId::from_u32(decode_unsigned(r, len as usize)?)
                }
                _ => return Err(DecodeError::InvalidTag),
            };
            let array_index = decode_optional_ctx_unsigned(r, 1)?;

            if Tag::decode(r)? != (Tag::Opening { tag_num: 2 }) {
                return Err(DecodeError::InvalidTag);
            }
            let value = TypedValue::decode(r)?;
            expect_closing_tag(r, 2)?;

            let priority = decode_optional_ctx_unsigned(r, 3)?
                .map(priority_from_u32)
                .transpose()?;

            values.push(CovPropertyValue {
                property_id,
                array_index,
                value,
                priority,
            });
        }

        Ok(Self {
            subscriber_process_id,
            initiating_device_id,
            monitored_object_id,
            time_remaining_seconds,
            values,
        })
    }
}
