use crate::apdu::UnconfirmedServiceChoice;
use crate::encoding::{
    primitives::{
        decode_app_enumerated, decode_app_object_id, decode_app_unsigned, encode_app_enumerated,
        encode_app_object_id, encode_app_unsigned,
    },
    reader::Reader,
    writer::Writer,
};
use crate::types::{ObjectId, ObjectType, Segmentation, MAX_APDU_LENGTH_ACCEPTED};
use crate::{DecodeError, EncodeError};

pub const SERVICE_I_AM: u8 = UnconfirmedServiceChoice::IAm as u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IAmRequest {
    pub device_id: ObjectId,
    pub max_apdu: u32,
    pub segmentation: u32,
    pub vendor_id: u32,
}

impl IAmRequest {
    /// The announcement a simulated device sends: 1476-octet APDUs and no
    /// segmentation.
    pub const fn for_device(instance: u32, vendor_id: u32) -> Self {
        Self {
            device_id: ObjectId::new(ObjectType::Device, instance),
            max_apdu: MAX_APDU_LENGTH_ACCEPTED,
            segmentation: Segmentation::NoSegmentation.to_u32(),
            vendor_id,
        }
    }

    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        encode_app_object_id(w, self.device_id.raw())?;
        encode_app_unsigned(w, self.max_apdu)?;
        encode_app_enumerated(w, self.segmentation)?;
        encode_app_unsigned(w, self.vendor_id)
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let device_id = ObjectId::from_raw(decode_app_object_id(r)?);
        let max_apdu = decode_app_unsigned(r)?;
        let segmentation = decode_app_enumerated(r)?;
        let vendor_id = decode_app_unsigned(r)?;

        Ok(Self {
            device_id,
            max_apdu,
            segmentation,
            vendor_id,
        })
    }
}
