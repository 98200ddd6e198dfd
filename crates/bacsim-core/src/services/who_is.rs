use crate::apdu::UnconfirmedServiceChoice;
use crate::encoding::{primitives::encode_ctx_unsigned, reader::Reader, writer::Writer};
use crate::services::{decode_optional_ctx_unsigned, decode_required_ctx_unsigned};
use crate::{DecodeError, EncodeError};

pub const SERVICE_WHO_IS: u8 = UnconfirmedServiceChoice::WhoIs as u8;

/// Who-Is request, optionally restricted to a device instance range.
///
/// The limits travel as a pair; a request with only one of them is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WhoIsRequest {
    pub low_limit: Option<u32>,
    pub high_limit: Option<u32>,
}

impl WhoIsRequest {
    pub const fn global() -> Self {
        Self {
            low_limit: None,
            high_limit: None,
        }
    }

    pub const fn range(low: u32, high: u32) -> Self {
        Self {
            low_limit: Some(low),
            high_limit: Some(high),
        }
    }

    /// Whether a device with this instance number should answer.
    pub fn matches(&self, instance: u32) -> bool {
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => (low..=high).contains(&instance),
            _ => true,
        }
    }

    pub fn encode_after_header(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match (self.low_limit, self.high_limit) {
            (Some(low), Some(high)) => {
                encode_ctx_unsigned(w, 0, low)?;
                encode_ctx_unsigned(w, 1, high)
            }
            (None, None) => Ok(()),
            _ => Err(EncodeError::Message("who-is limits must be given together")),
        }
    }

    pub fn decode_after_header(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        match decode_optional_ctx_unsigned(r, 0)? {
            Some(low) => {
                let high = decode_required_ctx_unsigned(r, 1)?;
                Ok(Self::range(low, high))
            }
            None if r.is_empty() => Ok(Self::global()),
            None => Err(DecodeError::InvalidTag),
        }
    }
}
