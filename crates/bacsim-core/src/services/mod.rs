pub mod cov_notification;
pub mod i_am;
pub mod read_property;
pub mod subscribe_cov;
pub mod value_codec;
pub mod who_is;
pub mod write_property;

use crate::encoding::{primitives::decode_unsigned, reader::Reader, tag::Tag};
use crate::types::ObjectId;
use crate::DecodeError;

/// Decode a required context-tagged unsigned integer at the expected tag number.
pub(crate) fn decode_required_ctx_unsigned(
    r: &mut Reader<'_>,
    expected_tag_num: u8,
) -> Result<u32, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num, len } if tag_num == expected_tag_num => {
            decode_unsigned(r, len as usize)
        }
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Decode a required context-tagged BACnet object identifier at the expected tag number.
pub(crate) fn decode_required_ctx_object_id(
    r: &mut Reader<'_>,
    expected_tag_num: u8,
) -> Result<ObjectId, DecodeError> {
    match Tag::decode(r)? {
        Tag::Context { tag_num, len: 4 } if tag_num == expected_tag_num => {
            Ok(ObjectId::from_raw(r.read_be_u32()?))
        }
        Tag::Context { tag_num, .. } if tag_num == expected_tag_num => {
            Err(DecodeError::InvalidLength)
        }
        _ => Err(DecodeError::InvalidTag),
    }
}

/// Decode an optional context-tagged unsigned integer. The reader is left
/// untouched when the next tag is something else or the input is exhausted.
pub(crate) fn decode_optional_ctx_unsigned(
    r: &mut Reader<'_>,
    expected_tag_num: u8,
) -> Result<Option<u32>, DecodeError> {
    if r.is_empty() {
        return Ok(None);
    }
    let checkpoint = *r;
    match Tag::decode(r)? {
        Tag::Context { tag_num, len } if tag_num == expected_tag_num => {
            Ok(Some(decode_unsigned(r, len as usize)?))
        }
        _ => {
            *r = checkpoint;
            Ok(None)
        }
    }
}

/// Narrow a decoded priority to a byte; the 1..=16 range is enforced by the
/// property store, not the codec.
pub(crate) fn priority_from_u32(raw: u32) -> Result<u8, DecodeError> {
    u8::try_from(raw).map_err(|_| DecodeError::InvalidValue)
}

#[cfg(test)]
mod tests {
    use super::{decode_optional_ctx_unsigned, decode_required_ctx_object_id};
    use crate::encoding::reader::Reader;
    use crate::DecodeError;

    #[test]
    fn optional_field_restores_reader_when_absent() {
        let mut r = Reader::new(&[0x3E]);
        assert_eq!(decode_optional_ctx_unsigned(&mut r, 2).unwrap(), None);
        assert_eq!(r.position(), 0);

        let mut r = Reader::new(&[0x29, 0x05]);
        assert_eq!(decode_optional_ctx_unsigned(&mut r, 2).unwrap(), Some(5));
        assert!(r.is_empty());
    }

    #[test]
    fn object_id_must_be_four_bytes() {
        let mut r = Reader::new(&[0x0B, 0x00, 0x00, 0x01]);
        assert_eq!(
            decode_required_ctx_object_id(&mut r, 0).unwrap_err(),
            DecodeError::InvalidLength
        );
    }
}
