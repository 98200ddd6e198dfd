use crate::encoding::{
    primitives::{decode_unsigned, encode_app_enumerated, encode_app_unsigned, normalize_real},
    reader::Reader,
    tag::{AppTag, Tag},
    writer::Writer,
};
use crate::types::{ObjectId, PropertyValue, StatusFlags, TypedValue};
use crate::{DecodeError, EncodeError};
use alloc::string::String;
use alloc::vec::Vec;

/// Character set selector for UTF-8 / ANSI X3.4.
const CHARSET_UTF8: u8 = 0;

fn u32_len(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::ValueOutOfRange)
}

impl TypedValue {
    /// Writes this value as one application-tagged element.
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::Null => Tag::Application {
                tag: AppTag::Null,
                len: 0,
            }
            .encode(w),
            Self::Boolean(v) => Tag::Application {
                tag: AppTag::Boolean,
                len: *v as u32,
            }
            .encode(w),
            Self::UnsignedInt(v) => encode_app_unsigned(w, *v),
            Self::Enumerated(v) => encode_app_enumerated(w, *v),
            Self::Real(v) => {
                Tag::Application {
                    tag: AppTag::Real,
                    len: 4,
                }
                .encode(w)?;
                w.write_be_u32(normalize_real(*v).to_bits())
            }
            Self::CharacterString(v) => {
                let bytes = v.as_bytes();
                Tag::Application {
                    tag: AppTag::CharacterString,
                    len: u32_len(bytes.len().saturating_add(1))?,
                }
                .encode(w)?;
                w.write_u8(CHARSET_UTF8)?;
                w.write_all(bytes)
            }
            Self::StatusFlags(flags) => {
                Tag::Application {
                    tag: AppTag::BitString,
                    len: 2,
                }
                .encode(w)?;
                w.write_u8(StatusFlags::UNUSED_BITS)?;
                w.write_u8(flags.to_byte())
            }
            Self::ObjectId(id) => {
                Tag::Application {
                    tag: AppTag::ObjectId,
                    len: 4,
                }
                .encode(w)?;
                w.write_be_u32(id.raw())
            }
        }
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let tag = Tag::decode(r)?;
        Self::decode_from_tag(r, tag)
    }

    /// Decodes the content that follows an already-read tag.
    pub fn decode_from_tag(r: &mut Reader<'_>, tag: Tag) -> Result<Self, DecodeError> {
        let (app, len) = match tag {
            Tag::Application { tag, len } => (tag, len),
            _ => return Err(DecodeError::InvalidTag),
        };
        match app {
            AppTag::Null => {
                if len != 0 {
                    return Err(DecodeError::InvalidLength);
                }
                Ok(Self::Null)
            }
            AppTag::Boolean => Ok(Self::Boolean(len != 0)),
            AppTag::UnsignedInt => Ok(Self::UnsignedInt(decode_unsigned(r, len as usize)?)),
            AppTag::Enumerated => Ok(Self::Enumerated(decode_unsigned(r, len as usize)?)),
            AppTag::Real => {
                if len != 4 {
                    return Err(DecodeError::InvalidLength);
                }
                Ok(Self::real(f32::from_bits(r.read_be_u32()?)))
            }
            AppTag::CharacterString => {
                if len == 0 {
                    return Err(DecodeError::InvalidLength);
                }
                let raw = r.read_exact(len as usize)?;
                if raw[0] != CHARSET_UTF8 {
                    return Err(DecodeError::Unsupported);
                }
                let s = core::str::from_utf8(&raw[1..]).map_err(|_| DecodeError::InvalidValue)?;
                Ok(Self::CharacterString(String::from(s)))
            }
            AppTag::BitString => {
                if len != 2 {
                    return Err(DecodeError::InvalidLength);
                }
                let raw = r.read_exact(2)?;
                if raw[0] > 7 {
                    return Err(DecodeError::InvalidValue);
                }
                Ok(Self::StatusFlags(StatusFlags::from_byte(raw[1])))
            }
            AppTag::ObjectId => {
                if len != 4 {
                    return Err(DecodeError::InvalidLength);
                }
                Ok(Self::ObjectId(ObjectId::from_raw(r.read_be_u32()?)))
            }
            other => Err(DecodeError::UnsupportedTag(other as u8)),
        }
    }
}

/// Writes a list payload as consecutive application-tagged elements.
pub fn encode_value_list(w: &mut Writer<'_>, values: &[TypedValue]) -> Result<(), EncodeError> {
    for value in values {
        value.encode(w)?;
    }
    Ok(())
}

impl PropertyValue {
    pub fn encode(&self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Self::Value(v) => v.encode(w),
            Self::List(items) => encode_value_list(w, items),
        }
    }
}

/// Reads application-tagged elements until the closing tag `tag_num`,
/// consuming the closing tag.
pub fn decode_values_until_closing(
    r: &mut Reader<'_>,
    tag_num: u8,
) -> Result<Vec<TypedValue>, DecodeError> {
    let mut values = Vec::new();
    loop {
        let tag = Tag::decode(r)?;
        if tag == (Tag::Closing { tag_num }) {
            return Ok(values);
        }
        values.push(TypedValue::decode_from_tag(r, tag)?);
    }
}

#[cfg(test)]
mod tests {
    use super::decode_values_until_closing;
    use crate::encoding::{reader::Reader, tag::Tag, writer::Writer};
    use crate::types::{ObjectId, ObjectType, StatusFlags, TypedValue};
    use crate::DecodeError;
    use alloc::string::String;
    use alloc::vec::Vec;
    use proptest::prelude::*;

    fn roundtrip(value: &TypedValue) -> TypedValue {
        let mut buf = [0u8; 512];
        let mut w = Writer::new(&mut buf);
        value.encode(&mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        let decoded = TypedValue::decode(&mut r).unwrap();
        assert!(r.is_empty());
        decoded
    }

    fn typed_value() -> impl Strategy<Value = TypedValue> {
        prop_oneof![
            Just(TypedValue::Null),
            any::<bool>().prop_map(TypedValue::Boolean),
            any::<u32>().prop_map(TypedValue::UnsignedInt),
            any::<u32>().prop_map(TypedValue::Enumerated),
            (-1000.0f32..1000.0f32).prop_map(TypedValue::real),
            "[a-zA-Z0-9 _-]{0,300}".prop_map(TypedValue::CharacterString),
            any::<u8>().prop_map(|b| TypedValue::StatusFlags(StatusFlags::from_byte(b))),
            (0u16..1024, 0u32..=0x3F_FFFF).prop_map(|(t, i)| TypedValue::ObjectId(
                ObjectId::new(ObjectType::from_u16(t), i)
            )),
        ]
    }

    fn encoded(value: &TypedValue) -> Vec<u8> {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        value.encode(&mut w).unwrap();
        w.as_written().to_vec()
    }

    #[test]
    fn unsigned_and_enumerated_use_one_two_or_four_bytes() {
        assert_eq!(encoded(&TypedValue::UnsignedInt(16)), [0x21, 0x10]);
        assert_eq!(encoded(&TypedValue::UnsignedInt(256)), [0x22, 0x01, 0x00]);
        assert_eq!(
            encoded(&TypedValue::UnsignedInt(70_000)),
            [0x24, 0x00, 0x01, 0x11, 0x70]
        );
        assert_eq!(encoded(&TypedValue::Enumerated(95)), [0x91, 0x5F]);
        assert_eq!(
            encoded(&TypedValue::Enumerated(0x1_0000)),
            [0x94, 0x00, 0x01, 0x00, 0x00]
        );
    }

    proptest! {
        #[test]
        fn every_variant_roundtrips(value in typed_value()) {
            prop_assert_eq!(roundtrip(&value), value);
        }
    }

    #[test]
    fn real_is_rounded_on_the_way_out() {
        let value = TypedValue::Real(1.234_567);
        assert_eq!(roundtrip(&value), TypedValue::real(1.2346));
    }

    #[test]
    fn status_flags_wire_layout() {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        TypedValue::StatusFlags(StatusFlags {
            in_alarm: false,
            fault: true,
            overridden: true,
            out_of_service: false,
        })
        .encode(&mut w)
        .unwrap();
        assert_eq!(w.as_written(), &[0x82, 0x04, 0x60]);
    }

    #[test]
    fn character_string_length_counts_charset_byte() {
        let mut buf = [0u8; 16];
        let mut w = Writer::new(&mut buf);
        TypedValue::string("AI").encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x73, 0x00, b'A', b'I']);
    }

    #[test]
    fn null_and_boolean_carry_no_content() {
        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        TypedValue::Null.encode(&mut w).unwrap();
        TypedValue::Boolean(true).encode(&mut w).unwrap();
        assert_eq!(w.as_written(), &[0x00, 0x11]);
    }

    #[test]
    fn unhandled_application_tags_are_rejected() {
        // signed integer -5
        let mut r = Reader::new(&[0x31, 0xFB]);
        assert_eq!(
            TypedValue::decode(&mut r).unwrap_err(),
            DecodeError::UnsupportedTag(3)
        );
        // date
        let mut r = Reader::new(&[0xA4, 0x7C, 0x01, 0x01, 0x01]);
        assert_eq!(
            TypedValue::decode(&mut r).unwrap_err(),
            DecodeError::UnsupportedTag(10)
        );
    }

    #[test]
    fn context_tag_is_not_a_value() {
        let mut r = Reader::new(&[0x09, 0x01]);
        assert_eq!(
            TypedValue::decode(&mut r).unwrap_err(),
            DecodeError::InvalidTag
        );
    }

    #[test]
    fn value_list_stops_at_closing_tag() {
        let mut buf = [0u8; 64];
        let mut w = Writer::new(&mut buf);
        TypedValue::string("Off").encode(&mut w).unwrap();
        TypedValue::string("On").encode(&mut w).unwrap();
        Tag::Closing { tag_num: 3 }.encode(&mut w).unwrap();
        w.write_u8(0xAA).unwrap();

        let mut r = Reader::new(w.as_written());
        let values = decode_values_until_closing(&mut r, 3).unwrap();
        let names: Vec<String> = values
            .iter()
            .filter_map(|v| v.as_str().map(String::from))
            .collect();
        assert_eq!(names, ["Off", "On"]);
        assert_eq!(r.read_u8().unwrap(), 0xAA);
    }
}
