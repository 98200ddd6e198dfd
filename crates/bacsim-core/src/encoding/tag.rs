use crate::encoding::{reader::Reader, writer::Writer};
use crate::{DecodeError, EncodeError};

/// Largest tag number that fits in the lead byte; 15 would announce an
/// extended tag number byte, which this codec does not handle.
pub const MAX_TAG_NUMBER: u8 = 14;

const CLASS_BIT: u8 = 0b0000_1000;
const LVT_MASK: u8 = 0b0000_0111;
const LVT_EXTENDED: u8 = 5;
const LVT_OPENING: u8 = 6;
const LVT_CLOSING: u8 = 7;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTag {
    Null = 0,
    Boolean = 1,
    UnsignedInt = 2,
    SignedInt = 3,
    Real = 4,
    Double = 5,
    OctetString = 6,
    CharacterString = 7,
    BitString = 8,
    Enumerated = 9,
    Date = 10,
    Time = 11,
    ObjectId = 12,
}

impl AppTag {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0 => Ok(Self::Null),
            1 => Ok(Self::Boolean),
            2 => Ok(Self::UnsignedInt),
            3 => Ok(Self::SignedInt),
            4 => Ok(Self::Real),
            5 => Ok(Self::Double),
            6 => Ok(Self::OctetString),
            7 => Ok(Self::CharacterString),
            8 => Ok(Self::BitString),
            9 => Ok(Self::Enumerated),
            10 => Ok(Self::Date),
            11 => Ok(Self::Time),
            12 => Ok(Self::ObjectId),
            _ => Err(DecodeError::InvalidTag),
        }
    }
}

/// The class bit of a tag's lead byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Application = 0,
    Context = 1,
}

/// A decoded BACnet tag header.
///
/// The lead byte packs `number:4 | class:1 | length-value-type:3`. For
/// application booleans the low bits carry the value itself; for context tags
/// the values 6 and 7 mark opening and closing tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Application { tag: AppTag, len: u32 },
    Context { tag_num: u8, len: u32 },
    Opening { tag_num: u8 },
    Closing { tag_num: u8 },
}

impl Tag {
    pub const fn number(self) -> u8 {
        match self {
            Tag::Application { tag, .. } => tag as u8,
            Tag::Context { tag_num, .. }
            | Tag::Opening { tag_num }
            | Tag::Closing { tag_num } => tag_num,
        }
    }

    pub const fn class(self) -> TagClass {
        match self {
            Tag::Application { .. } => TagClass::Application,
            _ => TagClass::Context,
        }
    }

    /// Length of the content that follows, or the inline value for
    /// booleans and opening/closing markers.
    pub const fn length_or_value(self) -> u32 {
        match self {
            Tag::Application { len, .. } | Tag::Context { len, .. } => len,
            Tag::Opening { .. } => LVT_OPENING as u32,
            Tag::Closing { .. } => LVT_CLOSING as u32,
        }
    }

    pub fn encode(self, w: &mut Writer<'_>) -> Result<(), EncodeError> {
        match self {
            Tag::Application { tag, len } => encode_with_len(w, tag as u8, false, len),
            Tag::Context { tag_num, len } => encode_with_len(w, tag_num, true, len),
            Tag::Opening { tag_num } => encode_marker(w, tag_num, LVT_OPENING),
            Tag::Closing { tag_num } => encode_marker(w, tag_num, LVT_CLOSING),
        }
    }

    pub fn decode(r: &mut Reader<'_>) -> Result<Self, DecodeError> {
        let first = r.read_u8()?;
        let tag_num = first >> 4;
        if tag_num > MAX_TAG_NUMBER {
            return Err(DecodeError::UnsupportedTag(tag_num));
        }

        let lvt = first & LVT_MASK;
        if first & CLASS_BIT == 0 {
            let tag = AppTag::from_u8(tag_num)?;
            if tag == AppTag::Boolean && lvt > 1 {
                return Err(DecodeError::InvalidValue);
            }
            return Ok(Tag::Application {
                tag,
                len: decode_len(r, lvt)?,
            });
        }

        match lvt {
            LVT_OPENING => Ok(Tag::Opening { tag_num }),
            LVT_CLOSING => Ok(Tag::Closing { tag_num }),
            _ => Ok(Tag::Context {
                tag_num,
                len: decode_len(r, lvt)?,
            }),
        }
    }
}

fn lead_byte(tag_num: u8, is_context: bool, lvt: u8) -> Result<u8, EncodeError> {
    if tag_num > MAX_TAG_NUMBER {
        return Err(EncodeError::Unsupported);
    }
    let class = if is_context { CLASS_BIT } else { 0 };
    Ok((tag_num << 4) | class | lvt)
}

fn encode_with_len(
    w: &mut Writer<'_>,
    tag_num: u8,
    is_context: bool,
    len: u32,
) -> Result<(), EncodeError> {
    if len <= 4 {
        return w.write_u8(lead_byte(tag_num, is_context, len as u8)?);
    }

    w.write_u8(lead_byte(tag_num, is_context, LVT_EXTENDED)?)?;
    if len <= 253 {
        w.write_u8(len as u8)
    } else if len <= 65535 {
        w.write_u8(254)?;
        w.write_be_u16(len as u16)
    } else {
        w.write_u8(255)?;
        w.write_be_u32(len)
    }
}

fn encode_marker(w: &mut Writer<'_>, tag_num: u8, lvt: u8) -> Result<(), EncodeError> {
    w.write_u8(lead_byte(tag_num, true, lvt)?)
}

fn decode_len(r: &mut Reader<'_>, lvt: u8) -> Result<u32, DecodeError> {
    match lvt {
        0..=4 => Ok(lvt as u32),
        LVT_EXTENDED => match r.read_u8()? {
            254 => Ok(r.read_be_u16()? as u32),
            255 => r.read_be_u32(),
            v => Ok(v as u32),
        },
        _ => Err(DecodeError::InvalidLength),
    }
}

#[cfg(test)]
mod tests {
    use super::{AppTag, Tag, TagClass};
    use crate::encoding::{reader::Reader, writer::Writer};
    use crate::{DecodeError, EncodeError};

    fn roundtrip(tag: Tag) -> Tag {
        let mut buf = [0u8; 8];
        let mut w = Writer::new(&mut buf);
        tag.encode(&mut w).unwrap();
        let mut r = Reader::new(w.as_written());
        let decoded = Tag::decode(&mut r).unwrap();
        assert!(r.is_empty());
        decoded
    }

    #[test]
    fn context_tags_roundtrip_for_every_number() {
        for tag_num in 0..=14u8 {
            for len in [0u32, 1, 2, 4, 5, 253, 254, 70_000] {
                let tag = Tag::Context { tag_num, len };
                assert_eq!(roundtrip(tag), tag);
            }
            assert_eq!(roundtrip(Tag::Opening { tag_num }), Tag::Opening { tag_num });
            assert_eq!(roundtrip(Tag::Closing { tag_num }), Tag::Closing { tag_num });
        }
    }

    #[test]
    fn real_tag_fields() {
        let mut r = Reader::new(&[0x44]);
        let tag = Tag::decode(&mut r).unwrap();
        assert_eq!(tag.number(), 4);
        assert_eq!(tag.class(), TagClass::Application);
        assert_eq!(tag.length_or_value(), 4);
    }

    #[test]
    fn boolean_value_lives_in_lead_byte() {
        let mut r = Reader::new(&[0x11]);
        assert_eq!(
            Tag::decode(&mut r).unwrap(),
            Tag::Application {
                tag: AppTag::Boolean,
                len: 1
            }
        );
        let mut r = Reader::new(&[0x12]);
        assert_eq!(Tag::decode(&mut r).unwrap_err(), DecodeError::InvalidValue);
    }

    #[test]
    fn tag_number_fifteen_is_unsupported() {
        let mut r = Reader::new(&[0xF9, 0x20, 0x01]);
        assert_eq!(
            Tag::decode(&mut r).unwrap_err(),
            DecodeError::UnsupportedTag(15)
        );

        let mut buf = [0u8; 4];
        let mut w = Writer::new(&mut buf);
        assert_eq!(
            Tag::Context { tag_num: 15, len: 1 }.encode(&mut w).unwrap_err(),
            EncodeError::Unsupported
        );
    }

    #[test]
    fn empty_buffer_is_eof() {
        let mut r = Reader::new(&[]);
        assert_eq!(Tag::decode(&mut r).unwrap_err(), DecodeError::UnexpectedEof);
    }
}
