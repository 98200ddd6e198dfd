use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeError {
    BufferTooSmall,
    ValueOutOfRange,
    InvalidLength,
    Unsupported,
    Message(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferTooSmall => f.write_str("buffer too small"),
            Self::ValueOutOfRange => f.write_str("value out of range"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::Unsupported => f.write_str("operation unsupported"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for EncodeError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    UnexpectedEof,
    InvalidTag,
    InvalidLength,
    InvalidValue,
    Unsupported,
    /// Valid framing, but the tag number or application tag is not handled.
    UnsupportedTag(u8),
    /// Valid framing, but the service choice has no decoder.
    UnsupportedService(u8),
    Message(&'static str),
}

impl DecodeError {
    /// True for errors raised on well-formed input that simply isn't handled.
    pub const fn is_unsupported(self) -> bool {
        matches!(
            self,
            Self::Unsupported | Self::UnsupportedTag(_) | Self::UnsupportedService(_)
        )
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => f.write_str("unexpected end of input"),
            Self::InvalidTag => f.write_str("invalid tag"),
            Self::InvalidLength => f.write_str("invalid length"),
            Self::InvalidValue => f.write_str("invalid value"),
            Self::Unsupported => f.write_str("operation unsupported"),
            Self::UnsupportedTag(n) => write!(f, "unsupported tag {n}"),
            Self::UnsupportedService(c) => write!(f, "unsupported service choice 0x{c:02x}"),
            Self::Message(msg) => f.write_str(msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// A [`DecodeError`] annotated with the frame layer or service that raised it.
///
/// `origin` is a layer name (`"bvlc"`, `"npdu"`, `"apdu"`) or a service name
/// (`"ReadProperty"`, `"WriteProperty"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseError {
    pub origin: &'static str,
    pub cause: DecodeError,
}

impl ParseError {
    pub const fn new(origin: &'static str, cause: DecodeError) -> Self {
        Self { origin, cause }
    }

    /// Adapter for `map_err` at a layer boundary.
    pub fn at(origin: &'static str) -> impl Fn(DecodeError) -> Self {
        move |cause| Self { origin, cause }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} parse error: {}", self.origin, self.cause)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}
