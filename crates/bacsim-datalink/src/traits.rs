use crate::DataLinkAddress;
use bacsim_core::ParseError;
use thiserror::Error;

/// Errors that can occur at the data-link layer.
#[derive(Debug, Error)]
pub enum DataLinkError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("frame too large")]
    FrameTooLarge,
    #[error("unsupported BVLC function 0x{0:02x}")]
    UnsupportedBvlcFunction(u8),
    #[error("data link closed")]
    Closed,
}

impl DataLinkError {
    /// True when the link can no longer deliver frames; every other error
    /// concerns a single datagram.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

/// Async trait for sending and receiving NPDU payloads.
///
/// Implementors strip and add the link framing; callers only see the
/// network-layer bytes and the peer address.
pub trait DataLink: Send + Sync {
    /// Sends `payload` to the given data-link `address`.
    async fn send(&self, address: DataLinkAddress, payload: &[u8]) -> Result<(), DataLinkError>;

    /// Receives a frame into `buf`, returning `(bytes_read, source_address)`.
    async fn recv(&self, buf: &mut [u8]) -> Result<(usize, DataLinkAddress), DataLinkError>;
}

#[cfg(test)]
mod tests {
    use super::DataLinkError;
    use bacsim_core::{DecodeError, ParseError};

    #[test]
    fn only_a_closed_link_is_fatal() {
        assert!(DataLinkError::Closed.is_fatal());
        assert!(!DataLinkError::FrameTooLarge.is_fatal());
        assert!(!DataLinkError::UnsupportedBvlcFunction(0x0B).is_fatal());
        assert!(!DataLinkError::Parse(ParseError::new("bvlc", DecodeError::UnexpectedEof)).is_fatal());
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(!DataLinkError::Io(refused).is_fatal());
    }
}
