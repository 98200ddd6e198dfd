#![allow(async_fn_in_trait)]

//! BACnet/IP data link for bacsim.
//!
//! [`bip::frame`] is the full datagram codec (BVLC, NPDU, APDU) and
//! [`BacnetIpTransport`] moves NPDU payloads over UDP behind the
//! [`DataLink`] trait, so the device server can run against a mock link.

pub mod address;
pub mod bip;
pub mod traits;

pub use address::DataLinkAddress;
pub use bip::frame::{decode_message, encode_message, BipFrame, MAX_BIP_FRAME_LEN};
pub use bip::transport::BacnetIpTransport;
pub use traits::{DataLink, DataLinkError};
