//! BACnet wire-protocol encoding and decoding for the bacsim device simulator.
//!
//! `bacsim-core` owns everything that turns bytes into typed BACnet messages
//! and back: the tag-length-value primitive codec, the closed set of typed
//! values a simulated object exposes, the NPDU and APDU headers, and the
//! service payloads the simulator speaks (Who-Is, I-Am, ReadProperty,
//! WriteProperty, SubscribeCOV and COV notifications). It performs no I/O.
//!
//! # Feature flags
//!
//! - `std` (default): `std::error::Error` for the error types.
//! - `serde`: `Serialize`/`Deserialize` on identifiers, enumerations and values.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod apdu;
/// Tag-length-value primitives over a borrowed reader and a slice writer.
pub mod encoding;
pub mod error;
pub mod npdu;
/// One codec per service the simulator speaks.
pub mod services;
pub mod types;

pub use error::{DecodeError, EncodeError, ParseError};
