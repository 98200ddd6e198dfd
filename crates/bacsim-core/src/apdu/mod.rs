/// Error PDU encoding and decoding.
pub mod error_pdu;
/// Fixed APDU headers.
pub mod header;
/// The decoded application-layer message union and service dispatch.
pub mod message;
/// APDU type and service choice discriminants.
pub mod pdu;

pub use error_pdu::BacnetError;
pub use header::{ComplexAckHeader, ConfirmedRequestHeader, SimpleAck, UnconfirmedRequestHeader};
pub use message::{Apdu, ConfirmedService, UnconfirmedService};
pub use pdu::{ApduType, ConfirmedServiceChoice, UnconfirmedServiceChoice};
