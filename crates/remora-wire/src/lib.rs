// Wire-level message types shared between the Remora client and the compute
// service, plus the decoder that classifies raw server responses.

pub mod decode;
pub mod message;

pub use decode::{Decoded, RequestCategory, SessionEvent, TransferEvent, WireError, decode};
pub use message::{ClientRequest, ErrorKind, ResultPayload, ServerMessage, ServerNote};
