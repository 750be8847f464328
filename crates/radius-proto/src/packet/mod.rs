//! RADIUS packet model and its code-keyed variants

pub mod access_request;
pub mod accounting_request;
pub mod code;
pub mod error;
pub mod packet;
pub mod variant;

pub use access_request::{AccessRequest, AuthProtocol};
pub use accounting_request::AccountingRequest;
pub use code::Code;
pub use error::PacketError;
pub use packet::{Header, Packet};
pub use variant::{AuthenticatorScheme, PacketKind, RadiusPacket};
