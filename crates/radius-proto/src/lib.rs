//! RADIUS Protocol Implementation
//!
//! This crate provides the wire codec and authenticator engine of the
//! RADIUS protocol as defined in RFC 2865, 2866, 2869, 3579 and 5176.
//!
//! # Features
//!
//! - Packet encoding and decoding with the 4096-octet ceiling enforced
//! - Access-Request (PAP and CHAP), Accounting-Request and generic packets
//! - Request, accounting and response authenticators
//! - User-Password obfuscation
//! - Message-Authenticator (HMAC-MD5)
//! - Vendor-Specific attributes and a pluggable attribute dictionary
//!
//! The crate performs no I/O; transports hand datagrams to [`PacketCodec`].
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{AccessRequest, Code, PacketCodec, RadiusPacket};
//!
//! let codec = PacketCodec::default();
//! let secret = b"sharedSecret1";
//! let server = "127.0.0.1:1812".parse().unwrap();
//!
//! // Build and encode an Access-Request
//! let request = AccessRequest::with_credentials(1, "alice", "myPassword").unwrap();
//! let request: RadiusPacket = request.encode_request(secret).unwrap().into();
//! let datagram = codec.to_datagram(&request, server).unwrap();
//!
//! // The server recovers the password
//! let received = codec.from_datagram(&datagram, secret).unwrap();
//! let RadiusPacket::AccessRequest(received) = received else { unreachable!() };
//! assert_eq!(received.user_password(), Some("myPassword"));
//!
//! // ...and answers, binding the response to the request
//! let accept = RadiusPacket::new(Code::AccessAccept, received.packet().identifier)
//!     .encode_response(secret, &received.packet().authenticator.unwrap())
//!     .unwrap();
//! let reply = codec.to_datagram(&accept, server).unwrap();
//! let response = codec.decode_response(&reply, secret, &request).unwrap();
//! assert_eq!(response.code(), Code::AccessAccept);
//! ```

pub mod accounting;
pub mod attributes;
pub mod auth;
pub mod chap;
pub mod codec;
pub mod message_auth;
pub mod packet;

pub use accounting::{AcctAuthentic, AcctStatusType, AcctTerminateCause};
pub use attributes::{
    Attribute, AttributeCodec, AttributeDataType, AttributeDefinition, AttributeType,
    AttributeValue, DefaultDictionary, Dictionary,
};
pub use auth::{
    calculate_accounting_request_authenticator, calculate_response_authenticator,
    decrypt_user_password, encrypt_user_password, generate_request_authenticator,
    verify_response_authenticator,
};
pub use chap::{ChapPassword, compute_chap_response, generate_chap_challenge};
pub use codec::{Datagram, PacketCodec};
pub use message_auth::{calculate_message_authenticator, verify_message_authenticator};
pub use packet::{
    AccessRequest, AccountingRequest, AuthProtocol, AuthenticatorScheme, Code, Packet,
    PacketError, PacketKind, RadiusPacket,
};
