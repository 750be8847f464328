//! Packet variants keyed by code
//!
//! [`PacketKind::for_code`] and [`AuthenticatorScheme::for_code`] form the
//! table that decides, for any code, which variant a packet is built or
//! decoded as and how its authenticator is produced and checked.

use super::{AccessRequest, AccountingRequest, Code, Packet, PacketError};
use crate::attributes::Attribute;

/// Variant a packet is represented as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    AccessRequest,
    AccountingRequest,
    Generic,
}

impl PacketKind {
    pub fn for_code(code: Code) -> Self {
        match code {
            Code::AccessRequest => PacketKind::AccessRequest,
            Code::AccountingRequest => PacketKind::AccountingRequest,
            _ => PacketKind::Generic,
        }
    }
}

/// How the Authenticator field of a packet with a given code is derived
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorScheme {
    /// Sixteen random octets (Access-Request, Status-Server); nothing to verify
    Random,
    /// RFC 2866 hash over the packet with a zeroed authenticator; verified on receipt
    Hashed,
    /// Bound to the originating request; verified only against that request
    Response,
}

impl AuthenticatorScheme {
    pub fn for_code(code: Code) -> Self {
        match code {
            Code::AccessRequest | Code::StatusServer => AuthenticatorScheme::Random,
            code if code.is_response() => AuthenticatorScheme::Response,
            _ => AuthenticatorScheme::Hashed,
        }
    }
}

/// A RADIUS packet as one of its variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadiusPacket {
    AccessRequest(AccessRequest),
    AccountingRequest(AccountingRequest),
    Generic(Packet),
}

impl RadiusPacket {
    /// Build an empty packet of the variant matching `code`.
    pub fn new(code: Code, identifier: u8) -> Self {
        match PacketKind::for_code(code) {
            PacketKind::AccessRequest => AccessRequest::new(identifier).into(),
            PacketKind::AccountingRequest => AccountingRequest::new(identifier).into(),
            PacketKind::Generic => RadiusPacket::Generic(Packet::new(code, identifier)),
        }
    }

    /// Wrap an existing packet (typically decoded) in the variant matching its code.
    pub fn from_packet(packet: Packet) -> Self {
        match PacketKind::for_code(packet.code) {
            PacketKind::AccessRequest => AccessRequest::from_packet(packet).into(),
            PacketKind::AccountingRequest => AccountingRequest::from_packet(packet).into(),
            PacketKind::Generic => RadiusPacket::Generic(packet),
        }
    }

    pub fn kind(&self) -> PacketKind {
        match self {
            RadiusPacket::AccessRequest(_) => PacketKind::AccessRequest,
            RadiusPacket::AccountingRequest(_) => PacketKind::AccountingRequest,
            RadiusPacket::Generic(_) => PacketKind::Generic,
        }
    }

    pub fn packet(&self) -> &Packet {
        match self {
            RadiusPacket::AccessRequest(request) => request.packet(),
            RadiusPacket::AccountingRequest(request) => request.packet(),
            RadiusPacket::Generic(packet) => packet,
        }
    }

    pub fn packet_mut(&mut self) -> &mut Packet {
        match self {
            RadiusPacket::AccessRequest(request) => request.packet_mut(),
            RadiusPacket::AccountingRequest(request) => request.packet_mut(),
            RadiusPacket::Generic(packet) => packet,
        }
    }

    pub fn into_packet(self) -> Packet {
        match self {
            RadiusPacket::AccessRequest(request) => request.into_packet(),
            RadiusPacket::AccountingRequest(request) => request.into_packet(),
            RadiusPacket::Generic(packet) => packet,
        }
    }

    pub fn code(&self) -> Code {
        self.packet().code
    }

    pub fn identifier(&self) -> u8 {
        self.packet().identifier
    }

    pub fn authenticator(&self) -> Option<[u8; 16]> {
        self.packet().authenticator
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.packet_mut().add_attribute(attribute);
    }

    /// Return a wire-ready copy with the request authenticator (and any
    /// variant transform) applied. The receiver is never modified.
    pub fn encode_request(&self, secret: &[u8]) -> Result<RadiusPacket, PacketError> {
        match self {
            RadiusPacket::AccessRequest(request) => request.encode_request(secret).map(Into::into),
            RadiusPacket::AccountingRequest(request) => {
                request.encode_request(secret).map(Into::into)
            }
            RadiusPacket::Generic(packet) => {
                let encoded = match AuthenticatorScheme::for_code(packet.code) {
                    AuthenticatorScheme::Random => packet.encode_random_request(secret)?,
                    AuthenticatorScheme::Hashed | AuthenticatorScheme::Response => {
                        packet.encode_hashed_request(secret)?
                    }
                };
                Ok(RadiusPacket::Generic(encoded))
            }
        }
    }

    /// Return a wire-ready response bound to `request_authenticator`.
    pub fn encode_response(
        &self,
        secret: &[u8],
        request_authenticator: &[u8; 16],
    ) -> Result<RadiusPacket, PacketError> {
        self.packet()
            .encode_response(secret, request_authenticator)
            .map(RadiusPacket::from_packet)
    }
}

impl From<AccessRequest> for RadiusPacket {
    fn from(request: AccessRequest) -> Self {
        RadiusPacket::AccessRequest(request)
    }
}

impl From<AccountingRequest> for RadiusPacket {
    fn from(request: AccountingRequest) -> Self {
        RadiusPacket::AccountingRequest(request)
    }
}

impl From<Packet> for RadiusPacket {
    fn from(packet: Packet) -> Self {
        RadiusPacket::from_packet(packet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_for_code() {
        let access = RadiusPacket::new(Code::AccessRequest, 1);
        let coa = RadiusPacket::new(Code::CoaRequest, 2);
        let accounting = RadiusPacket::new(Code::AccountingRequest, 3);

        assert_eq!(access.code(), Code::AccessRequest);
        assert_eq!(access.kind(), PacketKind::AccessRequest);
        assert_eq!(coa.code(), Code::CoaRequest);
        assert_eq!(coa.kind(), PacketKind::Generic);
        assert_eq!(accounting.code(), Code::AccountingRequest);
        assert!(matches!(accounting, RadiusPacket::AccountingRequest(_)));
    }

    #[test]
    fn test_from_packet_uses_same_table() {
        for value in 0..=u8::MAX {
            let code = Code::from_u8(value);
            let packet = RadiusPacket::from_packet(Packet::new(code, 0));
            assert_eq!(packet.kind(), PacketKind::for_code(code));
            assert_eq!(packet.code(), code);
        }
    }

    #[test]
    fn test_authenticator_schemes() {
        assert_eq!(
            AuthenticatorScheme::for_code(Code::AccessRequest),
            AuthenticatorScheme::Random
        );
        assert_eq!(
            AuthenticatorScheme::for_code(Code::AccountingRequest),
            AuthenticatorScheme::Hashed
        );
        assert_eq!(
            AuthenticatorScheme::for_code(Code::CoaRequest),
            AuthenticatorScheme::Hashed
        );
        assert_eq!(
            AuthenticatorScheme::for_code(Code::Other(200)),
            AuthenticatorScheme::Hashed
        );
        assert_eq!(
            AuthenticatorScheme::for_code(Code::AccessAccept),
            AuthenticatorScheme::Response
        );
    }

    #[test]
    fn test_encode_response_binds_request() {
        let request = RadiusPacket::new(Code::AccessRequest, 5)
            .encode_request(b"secret")
            .unwrap();
        let request_auth = request.authenticator().unwrap();

        let mut response = RadiusPacket::new(Code::AccessAccept, 5);
        response.add_attribute(Attribute::string(18, "ok").unwrap());
        let encoded = response.encode_response(b"secret", &request_auth).unwrap();

        assert!(
            crate::auth::verify_response_authenticator(encoded.packet(), &request_auth, b"secret")
                .unwrap()
        );
        assert!(response.authenticator().is_none());
    }
}
