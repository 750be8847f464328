//! Packet <-> UDP datagram mapping
//!
//! [`PacketCodec`] is where received bytes become packets. The 4096-octet
//! ceiling is enforced on both directions, and authenticators are checked
//! according to the [`AuthenticatorScheme`] of the packet's code:
//!
//! | Scheme   | Codes                                   | `from_datagram`                 |
//! |----------|-----------------------------------------|---------------------------------|
//! | Random   | Access-Request, Status-Server           | structural, PAP password recovered |
//! | Hashed   | Accounting-Request, CoA, Disconnect, other | RFC 2866 request authenticator |
//! | Response | Accept, Reject, Challenge, ACK/NAK      | structural; see `decode_response` |
//!
//! A present Message-Authenticator is verified whenever the value of the
//! Authenticator field used to compute it is known.

use crate::attributes::{Attribute, AttributeValue, DefaultDictionary, Dictionary};
use crate::auth;
use crate::message_auth;
use crate::packet::{
    AccessRequest, AuthenticatorScheme, Packet, PacketError, PacketKind, RadiusPacket,
};
use std::net::SocketAddr;
use std::sync::Arc;

/// A UDP payload together with the peer it came from or goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub remote: SocketAddr,
    pub payload: Vec<u8>,
}

impl Datagram {
    pub fn new(remote: SocketAddr, payload: Vec<u8>) -> Self {
        Datagram { remote, payload }
    }
}

/// Bidirectional packet/datagram codec
///
/// Holds the attribute dictionary used for typed value access. The
/// dictionary is read-only, so one codec can be shared across tasks.
#[derive(Clone)]
pub struct PacketCodec {
    dictionary: Arc<dyn Dictionary>,
}

impl PacketCodec {
    pub fn new(dictionary: Arc<dyn Dictionary>) -> Self {
        PacketCodec { dictionary }
    }

    pub fn dictionary(&self) -> &dyn Dictionary {
        self.dictionary.as_ref()
    }

    /// Serialize an encoded packet for `remote`.
    ///
    /// Fails with [`PacketError::PacketTooLong`] above 4096 octets and with
    /// [`PacketError::Malformed`] if the packet was never encoded.
    pub fn to_datagram(
        &self,
        packet: &RadiusPacket,
        remote: SocketAddr,
    ) -> Result<Datagram, PacketError> {
        Ok(Datagram::new(remote, packet.packet().encode()?))
    }

    /// Decode a datagram received from a peer with no request context.
    pub fn from_datagram(
        &self,
        datagram: &Datagram,
        secret: &[u8],
    ) -> Result<RadiusPacket, PacketError> {
        let payload = &datagram.payload;
        let header = Packet::decode_header(payload)?;

        match AuthenticatorScheme::for_code(header.code) {
            AuthenticatorScheme::Random => {
                message_auth::verify_datagram(payload, &header.authenticator, secret)?;
            }
            AuthenticatorScheme::Hashed => {
                let zeros = [0u8; auth::AUTHENTICATOR_LENGTH];
                if auth::hash_datagram(payload, &zeros, secret)? != header.authenticator {
                    return Err(PacketError::AuthenticatorMismatch);
                }
                message_auth::verify_datagram(payload, &zeros, secret)?;
            }
            AuthenticatorScheme::Response => {}
        }

        let packet = Packet::decode(payload)?;
        match PacketKind::for_code(packet.code) {
            PacketKind::AccessRequest => {
                AccessRequest::decode_request(packet, secret).map(RadiusPacket::from)
            }
            PacketKind::AccountingRequest | PacketKind::Generic => {
                Ok(RadiusPacket::from_packet(packet))
            }
        }
    }

    /// Decode a response to `request`, verifying the Response Authenticator.
    ///
    /// The hash is checked on the raw octets before the attributes are
    /// parsed, so any corrupted octet past the length field is reported as
    /// [`PacketError::AuthenticatorMismatch`].
    pub fn decode_response(
        &self,
        datagram: &Datagram,
        secret: &[u8],
        request: &RadiusPacket,
    ) -> Result<RadiusPacket, PacketError> {
        let payload = &datagram.payload;
        let header = Packet::decode_header(payload)?;

        let request_authenticator = request
            .authenticator()
            .ok_or_else(|| PacketError::malformed("original request was never encoded"))?;
        if header.identifier != request.identifier() {
            return Err(PacketError::malformed(format!(
                "response identifier {} does not match request {}",
                header.identifier,
                request.identifier()
            )));
        }

        if auth::hash_datagram(payload, &request_authenticator, secret)? != header.authenticator {
            return Err(PacketError::AuthenticatorMismatch);
        }
        message_auth::verify_datagram(payload, &request_authenticator, secret)?;

        Ok(RadiusPacket::from_packet(Packet::decode(payload)?))
    }

    /// Typed value of `attribute`; unknown attributes come back as octets.
    pub fn attribute_value(&self, attribute: &Attribute) -> Result<AttributeValue, PacketError> {
        attribute.typed_value(self.dictionary())
    }

    /// Typed value of the first attribute called `name`, if present
    pub fn attribute_by_name(
        &self,
        packet: &Packet,
        name: &str,
    ) -> Result<Option<AttributeValue>, PacketError> {
        let definition = self
            .dictionary
            .lookup_name(name)
            .ok_or_else(|| PacketError::InvalidValue(format!("unknown attribute: {}", name)))?;

        packet
            .attributes
            .iter()
            .find(|a| a.vendor_id == definition.vendor_id && a.attr_type == definition.attr_type)
            .map(|a| self.attribute_value(a))
            .transpose()
    }

    /// Append an attribute looked up by dictionary name.
    pub fn add_named(
        &self,
        packet: &mut RadiusPacket,
        name: &str,
        value: &AttributeValue,
    ) -> Result<(), PacketError> {
        let attribute = Attribute::named(self.dictionary(), name, value)?;
        packet.add_attribute(attribute);
        Ok(())
    }
}

impl Default for PacketCodec {
    fn default() -> Self {
        PacketCodec::new(Arc::new(DefaultDictionary::new()))
    }
}

impl std::fmt::Debug for PacketCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PacketCodec").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;
    use crate::packet::{AccountingRequest, Code};
    use std::net::Ipv4Addr;

    fn remote() -> SocketAddr {
        "127.0.0.1:1812".parse().unwrap()
    }

    #[test]
    fn test_unencoded_packet_rejected() {
        let codec = PacketCodec::default();
        let packet = RadiusPacket::new(Code::CoaRequest, 1);
        assert!(matches!(
            codec.to_datagram(&packet, remote()),
            Err(PacketError::Malformed(_))
        ));
    }

    #[test]
    fn test_accounting_request_verified() {
        let codec = PacketCodec::default();
        let request: RadiusPacket = AccountingRequest::new(3).into();
        let encoded = request.encode_request(b"secret").unwrap();
        let datagram = codec.to_datagram(&encoded, remote()).unwrap();

        let decoded = codec.from_datagram(&datagram, b"secret").unwrap();
        assert_eq!(decoded, encoded);

        assert!(matches!(
            codec.from_datagram(&datagram, b"other"),
            Err(PacketError::AuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_message_authenticator_checked() {
        let codec = PacketCodec::default();
        let mut request = AccessRequest::with_credentials(1, "alice", "pw").unwrap();
        request
            .packet_mut()
            .add_attribute(Attribute::new(80, vec![0u8; 16]).unwrap());
        let encoded: RadiusPacket = request.encode_request(b"secret").unwrap().into();
        let mut datagram = codec.to_datagram(&encoded, remote()).unwrap();

        assert!(codec.from_datagram(&datagram, b"secret").is_ok());

        let offset = message_auth::find_message_authenticator(&datagram.payload).unwrap();
        datagram.payload[offset] ^= 0xFF;
        assert!(matches!(
            codec.from_datagram(&datagram, b"secret"),
            Err(PacketError::MessageAuthenticatorMismatch)
        ));
    }

    #[test]
    fn test_response_identifier_must_match() {
        let codec = PacketCodec::default();
        let request = RadiusPacket::new(Code::AccessRequest, 10)
            .encode_request(b"s")
            .unwrap();
        let response = RadiusPacket::new(Code::AccessAccept, 11)
            .encode_response(b"s", &request.authenticator().unwrap())
            .unwrap();
        let datagram = codec.to_datagram(&response, remote()).unwrap();

        assert!(matches!(
            codec.decode_response(&datagram, b"s", &request),
            Err(PacketError::Malformed(_))
        ));
    }

    #[test]
    fn test_attribute_by_name() {
        let codec = PacketCodec::default();
        let mut packet = RadiusPacket::new(Code::AccessAccept, 1);
        codec
            .add_named(
                &mut packet,
                "Framed-IP-Address",
                &AttributeValue::Ipv4(Ipv4Addr::new(10, 0, 0, 9)),
            )
            .unwrap();
        codec
            .add_named(&mut packet, "session-timeout", &AttributeValue::Integer(600))
            .unwrap();

        assert_eq!(
            packet
                .packet()
                .get_attribute(AttributeType::FramedIpAddress.as_u8())
                .unwrap()
                .value,
            vec![10, 0, 0, 9]
        );
        assert_eq!(
            codec
                .attribute_by_name(packet.packet(), "Session-Timeout")
                .unwrap(),
            Some(AttributeValue::Integer(600))
        );
        assert_eq!(
            codec.attribute_by_name(packet.packet(), "Reply-Message").unwrap(),
            None
        );
        assert!(codec.attribute_by_name(packet.packet(), "No-Such-Thing").is_err());
    }

    #[test]
    fn test_unknown_attribute_is_opaque() {
        let codec = PacketCodec::default();
        let attr = Attribute::new(250, vec![1, 2, 3]).unwrap();
        assert_eq!(
            codec.attribute_value(&attr).unwrap(),
            AttributeValue::Octets(vec![1, 2, 3])
        );
    }
}
