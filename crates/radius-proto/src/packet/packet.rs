use super::{Code, PacketError};
use crate::attributes::{Attribute, AttributeType};
use crate::auth;
use crate::message_auth;

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
///
/// A packet is built by pushing attributes, then finalized by one of the
/// `encode_*` operations, which return a new packet carrying the
/// authenticator and leave the builder untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Packet identifier for matching requests/responses (1 byte)
    pub identifier: u8,
    /// Authenticator (16 bytes), `None` until the packet is encoded
    pub authenticator: Option<[u8; 16]>,
    /// Attributes in wire order
    pub attributes: Vec<Attribute>,
}

/// Fixed header fields as read off the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub code: Code,
    pub identifier: u8,
    pub length: u16,
    pub authenticator: [u8; 16],
}

impl Packet {
    /// Header length (20 bytes: 1 code + 1 id + 2 length + 16 authenticator)
    pub const HEADER_LENGTH: usize = 20;
    /// Minimum RADIUS packet size
    pub const MIN_PACKET_SIZE: usize = Self::HEADER_LENGTH;
    /// Maximum RADIUS packet size (4096 bytes as per RFC 2865)
    pub const MAX_PACKET_SIZE: usize = 4096;

    pub fn new(code: Code, identifier: u8) -> Self {
        Packet {
            code,
            identifier,
            authenticator: None,
            attributes: Vec::new(),
        }
    }

    pub fn with_authenticator(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            authenticator: Some(authenticator),
            ..Packet::new(code, identifier)
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Append a raw attribute; fails if the value cannot be framed.
    pub fn add(
        &mut self,
        vendor_id: Option<u32>,
        attr_type: u8,
        value: Vec<u8>,
    ) -> Result<(), PacketError> {
        let attribute = match vendor_id {
            Some(vendor_id) => Attribute::vendor(vendor_id, attr_type, value)?,
            None => Attribute::new(attr_type, value)?,
        };
        self.attributes.push(attribute);
        Ok(())
    }

    /// Remove every standard attribute of `attr_type`, returning how many were removed
    pub fn remove_attributes(&mut self, attr_type: u8) -> usize {
        let before = self.attributes.len();
        self.attributes
            .retain(|a| !(a.vendor_id.is_none() && a.attr_type == attr_type));
        before - self.attributes.len()
    }

    /// Replace all attributes of the same standard type with `attribute`
    pub fn set_attribute(&mut self, attribute: Attribute) {
        self.remove_attributes(attribute.attr_type);
        self.attributes.push(attribute);
    }

    /// Find first attribute by type
    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.vendor_id.is_none() && a.attr_type == attr_type)
    }

    /// Find all attributes by type
    pub fn find_all_attributes(&self, attr_type: u8) -> Vec<&Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.vendor_id.is_none() && a.attr_type == attr_type)
            .collect()
    }

    /// First attribute of `attr_type`, or [`PacketError::AttributeNotFound`]
    pub fn get_attribute(&self, attr_type: u8) -> Result<&Attribute, PacketError> {
        self.find_attribute(attr_type)
            .ok_or(PacketError::AttributeNotFound(attr_type))
    }

    pub fn find_vendor_attribute(&self, vendor_id: u32, vendor_type: u8) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.vendor_id == Some(vendor_id) && a.attr_type == vendor_type)
    }

    /// User-Name as a string, if present and valid UTF-8
    pub fn user_name(&self) -> Option<String> {
        self.find_attribute(AttributeType::UserName.as_u8())
            .and_then(|a| a.as_string().ok())
    }

    /// Get the length of the encoded packet
    pub fn length(&self) -> usize {
        Self::HEADER_LENGTH
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    /// Encoded attribute section
    pub fn attribute_bytes(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.length() - Self::HEADER_LENGTH);
        for attr in &self.attributes {
            attr.encode_into(&mut buffer)?;
        }
        Ok(buffer)
    }

    /// Total packet length for an attribute section of `attributes_len` octets
    pub fn checked_length(attributes_len: usize) -> Result<u16, PacketError> {
        let total = Self::HEADER_LENGTH + attributes_len;
        if total > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLong(total));
        }
        Ok(total as u16)
    }

    /// Serialize with an explicit authenticator field.
    pub(crate) fn encode_with_authenticator(
        &self,
        authenticator: &[u8; 16],
    ) -> Result<Vec<u8>, PacketError> {
        let attributes = self.attribute_bytes()?;
        let length = Self::checked_length(attributes.len())?;

        let mut buffer = Vec::with_capacity(length as usize);
        buffer.push(self.code.as_u8());
        buffer.push(self.identifier);
        buffer.extend_from_slice(&length.to_be_bytes());
        buffer.extend_from_slice(authenticator);
        buffer.extend_from_slice(&attributes);
        Ok(buffer)
    }

    /// Encode packet to bytes
    ///
    /// Only encoded packets (those carrying an authenticator) are wire-ready.
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let authenticator = self.authenticator.ok_or_else(|| {
            PacketError::malformed("packet has no authenticator, encode it before sending")
        })?;
        self.encode_with_authenticator(&authenticator)
    }

    /// Finalize a request whose authenticator is the RFC 2866 hash over the
    /// packet with a zeroed authenticator field.
    pub fn encode_hashed_request(&self, secret: &[u8]) -> Result<Packet, PacketError> {
        let mut encoded = self.clone();
        message_auth::fill_message_authenticator(&mut encoded, &[0u8; 16], secret)?;
        encoded.authenticator = Some(auth::calculate_accounting_request_authenticator(
            &encoded, secret,
        )?);
        Ok(encoded)
    }

    /// Finalize a request with a fresh random authenticator.
    pub fn encode_random_request(&self, secret: &[u8]) -> Result<Packet, PacketError> {
        let authenticator = auth::generate_request_authenticator();
        self.encode_random_request_with(secret, authenticator)
    }

    pub(crate) fn encode_random_request_with(
        &self,
        secret: &[u8],
        authenticator: [u8; 16],
    ) -> Result<Packet, PacketError> {
        let mut encoded = self.clone();
        message_auth::fill_message_authenticator(&mut encoded, &authenticator, secret)?;
        Self::checked_length(encoded.length() - Self::HEADER_LENGTH)?;
        encoded.authenticator = Some(authenticator);
        Ok(encoded)
    }

    /// Finalize a response bound to the request authenticator.
    pub fn encode_response(
        &self,
        secret: &[u8],
        request_authenticator: &[u8; 16],
    ) -> Result<Packet, PacketError> {
        let mut encoded = self.clone();
        message_auth::fill_message_authenticator(&mut encoded, request_authenticator, secret)?;
        encoded.authenticator = Some(auth::calculate_response_authenticator(
            &encoded,
            request_authenticator,
            secret,
        )?);
        Ok(encoded)
    }

    /// Parse and check the fixed header against the datagram size.
    ///
    /// Any declared or actual size outside `[20, 4096]` is
    /// [`PacketError::PacketTooLong`]; a length field that disagrees with the
    /// datagram size is [`PacketError::Malformed`].
    pub fn decode_header(data: &[u8]) -> Result<Header, PacketError> {
        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&data.len()) {
            return Err(PacketError::PacketTooLong(data.len()));
        }

        let length = u16::from_be_bytes([data[2], data[3]]);
        let declared = length as usize;
        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&declared) {
            return Err(PacketError::PacketTooLong(declared));
        }
        if declared != data.len() {
            return Err(PacketError::malformed(format!(
                "length field {} does not match datagram size {}",
                declared,
                data.len()
            )));
        }

        let mut authenticator = [0u8; 16];
        authenticator.copy_from_slice(&data[4..Self::HEADER_LENGTH]);

        Ok(Header {
            code: Code::from_u8(data[0]),
            identifier: data[1],
            length,
            authenticator,
        })
    }

    /// Decode packet from bytes
    ///
    /// Structural decode only: the authenticator is taken as received.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        let header = Self::decode_header(data)?;

        let mut attributes = Vec::new();
        let mut attr_data = &data[Self::HEADER_LENGTH..];

        while !attr_data.is_empty() {
            let attr = Attribute::decode(attr_data)?;
            let attr_len = attr.encoded_length();
            attributes.push(attr);
            attr_data = &attr_data[attr_len..];
        }

        Ok(Packet {
            code: header.code,
            identifier: header.identifier,
            authenticator: Some(header.authenticator),
            attributes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_encode_decode() {
        let packet = Packet::with_authenticator(Code::AccessRequest, 42, [1u8; 16]);
        let encoded = packet.encode().unwrap();
        let decoded = Packet::decode(&encoded).unwrap();

        assert_eq!(decoded.code, Code::AccessRequest);
        assert_eq!(decoded.identifier, 42);
        assert_eq!(decoded.authenticator, Some([1u8; 16]));
    }

    #[test]
    fn test_packet_min_size() {
        let data = vec![0u8; 19]; // Less than minimum
        assert!(matches!(
            Packet::decode(&data),
            Err(PacketError::PacketTooLong(19))
        ));
    }

    #[test]
    fn test_unencoded_packet_is_not_wire_ready() {
        let packet = Packet::new(Code::AccessAccept, 1);
        assert!(matches!(packet.encode(), Err(PacketError::Malformed(_))));
    }

    #[test]
    fn test_attribute_accessors() {
        let mut packet = Packet::new(Code::AccountingRequest, 7);
        packet.add(None, 33, b"one".to_vec()).unwrap();
        packet.add(None, 1, b"bob".to_vec()).unwrap();
        packet.add(None, 33, b"two".to_vec()).unwrap();
        packet.add(Some(9), 33, b"vendor".to_vec()).unwrap();

        assert_eq!(packet.get_attribute(33).unwrap().value, b"one");
        let all: Vec<_> = packet
            .find_all_attributes(33)
            .iter()
            .map(|a| a.value.clone())
            .collect();
        assert_eq!(all, vec![b"one".to_vec(), b"two".to_vec()]);
        assert!(packet.find_all_attributes(44).is_empty());
        assert!(matches!(
            packet.get_attribute(44),
            Err(PacketError::AttributeNotFound(44))
        ));
        assert_eq!(packet.find_vendor_attribute(9, 33).unwrap().value, b"vendor");
        assert_eq!(packet.user_name().as_deref(), Some("bob"));

        assert_eq!(packet.remove_attributes(33), 2);
        assert_eq!(packet.attributes.len(), 2);
    }

    #[test]
    fn test_add_rejects_oversized_value() {
        let mut packet = Packet::new(Code::AccessRequest, 1);
        assert!(matches!(
            packet.add(None, 33, vec![0u8; 254]),
            Err(PacketError::ValueTooLarge { .. })
        ));
        assert!(packet.attributes.is_empty());
    }

    #[test]
    fn test_decode_header_length_mismatch() {
        let packet = Packet::with_authenticator(Code::AccessAccept, 1, [0u8; 16]);
        let mut bytes = packet.encode().unwrap();
        bytes.push(0);
        assert!(matches!(
            Packet::decode(&bytes),
            Err(PacketError::Malformed(_))
        ));

        bytes.pop();
        bytes[2] = 0;
        bytes[3] = 19;
        assert!(matches!(
            Packet::decode(&bytes),
            Err(PacketError::PacketTooLong(19))
        ));
    }

    #[test]
    fn test_encode_never_mutates_builder() {
        let mut builder = Packet::new(Code::Other(200), 250);
        builder.add(None, 33, b"state".to_vec()).unwrap();
        let snapshot = builder.clone();

        let encoded = builder.encode_hashed_request(b"secret").unwrap();
        assert_eq!(builder, snapshot);
        assert!(builder.authenticator.is_none());
        assert!(encoded.authenticator.is_some());
        assert_eq!(encoded.attributes, builder.attributes);
    }
}
