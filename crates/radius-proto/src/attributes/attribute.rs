use super::dictionary::{AttributeValue, Dictionary};
use super::types::AttributeType;
use crate::packet::PacketError;

/// RADIUS Attribute structure as defined in RFC 2865 Section 5
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Type      |    Length     |  Value ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// Vendor attributes (`vendor_id` set) are framed inside a Vendor-Specific
/// (26) attribute per RFC 2865 Section 5.26:
///
/// ```text
/// | 26 | Length | Vendor-Id (4) | Vendor type | Vendor length | Value ...
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Vendor id, `None` for standard attributes
    pub vendor_id: Option<u32>,
    /// Attribute type (vendor type for vendor attributes)
    pub attr_type: u8,
    /// Raw attribute value
    pub value: Vec<u8>,
}

impl Attribute {
    /// Minimum attribute length (type + length fields = 2 bytes)
    pub const MIN_LENGTH: usize = 2;
    /// Maximum attribute length (255 bytes including type and length)
    pub const MAX_LENGTH: usize = 255;
    /// Maximum value length (253 bytes)
    pub const MAX_VALUE_LENGTH: usize = 253;
    /// Vendor-Id plus vendor type and vendor length
    const VENDOR_HEADER_LENGTH: usize = 6;
    /// Maximum value length of a vendor attribute (247 bytes)
    pub const MAX_VENDOR_VALUE_LENGTH: usize =
        Self::MAX_VALUE_LENGTH - Self::VENDOR_HEADER_LENGTH;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(PacketError::ValueTooLarge {
                attr_type,
                len: value.len(),
                max: Self::MAX_VALUE_LENGTH,
            });
        }
        Ok(Attribute {
            vendor_id: None,
            attr_type,
            value,
        })
    }

    /// Create a vendor attribute carried in a Vendor-Specific wrapper
    pub fn vendor(vendor_id: u32, vendor_type: u8, value: Vec<u8>) -> Result<Self, PacketError> {
        if value.len() > Self::MAX_VENDOR_VALUE_LENGTH {
            return Err(PacketError::ValueTooLarge {
                attr_type: vendor_type,
                len: value.len(),
                max: Self::MAX_VENDOR_VALUE_LENGTH,
            });
        }
        Ok(Attribute {
            vendor_id: Some(vendor_id),
            attr_type: vendor_type,
            value,
        })
    }

    /// Create a string attribute
    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, PacketError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    /// Create an integer attribute (32-bit big-endian)
    pub fn integer(attr_type: u8, value: u32) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_be_bytes().to_vec())
    }

    /// Create an IP address attribute
    pub fn ipv4(attr_type: u8, value: [u8; 4]) -> Result<Self, PacketError> {
        Self::new(attr_type, value.to_vec())
    }

    /// Create an attribute from a typed value using the dictionary codec
    pub fn from_value(
        dictionary: &dyn Dictionary,
        vendor_id: Option<u32>,
        attr_type: u8,
        value: &AttributeValue,
    ) -> Result<Self, PacketError> {
        let raw = dictionary.codec(vendor_id, attr_type).encode(value)?;
        match vendor_id {
            Some(vendor_id) => Self::vendor(vendor_id, attr_type, raw),
            None => Self::new(attr_type, raw),
        }
    }

    /// Create an attribute by dictionary name, e.g. `"Framed-IP-Address"`
    pub fn named(
        dictionary: &dyn Dictionary,
        name: &str,
        value: &AttributeValue,
    ) -> Result<Self, PacketError> {
        let definition = dictionary
            .lookup_name(name)
            .ok_or_else(|| PacketError::InvalidValue(format!("unknown attribute: {}", name)))?;
        Self::from_value(dictionary, definition.vendor_id, definition.attr_type, value)
    }

    /// Append the wire form of this attribute to `buffer`
    pub fn encode_into(&self, buffer: &mut Vec<u8>) -> Result<(), PacketError> {
        let length = self.encoded_length();
        if length > Self::MAX_LENGTH {
            return Err(PacketError::ValueTooLarge {
                attr_type: self.attr_type,
                len: self.value.len(),
                max: match self.vendor_id {
                    None => Self::MAX_VALUE_LENGTH,
                    Some(_) => Self::MAX_VENDOR_VALUE_LENGTH,
                },
            });
        }

        match self.vendor_id {
            None => {
                buffer.push(self.attr_type);
                buffer.push(length as u8);
            }
            Some(vendor_id) => {
                buffer.push(AttributeType::VendorSpecific.as_u8());
                buffer.push(length as u8);
                buffer.extend_from_slice(&vendor_id.to_be_bytes());
                buffer.push(self.attr_type);
                buffer.push((Self::MIN_LENGTH + self.value.len()) as u8);
            }
        }
        buffer.extend_from_slice(&self.value);
        Ok(())
    }

    /// Encode attribute to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.encoded_length());
        self.encode_into(&mut buffer)?;
        Ok(buffer)
    }

    /// Decode one attribute from the front of `data`.
    ///
    /// The number of octets consumed is `encoded_length()` of the result. A
    /// Vendor-Specific attribute holding exactly one well-formed sub-attribute
    /// is returned as a vendor attribute; any other Vendor-Specific layout is
    /// kept opaque so that re-encoding reproduces the original octets.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_LENGTH {
            return Err(PacketError::malformed(format!(
                "attribute header truncated: {} octets left",
                data.len()
            )));
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::MIN_LENGTH {
            return Err(PacketError::malformed(format!(
                "attribute {} has invalid length {}",
                attr_type, length
            )));
        }

        if data.len() < length {
            return Err(PacketError::malformed(format!(
                "attribute {} length {} exceeds remaining {} octets",
                attr_type,
                length,
                data.len()
            )));
        }

        let value = &data[Self::MIN_LENGTH..length];

        if attr_type == AttributeType::VendorSpecific.as_u8()
            && let Some(vendor) = Self::split_vendor(value)
        {
            return Ok(vendor);
        }

        Ok(Attribute {
            vendor_id: None,
            attr_type,
            value: value.to_vec(),
        })
    }

    fn split_vendor(value: &[u8]) -> Option<Self> {
        if value.len() < Self::VENDOR_HEADER_LENGTH {
            return None;
        }
        let vendor_id = u32::from_be_bytes([value[0], value[1], value[2], value[3]]);
        let vendor_type = value[4];
        let vendor_length = value[5] as usize;
        if vendor_length < Self::MIN_LENGTH || 4 + vendor_length != value.len() {
            return None;
        }
        Some(Attribute {
            vendor_id: Some(vendor_id),
            attr_type: vendor_type,
            value: value[Self::VENDOR_HEADER_LENGTH..].to_vec(),
        })
    }

    /// Get the encoded length of this attribute
    pub fn encoded_length(&self) -> usize {
        match self.vendor_id {
            None => Self::MIN_LENGTH + self.value.len(),
            Some(_) => Self::MIN_LENGTH + Self::VENDOR_HEADER_LENGTH + self.value.len(),
        }
    }

    /// Whether this is the standard attribute `attr_type`
    pub fn is(&self, attr_type: AttributeType) -> bool {
        self.vendor_id.is_none() && self.attr_type == attr_type.as_u8()
    }

    /// Typed value according to the dictionary; unknown attributes are octets
    pub fn typed_value(&self, dictionary: &dyn Dictionary) -> Result<AttributeValue, PacketError> {
        dictionary
            .codec(self.vendor_id, self.attr_type)
            .decode(&self.value)
    }

    /// Try to interpret value as a string
    pub fn as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.value.clone())
    }

    /// Try to interpret value as an integer (32-bit big-endian)
    pub fn as_integer(&self) -> Result<u32, PacketError> {
        let bytes: [u8; 4] = self.value.as_slice().try_into().map_err(|_| {
            PacketError::InvalidValue(format!(
                "expected 4 bytes for integer, got {}",
                self.value.len()
            ))
        })?;
        Ok(u32::from_be_bytes(bytes))
    }

    /// Try to interpret value as an IPv4 address
    pub fn as_ipv4(&self) -> Result<[u8; 4], PacketError> {
        self.value.as_slice().try_into().map_err(|_| {
            PacketError::InvalidValue(format!(
                "expected 4 bytes for IPv4, got {}",
                self.value.len()
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::DefaultDictionary;

    #[test]
    fn test_string_attribute() {
        let attr = Attribute::string(1, "testuser").unwrap();
        assert_eq!(attr.attr_type, 1);
        assert_eq!(attr.as_string().unwrap(), "testuser");
        assert_eq!(attr.encode().unwrap(), b"\x01\x0atestuser");
    }

    #[test]
    fn test_integer_attribute() {
        let attr = Attribute::integer(6, 1234).unwrap();
        assert_eq!(attr.as_integer().unwrap(), 1234);
        assert!(Attribute::string(6, "abc").unwrap().as_integer().is_err());
    }

    #[test]
    fn test_max_value_length() {
        assert!(Attribute::new(33, vec![0u8; 253]).is_ok());
        let err = Attribute::new(33, vec![0u8; 254]).unwrap_err();
        assert!(matches!(
            err,
            PacketError::ValueTooLarge {
                attr_type: 33,
                len: 254,
                max: 253
            }
        ));
        assert!(Attribute::vendor(9, 1, vec![0u8; 248]).is_err());
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        assert!(matches!(
            Attribute::decode(&[1, 1]),
            Err(PacketError::Malformed(_))
        ));
        assert!(matches!(
            Attribute::decode(&[1, 5, b'a']),
            Err(PacketError::Malformed(_))
        ));
        assert!(matches!(Attribute::decode(&[1]), Err(PacketError::Malformed(_))));
        // Empty value is legal framing
        let empty = Attribute::decode(&[18, 2]).unwrap();
        assert!(empty.value.is_empty());
    }

    #[test]
    fn test_vendor_attribute_framing() {
        let attr = Attribute::vendor(9, 1, b"shell:priv-lvl=15".to_vec()).unwrap();
        let encoded = attr.encode().unwrap();
        assert_eq!(encoded[0], 26);
        assert_eq!(encoded[1] as usize, encoded.len());
        assert_eq!(&encoded[2..6], &9u32.to_be_bytes());
        assert_eq!(encoded[6], 1);
        assert_eq!(encoded[7] as usize, 2 + 17);

        let decoded = Attribute::decode(&encoded).unwrap();
        assert_eq!(decoded, attr);
        assert_eq!(decoded.encoded_length(), encoded.len());
    }

    #[test]
    fn test_multi_vendor_sub_attributes_stay_opaque() {
        // Two sub-attributes in one Vendor-Specific wrapper
        let raw = [26, 12, 0, 0, 0, 9, 1, 3, b'a', 2, 3, b'b'];
        let decoded = Attribute::decode(&raw).unwrap();
        assert_eq!(decoded.vendor_id, None);
        assert_eq!(decoded.attr_type, 26);
        assert_eq!(decoded.encode().unwrap(), raw.to_vec());
    }

    #[test]
    fn test_named_attribute() {
        let dict = DefaultDictionary::new();
        let attr = Attribute::named(&dict, "NAS-IP-Address", &AttributeValue::Ipv4([10, 1, 2, 3].into()))
            .unwrap();
        assert_eq!(attr.attr_type, 4);
        assert_eq!(attr.as_ipv4().unwrap(), [10, 1, 2, 3]);
        assert_eq!(
            attr.typed_value(&dict).unwrap(),
            AttributeValue::Ipv4([10, 1, 2, 3].into())
        );
        assert!(Attribute::named(&dict, "No-Such-Attribute", &AttributeValue::Integer(1)).is_err());
    }
}
