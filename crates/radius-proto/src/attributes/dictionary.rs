//! Attribute dictionary lookup
//!
//! A [`Dictionary`] maps `(vendor-id, type)` pairs and attribute names to
//! [`AttributeDefinition`]s. Each definition carries an [`AttributeDataType`],
//! which is the [`AttributeCodec`] converting between raw attribute octets
//! and typed [`AttributeValue`]s.
//!
//! The packet codec never consults the dictionary to frame attributes; it is
//! only used to interpret values. Dictionaries are read-only once built and
//! are shared between threads behind an `Arc`.

use super::types::AttributeType;
use crate::packet::PacketError;
use std::collections::HashMap;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Typed view of an attribute value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Text(String),
    Integer(u32),
    Ipv4(Ipv4Addr),
    Ipv6(Ipv6Addr),
    /// Seconds since the UNIX epoch
    Date(u32),
    Octets(Vec<u8>),
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Integer(v) | AttributeValue::Date(v) => write!(f, "{}", v),
            AttributeValue::Ipv4(addr) => write!(f, "{}", addr),
            AttributeValue::Ipv6(addr) => write!(f, "{}", addr),
            AttributeValue::Octets(bytes) => {
                f.write_str("0x")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// Converts between raw attribute octets and typed values
pub trait AttributeCodec: Send + Sync {
    fn encode(&self, value: &AttributeValue) -> Result<Vec<u8>, PacketError>;
    fn decode(&self, bytes: &[u8]) -> Result<AttributeValue, PacketError>;
}

/// Attribute data types from RFC 2865 Section 5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeDataType {
    String,
    Integer,
    IpAddr,
    Ipv6Addr,
    Date,
    Octets,
}

impl AttributeCodec for AttributeDataType {
    fn encode(&self, value: &AttributeValue) -> Result<Vec<u8>, PacketError> {
        match (self, value) {
            (AttributeDataType::String, AttributeValue::Text(s)) => Ok(s.as_bytes().to_vec()),
            (AttributeDataType::Integer, AttributeValue::Integer(v))
            | (AttributeDataType::Date, AttributeValue::Date(v))
            | (AttributeDataType::Date, AttributeValue::Integer(v)) => {
                Ok(v.to_be_bytes().to_vec())
            }
            (AttributeDataType::IpAddr, AttributeValue::Ipv4(addr)) => Ok(addr.octets().to_vec()),
            (AttributeDataType::Ipv6Addr, AttributeValue::Ipv6(addr)) => {
                Ok(addr.octets().to_vec())
            }
            (_, AttributeValue::Octets(bytes)) => Ok(bytes.clone()),
            (data_type, value) => Err(PacketError::InvalidValue(format!(
                "cannot encode {:?} as {:?}",
                value, data_type
            ))),
        }
    }

    fn decode(&self, bytes: &[u8]) -> Result<AttributeValue, PacketError> {
        match self {
            AttributeDataType::String => String::from_utf8(bytes.to_vec())
                .map(AttributeValue::Text)
                .map_err(|e| PacketError::InvalidValue(format!("invalid UTF-8: {}", e))),
            AttributeDataType::Integer => Ok(AttributeValue::Integer(be_u32(bytes)?)),
            AttributeDataType::Date => Ok(AttributeValue::Date(be_u32(bytes)?)),
            AttributeDataType::IpAddr => {
                let octets: [u8; 4] = bytes.try_into().map_err(|_| {
                    PacketError::InvalidValue(format!(
                        "expected 4 octets for ipaddr, got {}",
                        bytes.len()
                    ))
                })?;
                Ok(AttributeValue::Ipv4(Ipv4Addr::from(octets)))
            }
            AttributeDataType::Ipv6Addr => {
                let octets: [u8; 16] = bytes.try_into().map_err(|_| {
                    PacketError::InvalidValue(format!(
                        "expected 16 octets for ipv6addr, got {}",
                        bytes.len()
                    ))
                })?;
                Ok(AttributeValue::Ipv6(Ipv6Addr::from(octets)))
            }
            AttributeDataType::Octets => Ok(AttributeValue::Octets(bytes.to_vec())),
        }
    }
}

fn be_u32(bytes: &[u8]) -> Result<u32, PacketError> {
    let octets: [u8; 4] = bytes.try_into().map_err(|_| {
        PacketError::InvalidValue(format!("expected 4 octets for integer, got {}", bytes.len()))
    })?;
    Ok(u32::from_be_bytes(octets))
}

/// A single dictionary entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDefinition {
    pub name: String,
    /// `None` for standard attributes
    pub vendor_id: Option<u32>,
    pub attr_type: u8,
    pub data_type: AttributeDataType,
}

/// Read-only attribute lookup service
pub trait Dictionary: Send + Sync {
    fn resolve(&self, vendor_id: Option<u32>, attr_type: u8) -> Option<&AttributeDefinition>;

    fn lookup_name(&self, name: &str) -> Option<&AttributeDefinition>;

    /// Codec for a `(vendor-id, type)` pair; unknown attributes are opaque octets.
    fn codec(&self, vendor_id: Option<u32>, attr_type: u8) -> &dyn AttributeCodec {
        match self.resolve(vendor_id, attr_type) {
            Some(definition) => &definition.data_type,
            None => &AttributeDataType::Octets,
        }
    }
}

/// Dictionary preloaded with the standard RFC 2865/2866/2869 attributes
#[derive(Debug, Clone)]
pub struct DefaultDictionary {
    by_code: HashMap<(Option<u32>, u8), AttributeDefinition>,
    by_name: HashMap<String, (Option<u32>, u8)>,
}

impl DefaultDictionary {
    pub fn new() -> Self {
        let mut dictionary = DefaultDictionary {
            by_code: HashMap::new(),
            by_name: HashMap::new(),
        };
        for attr in AttributeType::ALL {
            dictionary.add(AttributeDefinition {
                name: attr.name().to_string(),
                vendor_id: None,
                attr_type: attr.as_u8(),
                data_type: attr.data_type(),
            });
        }
        dictionary
    }

    /// Add or replace a definition, typically a vendor attribute.
    pub fn add(&mut self, definition: AttributeDefinition) {
        let key = (definition.vendor_id, definition.attr_type);
        if let Some(previous) = self.by_code.get(&key) {
            self.by_name.remove(&previous.name.to_ascii_lowercase());
        }
        self.by_name
            .insert(definition.name.to_ascii_lowercase(), key);
        self.by_code.insert(key, definition);
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

impl Default for DefaultDictionary {
    fn default() -> Self {
        Self::new()
    }
}

impl Dictionary for DefaultDictionary {
    fn resolve(&self, vendor_id: Option<u32>, attr_type: u8) -> Option<&AttributeDefinition> {
        self.by_code.get(&(vendor_id, attr_type))
    }

    fn lookup_name(&self, name: &str) -> Option<&AttributeDefinition> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .and_then(|key| self.by_code.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dictionary_lookup() {
        let dict = DefaultDictionary::new();
        let def = dict.lookup_name("User-Name").unwrap();
        assert_eq!(def.attr_type, 1);
        assert_eq!(def.data_type, AttributeDataType::String);

        // Names are case-insensitive
        assert_eq!(dict.lookup_name("acct-status-type").unwrap().attr_type, 40);
        assert!(dict.resolve(None, 17).is_none());
        assert_eq!(dict.len(), AttributeType::ALL.len());
    }

    #[test]
    fn test_unknown_attribute_is_octets() {
        let dict = DefaultDictionary::new();
        let value = dict.codec(None, 250).decode(&[1, 2, 3]).unwrap();
        assert_eq!(value, AttributeValue::Octets(vec![1, 2, 3]));
    }

    #[test]
    fn test_vendor_definition() {
        let mut dict = DefaultDictionary::new();
        dict.add(AttributeDefinition {
            name: "Cisco-AVPair".to_string(),
            vendor_id: Some(9),
            attr_type: 1,
            data_type: AttributeDataType::String,
        });
        assert_eq!(dict.lookup_name("Cisco-AVPair").unwrap().vendor_id, Some(9));
        // Standard type 1 is untouched
        assert_eq!(dict.resolve(None, 1).unwrap().name, "User-Name");
    }

    #[test]
    fn test_codec_conversions() {
        let ip = AttributeDataType::IpAddr
            .encode(&AttributeValue::Ipv4(Ipv4Addr::new(10, 0, 0, 1)))
            .unwrap();
        assert_eq!(ip, vec![10, 0, 0, 1]);
        assert_eq!(
            AttributeDataType::Integer.decode(&[0, 0, 0, 7]).unwrap(),
            AttributeValue::Integer(7)
        );
        assert!(AttributeDataType::Integer.decode(&[0, 7]).is_err());
        assert!(
            AttributeDataType::Integer
                .encode(&AttributeValue::Text("x".into()))
                .is_err()
        );
    }
}
