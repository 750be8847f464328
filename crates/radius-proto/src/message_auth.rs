//! Message-Authenticator Support (RFC 2869, RFC 3579)
//!
//! Message-Authenticator (type 80) provides integrity protection using
//! HMAC-MD5 keyed with the shared secret. It is computed over the entire
//! packet with:
//! - the Message-Authenticator value set to sixteen zero octets
//! - the Authenticator field holding the request authenticator (Access-Request,
//!   Status-Server), zeros (Accounting, CoA and Disconnect requests) or the
//!   original request's authenticator (all responses)
//!
//! The packet authenticator is computed afterwards, so it covers the final
//! Message-Authenticator value.

use crate::attributes::{Attribute, AttributeType};
use crate::packet::{Packet, PacketError};
use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

/// Message-Authenticator value length
pub const MESSAGE_AUTHENTICATOR_LENGTH: usize = 16;

fn hmac_md5(secret: &[u8]) -> Result<HmacMd5, PacketError> {
    HmacMd5::new_from_slice(secret)
        .map_err(|e| PacketError::InvalidValue(format!("HMAC key rejected: {}", e)))
}

/// Calculate Message-Authenticator for a RADIUS packet
///
/// # Arguments
/// * `packet_bytes` - The complete RADIUS packet bytes with Message-Authenticator set to zeros
/// * `secret` - The shared secret
pub fn calculate_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let mut mac = hmac_md5(secret)?;
    mac.update(packet_bytes);
    let bytes = mac.finalize().into_bytes();

    let mut output = [0u8; 16];
    output.copy_from_slice(&bytes);
    Ok(output)
}

/// Verify Message-Authenticator in a RADIUS packet
///
/// # Arguments
/// * `packet_bytes` - The complete RADIUS packet bytes, authenticator field as hashed
/// * `secret` - The shared secret
/// * `message_auth_offset` - Byte offset where Message-Authenticator value starts (after type+length)
pub fn verify_message_authenticator(
    packet_bytes: &[u8],
    secret: &[u8],
    message_auth_offset: usize,
) -> Result<bool, PacketError> {
    let end = message_auth_offset + MESSAGE_AUTHENTICATOR_LENGTH;
    if end > packet_bytes.len() {
        return Ok(false);
    }

    let mut packet_copy = packet_bytes.to_vec();
    packet_copy[message_auth_offset..end].fill(0);

    let mut mac = hmac_md5(secret)?;
    mac.update(&packet_copy);
    Ok(mac.verify_slice(&packet_bytes[message_auth_offset..end]).is_ok())
}

/// Compute the Message-Authenticator of `packet` in place, if it carries one.
///
/// `authenticator` is the value the Authenticator field holds while hashing.
pub fn fill_message_authenticator(
    packet: &mut Packet,
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<(), PacketError> {
    let Some(index) = packet
        .attributes
        .iter()
        .position(|a| a.is(AttributeType::MessageAuthenticator))
    else {
        return Ok(());
    };

    packet.attributes[index] = Attribute::new(
        AttributeType::MessageAuthenticator.as_u8(),
        vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH],
    )?;
    let bytes = packet.encode_with_authenticator(authenticator)?;
    packet.attributes[index].value = calculate_message_authenticator(&bytes, secret)?.to_vec();
    Ok(())
}

/// Offset of the first Message-Authenticator value in an encoded packet
pub fn find_message_authenticator(datagram: &[u8]) -> Option<usize> {
    let mut offset = Packet::HEADER_LENGTH;
    while offset + Attribute::MIN_LENGTH <= datagram.len() {
        let attr_type = datagram[offset];
        let length = datagram[offset + 1] as usize;
        if length < Attribute::MIN_LENGTH {
            return None;
        }
        if attr_type == AttributeType::MessageAuthenticator.as_u8() {
            return Some(offset + Attribute::MIN_LENGTH);
        }
        offset += length;
    }
    None
}

/// Verify the Message-Authenticator of a received datagram, if present.
///
/// The authenticator field is replaced with `authenticator` before hashing.
pub fn verify_datagram(
    datagram: &[u8],
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<(), PacketError> {
    let Some(offset) = find_message_authenticator(datagram) else {
        return Ok(());
    };
    if datagram[offset - 1] as usize != Attribute::MIN_LENGTH + MESSAGE_AUTHENTICATOR_LENGTH {
        return Err(PacketError::malformed(format!(
            "Message-Authenticator length {} (expected 18)",
            datagram[offset - 1]
        )));
    }

    let mut hashed = datagram.to_vec();
    hashed[4..Packet::HEADER_LENGTH].copy_from_slice(authenticator);
    if verify_message_authenticator(&hashed, secret, offset)? {
        Ok(())
    } else {
        Err(PacketError::MessageAuthenticatorMismatch)
    }
}
