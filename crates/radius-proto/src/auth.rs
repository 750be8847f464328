//! Authenticator engine
//!
//! Every value here is derived from MD5 as pinned by RFC 2865/2866. The
//! functions are pure: they never touch a [`Packet`]'s storage and can be
//! called concurrently from any thread.

use crate::packet::{Packet, PacketError};
use rand::Rng;

/// Length of the Authenticator field
pub const AUTHENTICATOR_LENGTH: usize = 16;

/// Generate a random Request Authenticator (16 bytes) per RFC 2865 Section 3
pub fn generate_request_authenticator() -> [u8; 16] {
    let mut rng = rand::rng();
    let mut authenticator = [0u8; 16];
    rng.fill(&mut authenticator);
    authenticator
}

/// MD5(Code + ID + Length + Authenticator + Attributes + Secret)
///
/// Shared by the response authenticator (RFC 2865 Section 3) and the
/// accounting-style request authenticator (RFC 2866 Section 3), which differ
/// only in the authenticator octets hashed.
pub fn hash_authenticator(
    code: u8,
    identifier: u8,
    length: u16,
    authenticator: &[u8; 16],
    attributes: &[u8],
    secret: &[u8],
) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume([code, identifier]);
    context.consume(length.to_be_bytes());
    context.consume(authenticator);
    context.consume(attributes);
    context.consume(secret);
    context.compute().0
}

/// Hash an encoded datagram with its authenticator field replaced by
/// `authenticator`.
///
/// The length field is taken from the octets as received. Callers pass a
/// datagram already accepted by [`Packet::decode_header`].
pub(crate) fn hash_datagram(
    datagram: &[u8],
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    if datagram.len() < Packet::HEADER_LENGTH {
        return Err(PacketError::PacketTooLong(datagram.len()));
    }
    let mut context = md5::Context::new();
    context.consume(&datagram[..4]);
    context.consume(authenticator);
    context.consume(&datagram[Packet::HEADER_LENGTH..]);
    context.consume(secret);
    Ok(context.compute().0)
}

/// Calculate Response Authenticator per RFC 2865 Section 3
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// This is used for Access-Accept, Access-Reject, Access-Challenge,
/// Accounting-Response and the CoA/Disconnect replies.
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let attributes = packet.attribute_bytes()?;
    let length = Packet::checked_length(attributes.len())?;
    Ok(hash_authenticator(
        packet.code.as_u8(),
        packet.identifier,
        length,
        request_authenticator,
        &attributes,
        secret,
    ))
}

/// Calculate the Request Authenticator of an Accounting-Request per
/// RFC 2866 Section 3: the response formula with sixteen zero octets in
/// place of the request authenticator.
pub fn calculate_accounting_request_authenticator(
    packet: &Packet,
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    calculate_response_authenticator(packet, &[0u8; AUTHENTICATOR_LENGTH], secret)
}

/// Verify Response Authenticator
///
/// Verifies that the Response Authenticator matches the expected value
/// calculated from the request and secret. A packet without an
/// authenticator never verifies.
pub fn verify_response_authenticator(
    response: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<bool, PacketError> {
    let Some(received) = response.authenticator else {
        return Ok(false);
    };
    let calculated = calculate_response_authenticator(response, request_authenticator, secret)?;
    Ok(received == calculated)
}

/// XOR `block` with MD5(secret + key) in place
fn xor_keystream(block: &mut [u8], secret: &[u8], key: &[u8]) {
    let mut context = md5::Context::new();
    context.consume(secret);
    context.consume(key);
    let hash = context.compute();
    for (b, k) in block.iter_mut().zip(hash.0.iter()) {
        *b ^= k;
    }
}

/// Encrypt User-Password attribute per RFC 2865 Section 5.2
///
/// The password is first padded to a multiple of 16 bytes, then XORed with
/// MD5(secret + request_authenticator) for the first 16 bytes, and
/// MD5(secret + previous_block) for subsequent blocks. An empty password
/// still yields one block.
pub fn encrypt_user_password(
    password: impl AsRef<[u8]>,
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Vec<u8> {
    let mut result = password.as_ref().to_vec();
    let blocks = result.len().div_ceil(16).max(1);
    result.resize(blocks * 16, 0);

    let mut previous = *authenticator;
    for chunk in result.chunks_mut(16) {
        xor_keystream(chunk, secret, &previous);
        previous.copy_from_slice(chunk);
    }

    result
}

/// Decrypt User-Password attribute per RFC 2865 Section 5.2
///
/// The result is raw octets with the zero padding removed. Only the framing
/// is checked; a wrong secret yields garbage, not an error.
pub fn decrypt_user_password(
    encrypted: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<Vec<u8>, PacketError> {
    if encrypted.len() % 16 != 0 || encrypted.is_empty() {
        return Err(PacketError::InvalidPassword(format!(
            "length {} is not a positive multiple of 16",
            encrypted.len()
        )));
    }

    let mut result = encrypted.to_vec();
    let mut previous: &[u8] = authenticator;
    for (chunk, cipher) in result.chunks_mut(16).zip(encrypted.chunks(16)) {
        xor_keystream(chunk, secret, previous);
        previous = cipher;
    }

    // Remove padding (null bytes at the end)
    while result.last() == Some(&0) {
        result.pop();
    }

    Ok(result)
}
