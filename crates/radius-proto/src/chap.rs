//! CHAP (Challenge-Handshake Authentication Protocol) Support
//!
//! CHAP credentials in an Access-Request as defined in RFC 2865 Section 5.3.
//! The client picks a challenge (carried in CHAP-Challenge, or the Request
//! Authenticator when that attribute is absent) and sends
//! `ident + MD5(ident + password + challenge)` in CHAP-Password.

use crate::packet::PacketError;
use rand::Rng;

/// Length of the challenge generated for outgoing requests
pub const CHAP_CHALLENGE_LENGTH: usize = 16;

/// CHAP-Password attribute value
///
/// - CHAP Identifier (1 byte)
/// - CHAP Response (16 bytes MD5 hash)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapPassword {
    /// CHAP identifier
    pub ident: u8,
    /// MD5 hash of (ident + password + challenge)
    pub response: [u8; 16],
}

impl ChapPassword {
    /// Encoded size of the attribute value
    pub const LENGTH: usize = 17;

    /// Compute a CHAP-Password for `password` with a random identifier
    pub fn generate(password: impl AsRef<[u8]>, challenge: &[u8]) -> Self {
        let ident = rand::rng().random::<u8>();
        ChapPassword {
            ident,
            response: compute_chap_response(ident, password, challenge),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PacketError> {
        if bytes.len() != Self::LENGTH {
            return Err(PacketError::InvalidValue(format!(
                "CHAP-Password must be {} octets, got {}",
                Self::LENGTH,
                bytes.len()
            )));
        }

        let mut response = [0u8; 16];
        response.copy_from_slice(&bytes[1..]);
        Ok(ChapPassword {
            ident: bytes[0],
            response,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(Self::LENGTH);
        bytes.push(self.ident);
        bytes.extend_from_slice(&self.response);
        bytes
    }

    /// Check a candidate plaintext password against this response
    pub fn verify(&self, password: impl AsRef<[u8]>, challenge: &[u8]) -> bool {
        compute_chap_response(self.ident, password, challenge) == self.response
    }
}

/// Generate a random CHAP challenge
pub fn generate_chap_challenge() -> [u8; CHAP_CHALLENGE_LENGTH] {
    let mut challenge = [0u8; CHAP_CHALLENGE_LENGTH];
    rand::rng().fill(&mut challenge);
    challenge
}

/// MD5(CHAP_Identifier + Password + Challenge)
pub fn compute_chap_response(ident: u8, password: impl AsRef<[u8]>, challenge: &[u8]) -> [u8; 16] {
    let mut context = md5::Context::new();
    context.consume([ident]);
    context.consume(password.as_ref());
    context.consume(challenge);
    context.compute().0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chap_password_bytes() {
        let chap = ChapPassword {
            ident: 0x42,
            response: [0xAB; 16],
        };
        let bytes = chap.to_bytes();
        assert_eq!(bytes.len(), 17);
        assert_eq!(bytes[0], 0x42);
        assert_eq!(ChapPassword::from_bytes(&bytes).unwrap(), chap);

        assert!(ChapPassword::from_bytes(&[0x01; 16]).is_err());
        assert!(ChapPassword::from_bytes(&[0x01; 18]).is_err());
    }

    #[test]
    fn test_compute_chap_response_matches_plain_md5() {
        let challenge = b"0123456789abcdef";
        let mut data = vec![0x01];
        data.extend_from_slice(b"password");
        data.extend_from_slice(challenge);

        assert_eq!(
            compute_chap_response(0x01, "password", challenge),
            md5::compute(&data).0
        );
        assert_ne!(
            compute_chap_response(0x02, "password", challenge),
            compute_chap_response(0x01, "password", challenge)
        );
    }

    #[test]
    fn test_generate_and_verify() {
        let challenge = generate_chap_challenge();
        let chap = ChapPassword::generate("MyPassword", &challenge);
        assert!(chap.verify("MyPassword", &challenge));
        assert!(!chap.verify("WrongPassword", &challenge));
        assert!(!chap.verify("MyPassword", b"another challenge"));
    }
}
