use super::{Code, Packet, PacketError};
use crate::attributes::{Attribute, AttributeType};
use crate::auth::{decrypt_user_password, encrypt_user_password, generate_request_authenticator};
use crate::chap::{ChapPassword, generate_chap_challenge};

/// How the user's password is carried in an Access-Request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthProtocol {
    /// User-Password, obfuscated per RFC 2865 Section 5.2
    #[default]
    Pap,
    /// CHAP-Password and CHAP-Challenge, RFC 2865 Section 5.3
    Chap,
}

/// Access-Request (code 1)
///
/// The plaintext password is held outside the attribute list. Encoding
/// draws a fresh random Request Authenticator and adds the password
/// attribute(s) for the selected [`AuthProtocol`]; decoding recovers the
/// plaintext of a PAP password with the shared secret.
///
/// A User-Password attribute pushed straight into the packet is never sent
/// as-is: on an unencoded packet its value is the plaintext, on an encoded
/// one it is recovered with the secret, and either way it is hidden again
/// under the new Request Authenticator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    packet: Packet,
    user_password: Option<Vec<u8>>,
    auth_protocol: AuthProtocol,
}

impl AccessRequest {
    /// Longest plaintext whose padded form fits one attribute (240 octets)
    pub const MAX_PASSWORD_LENGTH: usize = Attribute::MAX_VALUE_LENGTH / 16 * 16;

    pub fn new(identifier: u8) -> Self {
        AccessRequest {
            packet: Packet::new(Code::AccessRequest, identifier),
            user_password: None,
            auth_protocol: AuthProtocol::Pap,
        }
    }

    /// Access-Request with User-Name and a PAP password
    pub fn with_credentials(
        identifier: u8,
        user_name: &str,
        password: &str,
    ) -> Result<Self, PacketError> {
        let mut request = Self::new(identifier);
        request.set_user_name(user_name)?;
        request.set_user_password(password)?;
        Ok(request)
    }

    /// Wrap a decoded packet; the plaintext password is unknown.
    pub(crate) fn from_packet(packet: Packet) -> Self {
        let auth_protocol = if packet
            .find_attribute(AttributeType::ChapPassword.as_u8())
            .is_some()
        {
            AuthProtocol::Chap
        } else {
            AuthProtocol::Pap
        };
        AccessRequest {
            packet,
            user_password: None,
            auth_protocol,
        }
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    pub fn packet_mut(&mut self) -> &mut Packet {
        &mut self.packet
    }

    pub fn into_packet(self) -> Packet {
        self.packet
    }

    pub fn set_user_name(&mut self, user_name: &str) -> Result<(), PacketError> {
        self.packet.set_attribute(Attribute::string(
            AttributeType::UserName.as_u8(),
            user_name,
        )?);
        Ok(())
    }

    pub fn user_name(&self) -> Option<String> {
        self.packet.user_name()
    }

    /// Set the plaintext password; fails if it cannot be hidden in one attribute.
    pub fn set_user_password(&mut self, password: impl Into<Vec<u8>>) -> Result<(), PacketError> {
        let password = password.into();
        check_password_length(&password)?;
        self.user_password = Some(password);
        Ok(())
    }

    /// Plaintext password as text, if known and valid UTF-8
    pub fn user_password(&self) -> Option<&str> {
        self.user_password_bytes()
            .and_then(|password| std::str::from_utf8(password).ok())
    }

    /// Plaintext password octets, set by the caller or recovered while decoding
    pub fn user_password_bytes(&self) -> Option<&[u8]> {
        self.user_password.as_deref()
    }

    pub fn set_auth_protocol(&mut self, auth_protocol: AuthProtocol) {
        self.auth_protocol = auth_protocol;
    }

    pub fn auth_protocol(&self) -> AuthProtocol {
        self.auth_protocol
    }

    /// Finalize for sending: random Request Authenticator plus password hiding.
    pub fn encode_request(&self, secret: &[u8]) -> Result<AccessRequest, PacketError> {
        self.encode_request_with(secret, generate_request_authenticator())
    }

    pub(crate) fn encode_request_with(
        &self,
        secret: &[u8],
        authenticator: [u8; 16],
    ) -> Result<AccessRequest, PacketError> {
        let mut builder = self.packet.clone();
        let user_password = match &self.user_password {
            Some(password) => Some(password.clone()),
            None => self.attribute_password(secret)?,
        };

        if let Some(password) = &user_password {
            builder.remove_attributes(AttributeType::UserPassword.as_u8());
            builder.remove_attributes(AttributeType::ChapPassword.as_u8());
            builder.remove_attributes(AttributeType::ChapChallenge.as_u8());

            match self.auth_protocol {
                AuthProtocol::Pap => {
                    builder.add_attribute(Attribute::new(
                        AttributeType::UserPassword.as_u8(),
                        encrypt_user_password(password, secret, &authenticator),
                    )?);
                }
                AuthProtocol::Chap => {
                    let challenge = generate_chap_challenge();
                    let chap = ChapPassword::generate(password, &challenge);
                    builder.add_attribute(Attribute::new(
                        AttributeType::ChapChallenge.as_u8(),
                        challenge.to_vec(),
                    )?);
                    builder.add_attribute(Attribute::new(
                        AttributeType::ChapPassword.as_u8(),
                        chap.to_bytes(),
                    )?);
                }
            }
        }

        Ok(AccessRequest {
            packet: builder.encode_random_request_with(secret, authenticator)?,
            user_password,
            auth_protocol: self.auth_protocol,
        })
    }

    /// Plaintext of a User-Password attribute present in the packet itself.
    fn attribute_password(&self, secret: &[u8]) -> Result<Option<Vec<u8>>, PacketError> {
        let Some(attr) = self
            .packet
            .find_attribute(AttributeType::UserPassword.as_u8())
        else {
            return Ok(None);
        };

        let password = match &self.packet.authenticator {
            Some(authenticator) => decrypt_user_password(&attr.value, secret, authenticator)?,
            None => attr.value.clone(),
        };
        check_password_length(&password)?;
        Ok(Some(password))
    }

    /// Wrap a received packet, recovering a PAP password with `secret`.
    pub(crate) fn decode_request(packet: Packet, secret: &[u8]) -> Result<Self, PacketError> {
        let mut request = Self::from_packet(packet);

        if let Some(attr) = request
            .packet
            .find_attribute(AttributeType::UserPassword.as_u8())
        {
            let authenticator = request
                .packet
                .authenticator
                .ok_or_else(|| PacketError::malformed("Access-Request without authenticator"))?;
            request.user_password =
                Some(decrypt_user_password(&attr.value, secret, &authenticator)?);
        }

        Ok(request)
    }

    /// Check a candidate plaintext password against the request's credentials.
    pub fn verify_password(&self, plaintext: &str) -> Result<bool, PacketError> {
        match self.auth_protocol {
            AuthProtocol::Pap => self
                .user_password
                .as_deref()
                .map(|password| password == plaintext.as_bytes())
                .ok_or(PacketError::AttributeNotFound(
                    AttributeType::UserPassword.as_u8(),
                )),
            AuthProtocol::Chap => {
                let chap = ChapPassword::from_bytes(
                    &self
                        .packet
                        .get_attribute(AttributeType::ChapPassword.as_u8())?
                        .value,
                )?;
                // RFC 2865 5.3: without CHAP-Challenge the Request Authenticator is the challenge
                let challenge = match self
                    .packet
                    .find_attribute(AttributeType::ChapChallenge.as_u8())
                {
                    Some(attr) => attr.value.clone(),
                    None => self
                        .packet
                        .authenticator
                        .ok_or_else(|| {
                            PacketError::malformed("Access-Request without authenticator")
                        })?
                        .to_vec(),
                };
                Ok(chap.verify(plaintext, &challenge))
            }
        }
    }
}

fn check_password_length(password: &[u8]) -> Result<(), PacketError> {
    if password.len() > AccessRequest::MAX_PASSWORD_LENGTH {
        return Err(PacketError::ValueTooLarge {
            attr_type: AttributeType::UserPassword.as_u8(),
            len: password.len(),
            max: AccessRequest::MAX_PASSWORD_LENGTH,
        });
    }
    Ok(())
}
