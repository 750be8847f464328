use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    /// Declared or actual length outside `[20, 4096]`
    #[error("packet too long: {0} octets (valid range is 20..=4096)")]
    PacketTooLong(usize),
    /// Header or attribute framing is inconsistent
    #[error("malformed packet: {0}")]
    Malformed(String),
    /// Packet authenticator did not match the recomputed value
    #[error("authenticator check failed")]
    AuthenticatorMismatch,
    /// Message-Authenticator attribute did not match the recomputed HMAC
    #[error("message authenticator check failed")]
    MessageAuthenticatorMismatch,
    /// Attribute value does not fit the 255 octet TLV framing
    #[error("attribute {attr_type} value too large: {len} octets (max {max})")]
    ValueTooLarge {
        attr_type: u8,
        len: usize,
        max: usize,
    },
    #[error("attribute {0} not found")]
    AttributeNotFound(u8),
    #[error("invalid attribute value: {0}")]
    InvalidValue(String),
    #[error("decoding password failed: {0}")]
    InvalidPassword(String),
}

impl PacketError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        PacketError::Malformed(reason.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert!(
            PacketError::PacketTooLong(4097)
                .to_string()
                .contains("packet too long")
        );
        assert_eq!(
            PacketError::AuthenticatorMismatch.to_string(),
            "authenticator check failed"
        );
        assert_eq!(
            PacketError::malformed("truncated").to_string(),
            "malformed packet: truncated"
        );
    }

    #[test]
    fn test_errors_are_shareable() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<PacketError>();
    }
}
