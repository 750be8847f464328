use super::{Code, Packet, PacketError};
use crate::accounting::AcctStatusType;
use crate::attributes::{Attribute, AttributeType};

/// Accounting-Request (code 4), RFC 2866
///
/// A freshly built request carries `Acct-Status-Type = Accounting-On` until
/// the caller sets another status. The Request Authenticator is the
/// RFC 2866 hash computed at encode time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountingRequest {
    packet: Packet,
}

impl AccountingRequest {
    pub fn new(identifier: u8) -> Self {
        let mut packet = Packet::new(Code::AccountingRequest, identifier);
        packet.add_attribute(AcctStatusType::AccountingOn.to_attribute());
        AccountingRequest { packet }
    }

    pub fn with_status(
        identifier: u8,
        user_name: &str,
        status: AcctStatusType,
    ) -> Result<Self, PacketError> {
        let mut request = Self::new(identifier);
        request.set_acct_status_type(status);
        request.set_user_name(user_name)?;
        Ok(request)
    }

    /// Wrap a decoded packet as-is.
    pub(crate) fn from_packet(packet: Packet) -> Self {
        AccountingRequest { packet }
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

    pub fn set_acct_status_type(&mut self, status: AcctStatusType) {
        self.packet.set_attribute(status.to_attribute());
    }

    pub fn acct_status_type(&self) -> Result<AcctStatusType, PacketError> {
        AcctStatusType::from_attribute(
            self.packet
                .get_attribute(AttributeType::AcctStatusType.as_u8())?,
        )
    }

    /// Finalize with the RFC 2866 Request Authenticator.
    pub fn encode_request(&self, secret: &[u8]) -> Result<AccountingRequest, PacketError> {
        Ok(AccountingRequest {
            packet: self.packet.encode_hashed_request(secret)?,
        })
    }
}
