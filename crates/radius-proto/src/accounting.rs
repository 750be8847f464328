//! RADIUS Accounting values (RFC 2866)
//!
//! Enumerated values of the integer accounting attributes. Accounting
//! packets themselves are modelled by
//! [`AccountingRequest`](crate::packet::AccountingRequest).
//!
//! # Example
//!
//! ```rust
//! use radius_proto::accounting::AcctStatusType;
//!
//! let attr = AcctStatusType::Start.to_attribute();
//! assert_eq!(attr.as_integer().unwrap(), 1);
//! assert_eq!(AcctStatusType::from_attribute(&attr).unwrap(), AcctStatusType::Start);
//! ```

use crate::attributes::{Attribute, AttributeType};
use crate::packet::PacketError;

/// Accounting Status-Type values (RFC 2866 Section 5.1)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctStatusType {
    /// Start (1) - Session has begun
    Start = 1,
    /// Stop (2) - Session has ended
    Stop = 2,
    /// Interim-Update (3) - Periodic update during session
    InterimUpdate = 3,
    /// Accounting-On (7) - NAS is ready
    AccountingOn = 7,
    /// Accounting-Off (8) - NAS is shutting down
    AccountingOff = 8,
}

impl AcctStatusType {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AcctStatusType::Start),
            2 => Some(AcctStatusType::Stop),
            3 => Some(AcctStatusType::InterimUpdate),
            7 => Some(AcctStatusType::AccountingOn),
            8 => Some(AcctStatusType::AccountingOff),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Acct-Status-Type attribute carrying this value
    pub fn to_attribute(self) -> Attribute {
        Attribute {
            vendor_id: None,
            attr_type: AttributeType::AcctStatusType.as_u8(),
            value: self.as_u32().to_be_bytes().to_vec(),
        }
    }

    pub fn from_attribute(attribute: &Attribute) -> Result<Self, PacketError> {
        let value = attribute.as_integer()?;
        Self::from_u32(value).ok_or_else(|| {
            PacketError::InvalidValue(format!("unknown Acct-Status-Type value: {}", value))
        })
    }
}

/// Acct-Terminate-Cause values (RFC 2866 Section 5.10)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctTerminateCause {
    UserRequest = 1,
    LostCarrier = 2,
    LostService = 3,
    IdleTimeout = 4,
    SessionTimeout = 5,
    AdminReset = 6,
    AdminReboot = 7,
    PortError = 8,
    NasError = 9,
    NasRequest = 10,
    NasReboot = 11,
    PortUnneeded = 12,
    PortPreempted = 13,
    PortSuspended = 14,
    ServiceUnavailable = 15,
    Callback = 16,
    UserError = 17,
    HostRequest = 18,
}

impl AcctTerminateCause {
    pub fn from_u32(value: u32) -> Option<Self> {
        use AcctTerminateCause::*;
        let cause = match value {
            1 => UserRequest,
            2 => LostCarrier,
            3 => LostService,
            4 => IdleTimeout,
            5 => SessionTimeout,
            6 => AdminReset,
            7 => AdminReboot,
            8 => PortError,
            9 => NasError,
            10 => NasRequest,
            11 => NasReboot,
            12 => PortUnneeded,
            13 => PortPreempted,
            14 => PortSuspended,
            15 => ServiceUnavailable,
            16 => Callback,
            17 => UserError,
            18 => HostRequest,
            _ => return None,
        };
        Some(cause)
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn to_attribute(self) -> Attribute {
        Attribute {
            vendor_id: None,
            attr_type: AttributeType::AcctTerminateCause.as_u8(),
            value: self.as_u32().to_be_bytes().to_vec(),
        }
    }
}

/// Acct-Authentic values (RFC 2866 Section 5.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum AcctAuthentic {
    Radius = 1,
    Local = 2,
    Remote = 3,
}

impl AcctAuthentic {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(AcctAuthentic::Radius),
            2 => Some(AcctAuthentic::Local),
            3 => Some(AcctAuthentic::Remote),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }
}
