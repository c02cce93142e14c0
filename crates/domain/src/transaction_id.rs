use serde::{Deserialize, Serialize};
use std::fmt;

/// 16-bit DNS message id correlating a query with its response.
///
/// On the wire it occupies the first two bytes of every message, big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(u16);

impl TransactionId {
    pub const WIRE_LEN: usize = 2;

    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u16 {
        self.0
    }

    /// Reads the id from the leading bytes of a wire-format message.
    ///
    /// Returns `None` when the message is too short to carry one.
    pub fn from_wire(message: &[u8]) -> Option<Self> {
        match message {
            [hi, lo, ..] => Some(Self(u16::from_be_bytes([*hi, *lo]))),
            _ => None,
        }
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        self.0.to_be_bytes()
    }
}

impl From<u16> for TransactionId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl From<TransactionId> for u16 {
    fn from(id: TransactionId) -> Self {
        id.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
