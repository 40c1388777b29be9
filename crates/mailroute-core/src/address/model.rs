//! Address model.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Domain;

/// Unique identifier for an address row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressId(pub i64);

impl AddressId {
    /// Create a new address ID.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }
}

impl fmt::Display for AddressId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted address.
///
/// Without a domain it is a local (`/etc/aliases`) name, otherwise a
/// virtual address in that domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Row identifier.
    pub id: AddressId,
    /// Local part, without any extension.
    pub local_part: String,
    /// Owning domain, `None` for local addresses.
    pub domain: Option<Domain>,
}

impl Address {
    /// Returns true if this address has no domain.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        self.domain.is_none()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.domain {
            Some(domain) => write!(f, "{}@{domain}", self.local_part),
            None => write!(f, "{}", self.local_part),
        }
    }
}
