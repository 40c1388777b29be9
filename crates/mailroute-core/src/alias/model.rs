//! Alias aggregate and its rendering.
//!
//! Local aliases render in `/etc/aliases` syntax (`name: a, b`), virtual
//! aliases in virtual(5) syntax (`name@domain a, b`).

use std::fmt;

use crate::address::{Address, AddressId};

/// One delivery destination of an alias, projected from a link row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub(crate) link_id: i64,
    pub(crate) target: Option<Address>,
    pub(crate) extension: Option<String>,
}

impl Recipient {
    /// Id of the underlying link row.
    #[must_use]
    pub const fn link_id(&self) -> i64 {
        self.link_id
    }

    /// The target address, `None` for pipe, file and include recipients.
    #[must_use]
    pub const fn target(&self) -> Option<&Address> {
        self.target.as_ref()
    }

    /// The plus-extension, or the text of a pipe, file or include.
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Returns true for pipe, file and include recipients.
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.target.is_none()
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.target, &self.extension) {
            (Some(target), Some(ext)) => {
                write!(f, "{}+{ext}", target.local_part)?;
                if let Some(domain) = &target.domain {
                    write!(f, "@{domain}")?;
                }
                Ok(())
            }
            (Some(target), None) => write!(f, "{target}"),
            (None, Some(text)) => write!(f, "{text}"),
            // Rejected on insert; renders as nothing if it ever shows up.
            (None, None) => Ok(()),
        }
    }
}

/// An owner address with its recipients in link creation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub(crate) owner: Address,
    pub(crate) recipients: Vec<Recipient>,
}

impl Alias {
    /// The alias identity is its owner address.
    #[must_use]
    pub const fn id(&self) -> AddressId {
        self.owner.id
    }

    /// The owning address.
    #[must_use]
    pub const fn owner(&self) -> &Address {
        &self.owner
    }

    /// Recipients in the order they were added.
    #[must_use]
    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.owner.is_local() {
            write!(f, "{}: ", self.owner)?;
        } else {
            write!(f, "{} ", self.owner)?;
        }
        for (i, recipient) in self.recipients.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{recipient}")?;
        }
        Ok(())
    }
}
