//! Error types for the routing database.

use thiserror::Error;

/// Errors that can occur in routing database operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed domain or address name.
    #[error("Bad name: {0}")]
    BadName(String),

    /// No address row for this local part (in an existing domain).
    #[error("Address not found")]
    AddressNotFound,

    /// No domain row with this name.
    #[error("Domain not found")]
    DomainNotFound,

    /// Domain still has addresses referencing it.
    #[error("Domain is in use: {0}")]
    DomainInUse(String),

    /// Address exists but has no alias link rows.
    #[error("Address is not an alias")]
    NotAlias,

    /// A lookup pattern matched no address with alias link rows.
    #[error("No aliases found")]
    NoAliases,

    /// Alias creation requested without recipients.
    #[error("Alias requires at least one recipient")]
    NoRecipients,

    /// A virtual alias cannot deliver to a pipe, file or include.
    #[error("Virtual alias cannot have a non-address recipient")]
    AddrNoAddr,

    /// A link row references a target inconsistent with its owner.
    #[error("Alias target is inconsistent with its owner")]
    AddressTarget,

    /// No link row matches the recipient to remove.
    #[error("Recipient not found")]
    RecipientNotFound,
}

impl Error {
    /// Creates a bad name error.
    #[must_use]
    pub fn bad_name(message: impl Into<String>) -> Self {
        Self::BadName(message.into())
    }

    /// Returns true if this is an address or domain resolution miss.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::AddressNotFound | Self::DomainNotFound)
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
