//! # mailroute-core
//!
//! Mail routing configuration for postfix/dovecot, stored in `SQLite`.
//!
//! This crate provides:
//! - **Address parsing** - alias names, recipients, and `/etc/aliases`
//!   delivery forms (pipes, files, includes) with plus-extensions
//! - **Domains and addresses** - created on first reference, resolved by name
//! - **Alias lookup** - exact names and wildcard patterns (`*`, `*@domain`,
//!   `name@*`, `*@*`)
//! - **Alias editing** - transactional creation and removal of recipients
//!
//! # Example
//!
//! ```ignore
//! use mailroute_core::MailDb;
//!
//! let db = MailDb::new("/var/lib/mailroute/maildb.sqlite").await?;
//! db.make_alias("postmaster@example.org", &["root@example.org"]).await?;
//!
//! for alias in db.lookup_alias("*@example.org").await? {
//!     println!("{alias}"); // postmaster@example.org root@example.org
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod address;
pub mod alias;
pub mod config;
mod db;
pub mod domain;
mod error;

pub use address::{
    Address, AddressId, AddressParts, AddressPattern, RecipientForm, decode_rfc822, decode_target,
};
pub use alias::{Alias, Recipient};
pub use config::{MailDbConfig, MailDbConfigBuilder};
pub use db::MailDb;
pub use domain::{Domain, DomainClass, DomainId};
pub use error::{Error, Result};
