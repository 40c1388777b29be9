//! Mail domains.
//!
//! A domain row is created the first time an address in it is stored and
//! stays until it is deleted explicitly.

mod model;
pub(crate) mod repository;

pub use model::{DEFAULT_RCLASS, Domain, DomainClass, DomainId};
