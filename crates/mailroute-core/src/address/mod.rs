//! Mail addresses: parsing, the persisted model, and resolution.

mod model;
pub mod parts;
pub(crate) mod repository;

pub use model::{Address, AddressId};
pub use parts::{AddressParts, AddressPattern, RecipientForm, decode_rfc822, decode_target};
