//! Aliases: an owner address and the recipients mail for it is delivered to.
//!
//! An alias has no row of its own. It is assembled from the link rows that
//! name its owner, and it ceases to exist when the last of them is removed.

mod link;
mod model;
mod mutator;
mod resolver;

pub use model::{Alias, Recipient};
