//! Alias lookup.

use std::ops::ControlFlow;

use sqlx::sqlite::SqliteConnection;
use tracing::{debug, warn};

use super::link::fetch_links;
use super::model::{Alias, Recipient};
use crate::address::repository::{find_addresses, lookup_address_by_id};
use crate::address::{Address, AddressPattern};
use crate::db::MailDb;
use crate::{Error, Result};

impl MailDb {
    /// Look up aliases by name or wildcard pattern.
    ///
    /// Accepts the same patterns as [`MailDb::find_address`]. Matching
    /// addresses without recipients are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoAliases` if no matching address is an alias, the
    /// not-found error of an exact pattern that matches no address, or the
    /// first other error met while assembling an alias.
    pub async fn lookup_alias(&self, pattern: &str) -> Result<Vec<Alias>> {
        let pattern = AddressPattern::parse(pattern)?;
        let mut conn = self.pool.acquire().await?;

        let addresses = find_addresses(&mut conn, &pattern).await?;
        let mut collector = AliasCollector::default();
        for address in addresses {
            let resolution = Resolution::from(lookup_alias_by_addr(&mut conn, address).await);
            if let ControlFlow::Break(e) = collector.push(resolution) {
                warn!(?pattern, error = %e, "alias lookup aborted");
                return Err(e);
            }
        }
        collector.finish()
    }
}

/// Assemble the alias owned by `owner`.
///
/// Fails with `NotAlias` if the owner has no link rows and with
/// `AddressTarget` if a row is inconsistent with its owner.
pub(crate) async fn lookup_alias_by_addr(
    conn: &mut SqliteConnection,
    owner: Address,
) -> Result<Alias> {
    let links = fetch_links(conn, owner.id).await?;
    if links.is_empty() {
        return Err(Error::NotAlias);
    }

    let mut recipients = Vec::with_capacity(links.len());
    for link in links {
        let target = match link.target {
            Some(id) => match lookup_address_by_id(conn, id).await {
                Ok(address) => Some(address),
                Err(e) if e.is_not_found() => return Err(Error::AddressTarget),
                Err(e) => return Err(e),
            },
            None if owner.is_local() => None,
            None => return Err(Error::AddressTarget),
        };
        recipients.push(Recipient {
            link_id: link.id,
            target,
            extension: link.extension,
        });
    }

    Ok(Alias { owner, recipients })
}

/// Outcome of assembling one matched address.
#[derive(Debug)]
pub(crate) enum Resolution {
    /// The address is an alias.
    Resolved(Alias),
    /// The address has no recipients.
    Skipped,
    /// Any other failure; ends the lookup.
    Aborted(Error),
}

impl From<Result<Alias>> for Resolution {
    fn from(result: Result<Alias>) -> Self {
        match result {
            Ok(alias) => Self::Resolved(alias),
            Err(Error::NotAlias) => Self::Skipped,
            Err(e) => Self::Aborted(e),
        }
    }
}

/// Folds per-address outcomes into the lookup result.
#[derive(Debug, Default)]
pub(crate) struct AliasCollector {
    aliases: Vec<Alias>,
}

impl AliasCollector {
    pub fn push(&mut self, resolution: Resolution) -> ControlFlow<Error> {
        match resolution {
            Resolution::Resolved(alias) => {
                self.aliases.push(alias);
                ControlFlow::Continue(())
            }
            Resolution::Skipped => ControlFlow::Continue(()),
            Resolution::Aborted(e) => ControlFlow::Break(e),
        }
    }

    pub fn finish(self) -> Result<Vec<Alias>> {
        if self.aliases.is_empty() {
            debug!("no aliases matched");
            return Err(Error::NoAliases);
        }
        Ok(self.aliases)
    }
}
