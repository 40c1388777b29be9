//! Alias creation and removal.
//!
//! Every name is parsed before the transaction starts, so a rejected
//! argument never touches storage. All writes of one call share a single
//! transaction, committed only when every step succeeded.

use sqlx::sqlite::SqliteConnection;
use tracing::{debug, info};

use super::link::{LinkKey, count_links, delete_link, delete_links, fetch_links, insert_link};
use crate::address::repository::{lookup_address, resolve_or_insert};
use crate::address::{AddressId, AddressParts, decode_rfc822, decode_target};
use crate::db::MailDb;
use crate::{Error, Result};

impl MailDb {
    /// Add recipients to an alias, creating the alias if it is new.
    ///
    /// Recipients are appended in the given order; repeating a recipient
    /// adds another link. A virtual (domain-qualified) alias only accepts
    /// address recipients.
    ///
    /// # Errors
    ///
    /// Returns `Error::NoRecipients` for an empty list, `Error::BadName`
    /// for a malformed name or an alias name with an extension, `Error::AddrNoAddr` for a pipe, file or
    /// include under a virtual alias, or a database error after rollback.
    pub async fn make_alias<S: AsRef<str>>(&self, alias: &str, recipients: &[S]) -> Result<()> {
        if recipients.is_empty() {
            return Err(Error::NoRecipients);
        }
        let owner_parts = decode_alias_name(alias)?;
        let mut targets = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let target = decode_target(recipient.as_ref())?;
            if !owner_parts.is_local() && !target.is_address() {
                return Err(Error::AddrNoAddr);
            }
            targets.push(target);
        }

        let mut tx = self.begin().await?;
        let owner = resolve_or_insert(&mut tx, &owner_parts).await?;
        for target in &targets {
            let target_id = if target.is_address() {
                Some(resolve_or_insert(&mut tx, target).await?.id)
            } else {
                None
            };
            let key = LinkKey {
                target: target_id,
                extension: target.extension().map(str::to_string),
            };
            let link_id = insert_link(&mut tx, owner.id, &key).await?;
            debug!(alias = %owner, recipient = %target, link_id, "added recipient");
        }
        tx.commit().await?;

        info!(alias = %owner, added = targets.len(), "updated alias");
        Ok(())
    }

    /// Report whether the named address has any recipients.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` for a malformed name, or the not-found
    /// error of the address lookup.
    pub async fn is_alias(&self, alias: &str) -> Result<bool> {
        let parts = decode_alias_name(alias)?;
        let mut conn = self.pool.acquire().await?;
        let owner = lookup_address(&mut conn, &parts).await?;
        Ok(count_links(&mut conn, owner.id).await? > 0)
    }

    /// Remove an alias with all of its recipients.
    ///
    /// The owner address row is kept.
    ///
    /// # Errors
    ///
    /// Returns the not-found error of the address lookup, or
    /// `Error::NotAlias` if the address has no recipients.
    pub async fn remove_alias(&self, alias: &str) -> Result<()> {
        let parts = decode_alias_name(alias)?;

        let mut tx = self.begin().await?;
        let owner = lookup_address(&mut tx, &parts).await?;
        let removed = delete_links(&mut tx, owner.id).await?;
        if removed == 0 {
            return Err(Error::NotAlias);
        }
        tx.commit().await?;

        info!(alias = %owner, removed, "removed alias");
        Ok(())
    }

    /// Remove one recipient from an alias.
    ///
    /// The recipient is matched on target address and extension, where a
    /// missing value only matches a missing value. If the same recipient was
    /// added more than once, the oldest link is removed.
    ///
    /// # Errors
    ///
    /// Returns the not-found error of the alias lookup, or
    /// `Error::RecipientNotFound` if the alias has no such recipient.
    pub async fn remove_recipient(&self, alias: &str, recipient: &str) -> Result<()> {
        let owner_parts = decode_alias_name(alias)?;
        let target_parts = decode_target(recipient)?;

        let mut tx = self.begin().await?;
        let owner = lookup_address(&mut tx, &owner_parts).await?;
        let key = LinkKey {
            target: if target_parts.is_address() {
                Some(lookup_recipient(&mut tx, &target_parts).await?)
            } else {
                None
            },
            extension: target_parts.extension().map(str::to_string),
        };

        let links = fetch_links(&mut tx, owner.id).await?;
        let link = links
            .iter()
            .find(|link| key.matches(link))
            .ok_or(Error::RecipientNotFound)?;
        delete_link(&mut tx, link.id).await?;
        tx.commit().await?;

        info!(alias = %owner, recipient = %target_parts, "removed recipient");
        Ok(())
    }
}

/// Alias names are concrete and carry no extension.
fn decode_alias_name(alias: &str) -> Result<AddressParts> {
    decode_rfc822(alias)?.require_concrete()?.require_no_extension()
}

/// Resolve a recipient address; a miss means the link cannot exist.
async fn lookup_recipient(
    conn: &mut SqliteConnection,
    parts: &AddressParts,
) -> Result<AddressId> {
    match lookup_address(conn, parts).await {
        Ok(address) => Ok(address.id),
        Err(e) if e.is_not_found() => Err(Error::RecipientNotFound),
        Err(e) => Err(e),
    }
}
