//! Address resolution and storage.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::{debug, info};

use super::model::{Address, AddressId};
use super::parts::{AddressParts, AddressPattern};
use crate::db::MailDb;
use crate::domain::DomainId;
use crate::domain::repository::{find_domain, find_domain_by_id, insert_domain, row_to_domain};
use crate::{Error, Result};

/// Address joined with its domain; domain columns keep their table names.
const QUALIFIED_SELECT: &str = r"
    SELECT a.id AS address_id, a.local_part,
           d.id, d.name, d.class, d.transport, d.access, d.vuid, d.vgid, d.rclass
    FROM address a
    JOIN domain d ON a.domain_id = d.id
";

const QUALIFIED_ORDER: &str = "ORDER BY d.name, a.local_part, a.id";

impl MailDb {
    /// Resolve a single address by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` for a malformed or wildcard name,
    /// `Error::DomainNotFound` if its domain does not exist, and
    /// `Error::AddressNotFound` if the domain exists but the address does not.
    pub async fn lookup_address(&self, name: &str) -> Result<Address> {
        let parts = super::parts::decode_rfc822(name)?.require_concrete()?;
        let mut conn = self.pool.acquire().await?;
        lookup_address(&mut conn, &parts).await
    }

    /// Expand a lookup pattern into persisted addresses.
    ///
    /// | pattern       | matches                                 |
    /// |---------------|-----------------------------------------|
    /// | `name@domain` | that address                            |
    /// | `name`        | that local address                      |
    /// | `*`           | all local addresses, in creation order  |
    /// | `*@domain`    | all addresses in the domain             |
    /// | `name@*`      | the local part in every domain          |
    /// | `*@*`         | all domain-qualified addresses          |
    ///
    /// Qualified results are ordered by domain name, then local part.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` for a malformed pattern. An exact pattern
    /// that matches nothing fails with `Error::DomainNotFound` or
    /// `Error::AddressNotFound`; wildcard patterns return an empty list.
    pub async fn find_address(&self, pattern: &str) -> Result<Vec<Address>> {
        let pattern = AddressPattern::parse(pattern)?;
        let mut conn = self.pool.acquire().await?;
        find_addresses(&mut conn, &pattern).await
    }

    /// Delete address rows that no alias link references as owner or target.
    ///
    /// Alias removal leaves address rows in place; this reclaims them.
    /// Domains are not touched. Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reclaim_orphan_addresses(&self) -> Result<u64> {
        let mut tx = self.begin().await?;
        let result = sqlx::query(
            r"
            DELETE FROM address
            WHERE id NOT IN (SELECT address FROM alias)
              AND id NOT IN (SELECT target FROM alias WHERE target IS NOT NULL)
            ",
        )
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let reclaimed = result.rows_affected();
        info!(reclaimed, "reclaimed orphan addresses");
        Ok(reclaimed)
    }
}

/// Resolve parts to a persisted address.
///
/// Fails with `DomainNotFound` when the domain is missing and with
/// `AddressNotFound` when only the address is.
pub(crate) async fn lookup_address(
    conn: &mut SqliteConnection,
    parts: &AddressParts,
) -> Result<Address> {
    let local_part = parts.local_part();
    match parts.domain() {
        Some(name) => {
            let domain = find_domain(conn, name).await?;
            let id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM address WHERE local_part = ? AND domain_id = ?")
                    .bind(local_part)
                    .bind(domain.id.0)
                    .fetch_optional(&mut *conn)
                    .await?;
            let id = id.ok_or(Error::AddressNotFound)?;
            Ok(Address {
                id: AddressId::new(id),
                local_part: local_part.to_string(),
                domain: Some(domain),
            })
        }
        None => {
            let id: Option<i64> = sqlx::query_scalar(
                "SELECT id FROM address WHERE local_part = ? AND domain_id IS NULL",
            )
            .bind(local_part)
            .fetch_optional(&mut *conn)
            .await?;
            let id = id.ok_or(Error::AddressNotFound)?;
            Ok(Address {
                id: AddressId::new(id),
                local_part: local_part.to_string(),
                domain: None,
            })
        }
    }
}

/// Insert an address, creating its domain if needed.
///
/// Callers look the address up first; this always inserts a new row.
pub(crate) async fn insert_address(
    conn: &mut SqliteConnection,
    parts: &AddressParts,
) -> Result<Address> {
    let domain = match parts.domain() {
        Some(name) => match find_domain(conn, name).await {
            Ok(domain) => Some(domain),
            Err(Error::DomainNotFound) => Some(insert_domain(conn, name).await?),
            Err(e) => return Err(e),
        },
        None => None,
    };

    let result = sqlx::query("INSERT INTO address (local_part, domain_id) VALUES (?, ?)")
        .bind(parts.local_part())
        .bind(domain.as_ref().map(|d| d.id.0))
        .execute(&mut *conn)
        .await?;

    let address = Address {
        id: AddressId::new(result.last_insert_rowid()),
        local_part: parts.local_part().to_string(),
        domain,
    };
    debug!(address = %address, id = address.id.0, "inserted address");
    Ok(address)
}

/// Look the address up, inserting it (and its domain) on a miss.
pub(crate) async fn resolve_or_insert(
    conn: &mut SqliteConnection,
    parts: &AddressParts,
) -> Result<Address> {
    match lookup_address(conn, parts).await {
        Err(e) if e.is_not_found() => insert_address(conn, parts).await,
        other => other,
    }
}

/// Load an address and its domain by row id.
pub(crate) async fn lookup_address_by_id(
    conn: &mut SqliteConnection,
    id: AddressId,
) -> Result<Address> {
    let row = sqlx::query("SELECT id, local_part, domain_id FROM address WHERE id = ?")
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(Error::AddressNotFound)?;

    let domain_id: Option<i64> = row.get("domain_id");
    let domain = match domain_id {
        Some(domain_id) => Some(find_domain_by_id(conn, DomainId::new(domain_id)).await?),
        None => None,
    };

    Ok(Address {
        id,
        local_part: row.get("local_part"),
        domain,
    })
}

/// Expand a pattern into addresses in a stable order.
pub(crate) async fn find_addresses(
    conn: &mut SqliteConnection,
    pattern: &AddressPattern,
) -> Result<Vec<Address>> {
    let addresses = match pattern {
        AddressPattern::Exact(parts) => vec![lookup_address(conn, parts).await?],
        AddressPattern::AllLocal => {
            let rows = sqlx::query(
                "SELECT id, local_part FROM address WHERE domain_id IS NULL ORDER BY id",
            )
            .fetch_all(&mut *conn)
            .await?;
            rows.iter()
                .map(|row| Address {
                    id: AddressId::new(row.get("id")),
                    local_part: row.get("local_part"),
                    domain: None,
                })
                .collect()
        }
        AddressPattern::AllInDomain(domain) => {
            let rows = sqlx::query(&format!("{QUALIFIED_SELECT} WHERE d.name = ? {QUALIFIED_ORDER}"))
                .bind(domain)
                .fetch_all(&mut *conn)
                .await?;
            rows.iter().map(row_to_qualified_address).collect()
        }
        AddressPattern::LocalPartAcrossDomains(local_part) => {
            let rows =
                sqlx::query(&format!("{QUALIFIED_SELECT} WHERE a.local_part = ? {QUALIFIED_ORDER}"))
                    .bind(local_part)
                    .fetch_all(&mut *conn)
                    .await?;
            rows.iter().map(row_to_qualified_address).collect()
        }
        AddressPattern::AllQualified => {
            let rows = sqlx::query(&format!("{QUALIFIED_SELECT} {QUALIFIED_ORDER}"))
                .fetch_all(&mut *conn)
                .await?;
            rows.iter().map(row_to_qualified_address).collect()
        }
    };
    Ok(addresses)
}

fn row_to_qualified_address(row: &SqliteRow) -> Address {
    Address {
        id: AddressId::new(row.get("address_id")),
        local_part: row.get("local_part"),
        domain: Some(row_to_domain(row)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::address::parts::decode_rfc822;

    async fn insert(db: &MailDb, name: &str) -> Address {
        let parts = decode_rfc822(name).unwrap();
        let mut tx = db.begin().await.unwrap();
        let address = resolve_or_insert(&mut tx, &parts).await.unwrap();
        tx.commit().await.unwrap();
        address
    }

    fn names(addresses: &[Address]) -> Vec<String> {
        addresses.iter().map(ToString::to_string).collect()
    }

    #[tokio::test]
    async fn test_lookup_distinguishes_domain_and_address() {
        let db = MailDb::in_memory().await.unwrap();
        insert(&db, "bozo@clown.com").await;

        assert!(matches!(
            db.lookup_address("bozo@circus.org").await,
            Err(Error::DomainNotFound)
        ));
        assert!(matches!(
            db.lookup_address("micky@clown.com").await,
            Err(Error::AddressNotFound)
        ));
        assert!(matches!(db.lookup_address("bozo").await, Err(Error::AddressNotFound)));

        let found = db.lookup_address("bozo@clown.com").await.unwrap();
        assert_eq!(found.to_string(), "bozo@clown.com");
        assert!(!found.is_local());
    }

    #[tokio::test]
    async fn test_resolve_or_insert_reuses_rows() {
        let db = MailDb::in_memory().await.unwrap();

        let first = insert(&db, "bozo@clown.com").await;
        let again = insert(&db, "bozo+tricks@clown.com").await;
        let sibling = insert(&db, "micky@clown.com").await;

        assert_eq!(first.id, again.id);
        assert_ne!(first.id, sibling.id);
        assert_eq!(db.count_addresses().await.unwrap(), 2);
        assert_eq!(db.count_domains().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_local_and_qualified_are_distinct() {
        let db = MailDb::in_memory().await.unwrap();

        let local = insert(&db, "root").await;
        let qualified = insert(&db, "root@server").await;

        assert_ne!(local.id, qualified.id);
        assert!(local.is_local());
        assert_eq!(local.to_string(), "root");
    }

    #[tokio::test]
    async fn test_lookup_by_id() {
        let db = MailDb::in_memory().await.unwrap();
        let inserted = insert(&db, "dave@home").await;

        let mut conn = db.pool.acquire().await.unwrap();
        let found = lookup_address_by_id(&mut conn, inserted.id).await.unwrap();
        assert_eq!(found, inserted);
        assert!(matches!(
            lookup_address_by_id(&mut conn, AddressId::new(999)).await,
            Err(Error::AddressNotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_address_patterns() {
        let db = MailDb::in_memory().await.unwrap();
        for name in [
            "steve@office",
            "miller@office",
            "bozo@clown.com",
            "steve@clown.com",
            "rebar",
            "postfix",
        ] {
            insert(&db, name).await;
        }

        assert_eq!(
            names(&db.find_address("*@office").await.unwrap()),
            ["miller@office", "steve@office"]
        );
        assert_eq!(
            names(&db.find_address("steve@*").await.unwrap()),
            ["steve@clown.com", "steve@office"]
        );
        assert_eq!(
            names(&db.find_address("*@*").await.unwrap()),
            ["bozo@clown.com", "steve@clown.com", "miller@office", "steve@office"]
        );
        assert_eq!(names(&db.find_address("*").await.unwrap()), ["rebar", "postfix"]);
        assert_eq!(
            names(&db.find_address("bozo@clown.com").await.unwrap()),
            ["bozo@clown.com"]
        );
        assert!(db.find_address("*@nowhere").await.unwrap().is_empty());
        assert!(matches!(
            db.find_address("nobody@office").await,
            Err(Error::AddressNotFound)
        ));
    }

    #[tokio::test]
    async fn test_find_address_rejects_bad_pattern() {
        let db = MailDb::in_memory().await.unwrap();
        assert!(matches!(db.find_address("x@;bad").await, Err(Error::BadName(_))));
    }
}
