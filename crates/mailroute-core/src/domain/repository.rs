//! Domain storage.

use sqlx::Row;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use tracing::{debug, info};

use super::model::{Domain, DomainClass, DomainId};
use crate::address::parts::{WILDCARD, validate_domain};
use crate::db::MailDb;
use crate::{Error, Result};

const DOMAIN_COLUMNS: &str = "id, name, class, transport, access, vuid, vgid, rclass";

impl MailDb {
    /// Create a domain in its own transaction.
    ///
    /// # Errors
    ///
    /// Returns `Error::BadName` for a malformed name, or a database error
    /// (including a uniqueness violation if the domain exists).
    pub async fn create_domain(&self, name: &str) -> Result<Domain> {
        let mut tx = self.begin().await?;
        let domain = insert_domain(&mut tx, name).await?;
        tx.commit().await?;
        Ok(domain)
    }

    /// Look up a domain by name.
    ///
    /// # Errors
    ///
    /// Returns `Error::DomainNotFound` if there is no such domain.
    pub async fn lookup_domain(&self, name: &str) -> Result<Domain> {
        let mut conn = self.pool.acquire().await?;
        find_domain(&mut conn, name).await
    }

    /// Delete a domain.
    ///
    /// # Errors
    ///
    /// Returns `Error::DomainNotFound` if there is no such domain and
    /// `Error::DomainInUse` if addresses still belong to it.
    pub async fn delete_domain(&self, name: &str) -> Result<()> {
        let mut tx = self.begin().await?;
        let domain = find_domain(&mut tx, name).await?;

        let in_use: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM address WHERE domain_id = ?")
            .bind(domain.id.0)
            .fetch_one(&mut *tx)
            .await?;
        if in_use > 0 {
            return Err(Error::DomainInUse(domain.name));
        }

        sqlx::query("DELETE FROM domain WHERE id = ?")
            .bind(domain.id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(domain = %domain.name, "deleted domain");
        Ok(())
    }
}

/// Find a domain by name.
pub(crate) async fn find_domain(conn: &mut SqliteConnection, name: &str) -> Result<Domain> {
    let row = sqlx::query(&format!("SELECT {DOMAIN_COLUMNS} FROM domain WHERE name = ?"))
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_domain).ok_or(Error::DomainNotFound)
}

/// Find a domain by row id.
pub(crate) async fn find_domain_by_id(conn: &mut SqliteConnection, id: DomainId) -> Result<Domain> {
    let row = sqlx::query(&format!("SELECT {DOMAIN_COLUMNS} FROM domain WHERE id = ?"))
        .bind(id.0)
        .fetch_optional(&mut *conn)
        .await?;

    row.as_ref().map(row_to_domain).ok_or(Error::DomainNotFound)
}

/// Insert a domain with default attributes.
pub(crate) async fn insert_domain(conn: &mut SqliteConnection, name: &str) -> Result<Domain> {
    let name = validate_domain(name)?;
    if name == WILDCARD {
        return Err(Error::bad_name("wildcard is not a domain"));
    }

    let result = sqlx::query("INSERT INTO domain (name) VALUES (?)")
        .bind(name)
        .execute(&mut *conn)
        .await?;

    debug!(domain = name, "inserted domain");
    find_domain_by_id(conn, DomainId::new(result.last_insert_rowid())).await
}

pub(crate) fn row_to_domain(row: &SqliteRow) -> Domain {
    Domain {
        id: DomainId::new(row.get("id")),
        name: row.get("name"),
        class: DomainClass::from_i64(row.get("class")),
        transport: row.get("transport"),
        access: row.get("access"),
        vuid: row.get("vuid"),
        vgid: row.get("vgid"),
        rclass: row.get("rclass"),
    }
}
