//! Alias link rows: one persisted (owner, target, extension) relationship.

use sqlx::Row;
use sqlx::sqlite::SqliteConnection;

use crate::Result;
use crate::address::AddressId;

/// A row of the `alias` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkRow {
    pub id: i64,
    pub target: Option<AddressId>,
    pub extension: Option<String>,
}

/// The identifying columns of a link under a known owner.
///
/// Matching compares optional values directly, so two missing values are
/// equal; this is the `IS` comparison, not SQL `=`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LinkKey {
    pub target: Option<AddressId>,
    pub extension: Option<String>,
}

impl LinkKey {
    pub fn matches(&self, row: &LinkRow) -> bool {
        self.target == row.target && self.extension == row.extension
    }
}

/// All link rows of an owner, in creation order.
pub(crate) async fn fetch_links(
    conn: &mut SqliteConnection,
    owner: AddressId,
) -> Result<Vec<LinkRow>> {
    let rows =
        sqlx::query("SELECT id, target, extension FROM alias WHERE address = ? ORDER BY id")
            .bind(owner.0)
            .fetch_all(&mut *conn)
            .await?;

    Ok(rows
        .iter()
        .map(|row| LinkRow {
            id: row.get("id"),
            target: row.get::<Option<i64>, _>("target").map(AddressId::new),
            extension: row.get("extension"),
        })
        .collect())
}

/// Number of link rows owned by an address.
pub(crate) async fn count_links(conn: &mut SqliteConnection, owner: AddressId) -> Result<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM alias WHERE address = ?")
        .bind(owner.0)
        .fetch_one(&mut *conn)
        .await?)
}

/// Append a link row; identical rows are allowed.
pub(crate) async fn insert_link(
    conn: &mut SqliteConnection,
    owner: AddressId,
    key: &LinkKey,
) -> Result<i64> {
    let result = sqlx::query("INSERT INTO alias (address, target, extension) VALUES (?, ?, ?)")
        .bind(owner.0)
        .bind(key.target.map(|t| t.0))
        .bind(key.extension.as_deref())
        .execute(&mut *conn)
        .await?;
    Ok(result.last_insert_rowid())
}

/// Delete one link row by id.
pub(crate) async fn delete_link(conn: &mut SqliteConnection, id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM alias WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Delete every link row of an owner.
pub(crate) async fn delete_links(conn: &mut SqliteConnection, owner: AddressId) -> Result<u64> {
    let result = sqlx::query("DELETE FROM alias WHERE address = ?")
        .bind(owner.0)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}
