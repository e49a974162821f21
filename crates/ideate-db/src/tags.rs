//! Tag repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row, Transaction};

use ideate_core::{normalize_tag_name, validate_tag_name, Error, Result, Tag, TagRepository};

/// Atomic find-or-create within an open transaction.
///
/// The `ON CONFLICT .. DO UPDATE` form always returns the row id, whether the
/// insert won or an existing row was hit, so concurrent identical calls both
/// land on the same tag.
pub(crate) async fn ensure_tag_tx(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
) -> Result<Tag> {
    let name = normalize_tag_name(name);
    validate_tag_name(&name).map_err(Error::InvalidInput)?;

    let row = sqlx::query(
        "INSERT INTO tag (name) VALUES ($1)
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
         RETURNING id, name",
    )
    .bind(&name)
    .fetch_one(&mut **tx)
    .await
    .map_err(Error::Database)?;

    Ok(Tag {
        id: row.get("id"),
        name: row.get("name"),
    })
}

/// Relinking protocol: replace an idea's tag set within an open transaction.
///
/// Deletes every existing link for the idea, then ensures each desired tag
/// and reinserts the link. Duplicate names in the input collapse onto one
/// link. Returns the resulting tag set ordered by name.
pub(crate) async fn relink_idea_tags_tx(
    tx: &mut Transaction<'_, Postgres>,
    idea_id: i32,
    names: &[String],
) -> Result<Vec<Tag>> {
    sqlx::query("DELETE FROM idea_tag WHERE idea_id = $1")
        .bind(idea_id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        let tag = ensure_tag_tx(tx, name).await?;

        sqlx::query(
            "INSERT INTO idea_tag (idea_id, tag_id) VALUES ($1, $2)
             ON CONFLICT (idea_id, tag_id) DO NOTHING",
        )
        .bind(idea_id)
        .bind(tag.id)
        .execute(&mut **tx)
        .await
        .map_err(Error::Database)?;

        if !tags.iter().any(|t: &Tag| t.id == tag.id) {
            tags.push(tag);
        }
    }

    tags.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(tags)
}

/// PostgreSQL implementation of TagRepository.
#[derive(Clone)]
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn ensure(&self, name: &str) -> Result<Tag> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tag = ensure_tag_tx(&mut tx, name).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(tag)
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query("SELECT id, name FROM tag ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let tags = rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect();

        Ok(tags)
    }

    async fn get_for_idea(&self, idea_id: i32) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT t.id, t.name FROM idea_tag it
             JOIN tag t ON t.id = it.tag_id
             WHERE it.idea_id = $1
             ORDER BY t.name",
        )
        .bind(idea_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tags = rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
            })
            .collect();

        Ok(tags)
    }

    async fn set_for_idea(&self, idea_id: i32, names: Vec<String>) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let tags = relink_idea_tags_tx(&mut tx, idea_id, &names).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(tags)
    }
}
