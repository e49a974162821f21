//! Idea repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row, Transaction};

use ideate_core::{
    plan_move, CreateIdeaRequest, Error, Idea, IdeaRepository, IdeaWithTags, MovePlan,
    Platform, ReorderOutcome, Result, SortUpdate, Tag, UpdateIdeaRequest,
};

use crate::tags::relink_idea_tags_tx;

const IDEA_COLUMNS: &str = "id, title, description, platform, created_at_utc, sort_key";

/// Map a database row to an Idea.
fn map_idea_row(row: &PgRow) -> Result<Idea> {
    let platform_str: String = row.get("platform");
    let platform: Platform = platform_str
        .parse()
        .map_err(|e: String| Error::Serialization(format!("stored platform: {}", e)))?;

    Ok(Idea {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        platform,
        created_at_utc: row.get("created_at_utc"),
        sort_key: row.get("sort_key"),
    })
}

/// PostgreSQL implementation of IdeaRepository.
#[derive(Clone)]
pub struct PgIdeaRepository {
    pool: Pool<Postgres>,
}

impl PgIdeaRepository {
    /// Create a new PgIdeaRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load the tag sets for a batch of ideas in one grouped query.
    async fn tags_for_ideas(&self, ids: &[i32]) -> Result<HashMap<i32, Vec<Tag>>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            "SELECT it.idea_id, t.id AS tag_id, t.name FROM idea_tag it
             JOIN tag t ON t.id = it.tag_id
             WHERE it.idea_id = ANY($1)
             ORDER BY t.name",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_idea: HashMap<i32, Vec<Tag>> = HashMap::new();
        for row in rows {
            by_idea.entry(row.get("idea_id")).or_default().push(Tag {
                id: row.get("tag_id"),
                name: row.get("name"),
            });
        }
        Ok(by_idea)
    }

    /// Hydrate a batch of ideas with their tag sets, preserving order.
    async fn hydrate(&self, ideas: Vec<Idea>) -> Result<Vec<IdeaWithTags>> {
        let ids: Vec<i32> = ideas.iter().map(|i| i.id).collect();
        let mut tags = self.tags_for_ideas(&ids).await?;

        Ok(ideas
            .into_iter()
            .map(|idea| {
                let tags = tags.remove(&idea.id).unwrap_or_default();
                IdeaWithTags { idea, tags }
            })
            .collect())
    }

    /// Fetch one idea row within an open transaction.
    async fn fetch_idea_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i32,
    ) -> Result<Idea> {
        let row = sqlx::query(&format!("SELECT {} FROM idea WHERE id = $1", IDEA_COLUMNS))
            .bind(id)
            .fetch_optional(&mut **tx)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::IdeaNotFound(id))?;

        map_idea_row(&row)
    }
}

#[async_trait]
impl IdeaRepository for PgIdeaRepository {
    async fn list(&self, platform: Option<Platform>) -> Result<Vec<IdeaWithTags>> {
        let rows = match platform {
            Some(p) => {
                sqlx::query(&format!(
                    "SELECT {} FROM idea WHERE platform = $1 ORDER BY sort_key DESC",
                    IDEA_COLUMNS
                ))
                .bind(p.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {} FROM idea ORDER BY sort_key DESC",
                    IDEA_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(Error::Database)?;

        let ideas = rows
            .iter()
            .map(map_idea_row)
            .collect::<Result<Vec<Idea>>>()?;

        self.hydrate(ideas).await
    }

    async fn fetch(&self, id: i32) -> Result<IdeaWithTags> {
        let row = sqlx::query(&format!("SELECT {} FROM idea WHERE id = $1", IDEA_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::IdeaNotFound(id))?;

        let idea = map_idea_row(&row)?;
        let mut hydrated = self.hydrate(vec![idea]).await?;
        Ok(hydrated.remove(0))
    }

    async fn insert(&self, req: CreateIdeaRequest) -> Result<IdeaWithTags> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // New ideas land on top of the board: current max + 1, 0 when empty.
        let next_key: i32 =
            sqlx::query_scalar("SELECT COALESCE(MAX(sort_key) + 1, 0) FROM idea")
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

        let row = sqlx::query(&format!(
            "INSERT INTO idea (title, description, platform, sort_key)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            IDEA_COLUMNS
        ))
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.platform.as_str())
        .bind(next_key)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let idea = map_idea_row(&row)?;
        let tags = relink_idea_tags_tx(&mut tx, idea.id, &req.tags).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(IdeaWithTags { idea, tags })
    }

    async fn update(&self, id: i32, req: UpdateIdeaRequest) -> Result<IdeaWithTags> {
        // COALESCE keeps omitted fields untouched; an empty RETURNING set
        // signals a missing row.
        let row = sqlx::query(&format!(
            "UPDATE idea SET
                 title = COALESCE($2, title),
                 description = COALESCE($3, description),
                 platform = COALESCE($4, platform),
                 sort_key = COALESCE($5, sort_key)
             WHERE id = $1
             RETURNING {}",
            IDEA_COLUMNS
        ))
        .bind(id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(req.platform.map(|p| p.as_str()))
        .bind(req.sort_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::IdeaNotFound(id))?;

        let idea = map_idea_row(&row)?;
        let mut hydrated = self.hydrate(vec![idea]).await?;
        Ok(hydrated.remove(0))
    }

    async fn set_tags(&self, id: i32, tags: Vec<String>) -> Result<IdeaWithTags> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let idea = self.fetch_idea_tx(&mut tx, id).await?;
        let tags = relink_idea_tags_tx(&mut tx, id, &tags).await?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(IdeaWithTags { idea, tags })
    }

    async fn delete(&self, id: i32) -> Result<()> {
        // Associations cascade; deleting a missing id is a no-op.
        sqlx::query("DELETE FROM idea WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn reorder(&self, updates: Vec<SortUpdate>) -> Result<ReorderOutcome> {
        if updates.is_empty() {
            return Ok(ReorderOutcome::Applied { updated: 0 });
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let mut missing = Vec::new();
        for update in &updates {
            let result = sqlx::query("UPDATE idea SET sort_key = $2 WHERE id = $1")
                .bind(update.id)
                .bind(update.sort_key)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

            if result.rows_affected() == 0 {
                missing.push(update.id);
            }
        }

        if !missing.is_empty() {
            tx.rollback().await.map_err(Error::Database)?;
            return Ok(ReorderOutcome::Rejected { missing });
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(ReorderOutcome::Applied {
            updated: updates.len(),
        })
    }

    async fn move_to(&self, id: i32, position: usize) -> Result<Vec<IdeaWithTags>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // The plan is always computed against the FULL board, so keys stay
        // unique even when the client displays a platform-filtered view.
        let rows = sqlx::query("SELECT id, sort_key FROM idea ORDER BY sort_key DESC")
            .fetch_all(&mut *tx)
            .await
            .map_err(Error::Database)?;

        let keyed: Vec<(i32, i32)> = rows
            .iter()
            .map(|row| (row.get("id"), row.get("sort_key")))
            .collect();

        match plan_move(&keyed, id, position)? {
            MovePlan::Noop => {}
            MovePlan::Shift(update) => {
                sqlx::query("UPDATE idea SET sort_key = $2 WHERE id = $1")
                    .bind(update.id)
                    .bind(update.sort_key)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
            }
            MovePlan::Renumber(updates) => {
                for update in updates {
                    sqlx::query("UPDATE idea SET sort_key = $2 WHERE id = $1")
                        .bind(update.id)
                        .bind(update.sort_key)
                        .execute(&mut *tx)
                        .await
                        .map_err(Error::Database)?;
                }
            }
        }

        tx.commit().await.map_err(Error::Database)?;
        self.list(None).await
    }
}
