//! Repository traits for the ideate board.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{IdeaWithTags, Platform, Tag};
use crate::ordering::SortUpdate;

/// Request for creating a new idea.
#[derive(Debug, Clone)]
pub struct CreateIdeaRequest {
    pub title: String,
    pub description: Option<String>,
    pub platform: Platform,
    /// Desired tag names, raw; normalized during relinking.
    pub tags: Vec<String>,
}

/// Partial update of an idea. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateIdeaRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub platform: Option<Platform>,
    /// Explicit display-rank override.
    pub sort_key: Option<i32>,
}

/// Outcome of a batch reorder.
///
/// The batch is applied inside one transaction, so a partially-renumbered
/// list is impossible: either every update landed or none did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReorderOutcome {
    /// Every update matched a row and was persisted.
    Applied { updated: usize },
    /// At least one id did not match a row; the whole batch was rolled back.
    Rejected { missing: Vec<i32> },
}

/// Repository for idea CRUD and ordering operations.
#[async_trait]
pub trait IdeaRepository: Send + Sync {
    /// List ideas sorted descending by sort key, tags hydrated.
    ///
    /// `platform` narrows the result to one platform without affecting the
    /// stored ordering.
    async fn list(&self, platform: Option<Platform>) -> Result<Vec<IdeaWithTags>>;

    /// Fetch a single idea with its tag set.
    async fn fetch(&self, id: i32) -> Result<IdeaWithTags>;

    /// Insert a new idea at the top of the board (sort key = max + 1).
    async fn insert(&self, req: CreateIdeaRequest) -> Result<IdeaWithTags>;

    /// Partially update title/description/platform/sort key.
    async fn update(&self, id: i32, req: UpdateIdeaRequest) -> Result<IdeaWithTags>;

    /// Replace the idea's tag set with the given names.
    async fn set_tags(&self, id: i32, tags: Vec<String>) -> Result<IdeaWithTags>;

    /// Delete an idea, cascading its tag associations. Deleting a missing
    /// id is a no-op, not an error.
    async fn delete(&self, id: i32) -> Result<()>;

    /// Apply a client-computed renumbering batch atomically.
    async fn reorder(&self, updates: Vec<SortUpdate>) -> Result<ReorderOutcome>;

    /// Move one idea to a zero-based position within the full board order,
    /// then return the new full ordering.
    async fn move_to(&self, id: i32, position: usize) -> Result<Vec<IdeaWithTags>>;
}

/// Repository for tag management.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Atomic find-or-create by normalized name.
    async fn ensure(&self, name: &str) -> Result<Tag>;

    /// List all tags ordered by name.
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Tags linked to one idea, ordered by name.
    async fn get_for_idea(&self, idea_id: i32) -> Result<Vec<Tag>>;

    /// Relink: replace the idea's tag set with the given names inside one
    /// transaction.
    async fn set_for_idea(&self, idea_id: i32, names: Vec<String>) -> Result<Vec<Tag>>;
}
