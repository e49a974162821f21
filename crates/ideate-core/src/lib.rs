//! # ideate-core
//!
//! Core types, traits, and abstractions for the ideate board.
//!
//! This crate provides the foundational data structures, the board ordering
//! engine, and the trait definitions that other ideate crates depend on.

pub mod error;
pub mod logging;
pub mod models;
pub mod ordering;
pub mod share;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{Idea, IdeaWithTags, Platform, Tag};
pub use ordering::{compute_reorder, plan_move, renumber, MovePlan, SortUpdate, KEY_STEP};
pub use share::{share_url, ShareConfig};
pub use tags::{normalize_tag_name, validate_tag_name, MAX_TAG_NAME_LEN};
pub use traits::{
    CreateIdeaRequest, IdeaRepository, ReorderOutcome, TagRepository, UpdateIdeaRequest,
};
