//! Tag find-or-create and relinking behavior.
//!
//! Validates:
//! - ensure() is idempotent across case variants (case-folded identity)
//! - the relinking protocol replaces an idea's tag set exactly
//! - tags outlive the ideas that reference them

mod common;

use common::{setup_test_pool, unique};
use ideate_core::{CreateIdeaRequest, IdeaRepository, Platform, TagRepository};
use ideate_db::{PgIdeaRepository, PgTagRepository};

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_ensure_folds_case_to_one_identity() {
    let pool = setup_test_pool().await;
    let tags = PgTagRepository::new(pool);

    let name = unique("Growth");
    let first = tags.ensure(&name).await.expect("first ensure");
    let second = tags
        .ensure(&name.to_uppercase())
        .await
        .expect("second ensure");

    assert_eq!(first.id, second.id);
    assert_eq!(first.name, name.to_lowercase());

    let third = tags
        .ensure(&format!("  {}  ", name))
        .await
        .expect("trimmed ensure");
    assert_eq!(third.id, first.id);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_ensure_rejects_empty_name() {
    let pool = setup_test_pool().await;
    let tags = PgTagRepository::new(pool);

    assert!(tags.ensure("   ").await.is_err());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_relink_replaces_tag_set_without_deleting_tags() {
    let pool = setup_test_pool().await;
    let ideas = PgIdeaRepository::new(pool.clone());
    let tags = PgTagRepository::new(pool);

    let a = unique("a");
    let b = unique("b");
    let c = unique("c");

    let created = ideas
        .insert(CreateIdeaRequest {
            title: unique("Relink test"),
            description: None,
            platform: Platform::Reddit,
            tags: vec![a.clone(), b.clone()],
        })
        .await
        .expect("insert idea");

    let updated = ideas
        .set_tags(created.idea.id, vec![b.clone(), c.clone()])
        .await
        .expect("set tags");

    let mut names: Vec<String> = updated.tags.iter().map(|t| t.name.clone()).collect();
    names.sort();
    let mut expected = vec![b.clone(), c.clone()];
    expected.sort();
    assert_eq!(names, expected);

    // Tag `a` lost its link but still exists globally.
    let surviving = tags.ensure(&a).await.expect("ensure a again");
    assert_eq!(surviving.name, a.to_lowercase());

    ideas.delete(created.idea.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_duplicate_names_collapse_to_one_link() {
    let pool = setup_test_pool().await;
    let ideas = PgIdeaRepository::new(pool);

    let name = unique("dup");
    let created = ideas
        .insert(CreateIdeaRequest {
            title: unique("Duplicate tags"),
            description: None,
            platform: Platform::Twitter,
            tags: vec![name.clone(), name.to_uppercase(), format!(" {}", name)],
        })
        .await
        .expect("insert idea");

    assert_eq!(created.tags.len(), 1);
    assert_eq!(created.tags[0].name, name.to_lowercase());

    ideas.delete(created.idea.id).await.expect("cleanup");
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn test_deleting_idea_keeps_unrelated_tags() {
    let pool = setup_test_pool().await;
    let ideas = PgIdeaRepository::new(pool.clone());
    let tags = PgTagRepository::new(pool);

    let shared = unique("shared");
    let keeper = ideas
        .insert(CreateIdeaRequest {
            title: unique("Keeper"),
            description: None,
            platform: Platform::Linkedin,
            tags: vec![shared.clone()],
        })
        .await
        .expect("insert keeper");
    let doomed = ideas
        .insert(CreateIdeaRequest {
            title: unique("Doomed"),
            description: None,
            platform: Platform::Linkedin,
            tags: vec![shared.clone()],
        })
        .await
        .expect("insert doomed");

    ideas.delete(doomed.idea.id).await.expect("delete doomed");

    let remaining = tags
        .get_for_idea(keeper.idea.id)
        .await
        .expect("keeper tags");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].name, shared.to_lowercase());

    ideas.delete(keeper.idea.id).await.expect("cleanup");
}
