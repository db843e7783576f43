mod helpers;

use helpers::memory_repo;
use valet::memory::normalize;
use valet::memory::RepoError;

#[tokio::test]
async fn save_then_search_returns_entry_as_top_hit() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    let report = repo
        .save(vec!["the user works as a marine biologist".into()])
        .await
        .unwrap();
    assert_eq!(report.status, "success");
    assert_eq!(report.ids.len(), 1);

    let hits = repo
        .search("the user works as a marine biologist", 1)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "the user works as a marine biologist");
    assert_eq!(hits[0].meta.id, report.ids[0]);
    assert!(!hits[0].meta.is_edited);
}

#[tokio::test]
async fn delete_requires_exact_text_among_near_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    repo.save(vec![
        "buy oat milk at the store".into(),
        "buy oat milk at the market".into(),
    ])
    .await
    .unwrap();

    let report = repo
        .delete(vec!["buy oat milk at the store".into()])
        .await
        .unwrap();
    assert_eq!(report.deleted, 1);

    // Only the exact entry is gone; the near-duplicate survives.
    let hits = repo.search("buy oat milk", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "buy oat milk at the market");
}

#[tokio::test]
async fn similar_but_not_identical_text_deletes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    repo.save(vec!["call mom on Sunday afternoon".into()])
        .await
        .unwrap();

    let report = repo
        .delete(vec!["call mom on Monday afternoon".into()])
        .await
        .unwrap();
    assert_eq!(report.deleted, 0);
    assert!(report.summary().contains("Could not find exact memory"));
    assert_eq!(repo.search("call mom", 5).await.unwrap().len(), 1);
}

#[tokio::test]
async fn update_preserves_origin_and_swaps_identity() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    repo.save(vec!["the user lives in Quebec City".into()])
        .await
        .unwrap();
    let before = repo.search("the user lives in Quebec City", 1).await.unwrap();
    let origin = before[0].meta.created_at.clone();
    let old_id = before[0].meta.id.clone();

    let message = repo
        .update("the user lives in Quebec City", "the user lives in Montreal")
        .await
        .unwrap();
    assert!(message.contains("the user lives in Montreal"));

    let hits = repo.search("the user lives in Montreal", 5).await.unwrap();
    assert_eq!(hits.len(), 1);
    let replacement = &hits[0];

    // New identity, preserved origin, edit markers set.
    assert_ne!(replacement.meta.id, old_id);
    assert_eq!(replacement.meta.original_created_at, origin);
    assert!(replacement.meta.is_edited);
    assert!(replacement.meta.edited_at.is_some());
    assert!(replacement.content.contains("(Edited on "));
    assert_eq!(
        normalize::normalize(&replacement.content),
        "the user lives in Montreal"
    );

    // The old exact text no longer matches anything.
    let gone = repo
        .delete(vec!["the user lives in Quebec City".into()])
        .await
        .unwrap();
    assert_eq!(gone.deleted, 0);
}

#[tokio::test]
async fn updated_entry_can_be_targeted_by_plain_text() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    repo.save(vec!["prefers window seats".into()]).await.unwrap();
    repo.update("prefers window seats", "prefers aisle seats")
        .await
        .unwrap();

    // The stored content carries an edit annotation, but a plain-text key
    // still matches after normalization.
    let report = repo.delete(vec!["prefers aisle seats".into()]).await.unwrap();
    assert_eq!(report.deleted, 1);
}

#[tokio::test]
async fn batch_delete_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    repo.save(vec!["a valid entry about sailing".into()])
        .await
        .unwrap();

    let report = repo
        .delete(vec![
            "a valid entry about sailing".into(),
            "an entry that was never saved".into(),
        ])
        .await
        .unwrap();

    // The valid deletion stands; the bad key is reported, not fatal.
    assert_eq!(report.deleted, 1);
    let summary = report.summary();
    assert!(summary.contains("Successfully deleted: a valid entry about sailing"));
    assert!(summary.contains("Could not find exact memory: an entry that was never saved"));
}

#[tokio::test]
async fn delete_by_id_resolves_directly() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    let report = repo.save(vec!["identified by uuid".into()]).await.unwrap();
    let id = report.ids[0].clone();

    let deleted = repo.delete(vec![id]).await.unwrap();
    assert_eq!(deleted.deleted, 1);
    assert!(repo.search("identified by uuid", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn validation_rejects_bad_inputs_before_mutation() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    assert!(matches!(
        repo.save(vec!["ok".into(), "   ".into()]).await,
        Err(RepoError::Validation(_))
    ));
    // The batch was rejected as a whole — nothing was written.
    assert_eq!(repo.search("ok", 5).await.unwrap().len(), 0);

    assert!(matches!(
        repo.search("   ", 5).await,
        Err(RepoError::Validation(_))
    ));
    assert!(matches!(
        repo.search("query", 0).await,
        Err(RepoError::Validation(_))
    ));
    assert!(matches!(
        repo.update("anything", "  ").await,
        Err(RepoError::Validation(_))
    ));
}

#[tokio::test]
async fn update_missing_entry_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;
    repo.save(vec!["something unrelated".into()]).await.unwrap();

    let err = repo
        .update("an entry that does not exist", "replacement")
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::NotFound(_)));
}

#[tokio::test]
async fn identical_content_entries_are_distinct() {
    let dir = tempfile::tempdir().unwrap();
    let mut repo = memory_repo(dir.path()).await;

    let report = repo
        .save(vec!["duplicate text".into(), "duplicate text".into()])
        .await
        .unwrap();
    assert_ne!(report.ids[0], report.ids[1]);

    // Deleting by the shared text removes one; the other remains.
    let deleted = repo.delete(vec!["duplicate text".into()]).await.unwrap();
    assert_eq!(deleted.deleted, 1);
    assert_eq!(repo.search("duplicate text", 5).await.unwrap().len(), 1);
}
