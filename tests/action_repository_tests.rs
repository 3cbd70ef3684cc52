//! Integration tests for the SeaORM-backed action store.

mod test_utils;

use activity_feed::action::{Action, FileChanges, RequestType};
use activity_feed::repositories::{ActionStore, DEFAULT_RECENT_LIMIT};
use test_utils::{at, pull_request_action, setup_repository};

#[tokio::test]
async fn inserted_action_reads_back_unchanged() {
    let repo = setup_repository().await.unwrap();

    let action = Action {
        id: "abc123".to_string(),
        message: "Add feed".to_string(),
        timestamp: at(14, 7),
        author: "alice".to_string(),
        to_branch: "main".to_string(),
        from_branch: None,
        request_type: RequestType::Push,
        file_changes: Some(FileChanges::new(
            vec!["src/feed.rs".to_string()],
            vec!["Cargo.toml".to_string()],
            vec![],
        )),
        commit_url: Some("https://github.com/acme/feed/commit/abc123".to_string()),
        files_changed: Some(2),
    };

    let store_id = repo.create(&action).await.unwrap();
    let stored = repo.find_recent(DEFAULT_RECENT_LIMIT).await.unwrap();

    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].store_id, store_id);
    assert_eq!(stored[0].action, action);
}

#[tokio::test]
async fn list_recent_returns_newest_first_up_to_limit() {
    let repo = setup_repository().await.unwrap();

    for (id, minute) in [("first", 1), ("third", 3), ("second", 2)] {
        assert!(repo.insert(&pull_request_action(id, at(10, minute))).await);
    }

    let recent = repo.list_recent(2).await;
    let ids: Vec<_> = recent.iter().map(|s| s.action.id.as_str()).collect();
    assert_eq!(ids, ["third", "second"]);

    assert_eq!(repo.list_recent(DEFAULT_RECENT_LIMIT).await.len(), 3);
}

#[tokio::test]
async fn store_ids_are_distinct_for_repeated_events() {
    let repo = setup_repository().await.unwrap();
    let action = pull_request_action("dup", at(9, 0));

    let first = repo.create(&action).await.unwrap();
    let second = repo.create(&action).await.unwrap();

    assert_ne!(first, second);
    assert_eq!(repo.list_recent(DEFAULT_RECENT_LIMIT).await.len(), 2);
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let repo = setup_repository().await.unwrap();
    assert!(repo.list_recent(DEFAULT_RECENT_LIMIT).await.is_empty());
}
