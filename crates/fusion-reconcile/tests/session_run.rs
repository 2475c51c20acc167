//! Whole removal runs for one user

use fusion_reconcile::{RemovalRequest, Session};
use fusion_test_utils::{id, FixtureBuilder};
use pretty_assertions::assert_eq;
use std::sync::Arc;

#[tokio::test]
async fn queued_targets_follow_the_cascade() {
    let fx = FixtureBuilder::new()
        .artifact("1.59", "Bob")
        .artifact("1.59a", "Alice")
        .artifact("1.59b", "Carol")
        .artifact("1.59c", "Alice")
        .artifact("1.59d", "Dan")
        .build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let report = session.run(&RemovalRequest::new("Alice")).await.unwrap();

    // 1.59c became 1.59b once 1.59a was gone
    assert_eq!(report.removed, vec![id("1.59a"), id("1.59b")]);
    assert!(report.skipped.is_empty());
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);

    assert_eq!(
        fx.ledger_text(),
        "1.59,Bob,alt,\n1.59a,Carol,alt,\n1.59b,Dan,alt,\n"
    );
    assert_eq!(fx.file_contents("1.59a"), "1.59b");
    assert_eq!(fx.file_contents("1.59b"), "1.59d");
    assert!(!fx.has_file("1.59c"));
    assert_eq!(fx.responses(), vec!["1.59.png", "1.59a.png", "1.59b.png"]);
    assert_eq!(fx.credits(), vec!["1.59", "1.59a", "1.59b"]);
}

#[tokio::test]
async fn collaborations_are_kept_unless_requested() {
    let fx = FixtureBuilder::new()
        .artifact("3.1", "Alice")
        .artifact("3.2", "Alice & Bob")
        .artifact("3.3", "Alice & Game Freak")
        .build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let report = session.run(&RemovalRequest::new("alice")).await.unwrap();

    assert_eq!(report.removed, vec![id("3.1"), id("3.3")]);
    assert_eq!(report.plan.held_back, vec!["3.2"]);
    assert_eq!(fx.ledger_ids(), vec!["3.2"]);

    let report = session
        .run(&RemovalRequest::new("alice").with_collabs(true))
        .await
        .unwrap();
    assert_eq!(report.removed, vec![id("3.2")]);
    assert!(fx.ledger_ids().is_empty());
}

#[tokio::test]
async fn only_limits_the_run() {
    let fx = FixtureBuilder::new()
        .artifact("4.1", "Alice")
        .artifact("4.2", "Alice")
        .build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let request = RemovalRequest::new("Alice").with_only(["4.2", "9.9"]);
    let report = session.run(&request).await.unwrap();

    assert_eq!(report.removed, vec![id("4.2")]);
    assert_eq!(report.plan.not_found, vec!["9.9"]);
    assert_eq!(fx.ledger_ids(), vec!["4.1"]);
}

#[tokio::test]
async fn duplicate_ranks_skip_only_that_artifact() {
    let fx = FixtureBuilder::new()
        .artifact("6.6a", "Alice")
        .artifact("6.6b", "Bob")
        .ledger_row("6.6b", "Carol")
        .artifact("7.7", "Alice")
        .build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let report = session.run(&RemovalRequest::new("Alice")).await.unwrap();

    assert_eq!(report.removed, vec![id("7.7")]);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].0, id("6.6a"));
    assert!(fx.has_file("6.6a"), "skipped artifact is untouched");
    assert_eq!(fx.credits(), vec!["6.6a", "6.6b"]);
}

#[tokio::test]
async fn backup_copies_before_removal() {
    let fx = FixtureBuilder::new()
        .artifact("8.8", "Alice")
        .artifact("8.9", "Bob")
        .build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let request = RemovalRequest::new("Alice").with_backup(true);
    let report = session.run(&request).await.unwrap();

    let backup = report.backup.expect("backup requested");
    assert_eq!(backup.copied, 1);
    let saved = backup.dir.join("CustomBattlers").join("8.8.png");
    assert_eq!(std::fs::read_to_string(saved).unwrap(), "8.8");
    assert_eq!(
        std::fs::read_to_string(backup.dir.join("Sprite Credits.csv")).unwrap(),
        "8.8,Alice,alt,\n"
    );
    assert!(!fx.has_file("8.8"));
}

#[tokio::test]
async fn nothing_selected_touches_nothing() {
    let fx = FixtureBuilder::new().artifact("1.1", "Bob").build();
    let mut session = Session::new(fx.config.clone(), Arc::clone(&fx.store));

    let report = session.run(&RemovalRequest::new("Alice")).await.unwrap();

    assert!(report.removed.is_empty());
    assert_eq!(fx.store.calls().reads, 0);
    assert_eq!(fx.ledger_ids(), vec!["1.1"]);
}

#[tokio::test(start_paused = true)]
async fn pause_precedes_first_remote_call() {
    let fx = FixtureBuilder::new().artifact("1.1", "Alice").build();
    let config = fx.config.clone().with_pre_delete_pause(5);
    let mut session = Session::new(config, Arc::clone(&fx.store));

    let started = tokio::time::Instant::now();
    session.run(&RemovalRequest::new("Alice")).await.unwrap();

    assert!(started.elapsed() >= std::time::Duration::from_secs(5));
    assert!(fx.ledger_ids().is_empty());
    assert!(session.engine().snapshot(fusion_store::StoreKind::Credits).unwrap().is_empty());
}
