//! E2E tests for the account cleanup run
//!
//! Exercises the full scan-and-purge pass against a real SQLite database.

mod common;

use chrono::{Duration, Utc};
use common::TestApp;
use sarkariminds_reaper::data::NotificationKind;
use sarkariminds_reaper::service::CandidateState;

#[tokio::test]
async fn test_expired_account_fully_removed() {
    let app = TestApp::new().await;

    // expired is referenced from every direction:
    // follower follows expired, expired follows followed,
    // partner holds an accepted connection with expired.
    let expired = app.register("expired").await;
    let follower = app.register("follower").await;
    let followed = app.register("followed").await;
    let partner = app.register("partner").await;

    app.accounts.follow(&follower.id, &expired.id).await.unwrap();
    app.accounts.follow(&expired.id, &followed.id).await.unwrap();
    app.connect(&expired, &partner).await;

    app.accounts.create_post(&expired.id, "leaving soon").await.unwrap();
    app.accounts.create_post(&expired.id, "one more").await.unwrap();
    app.accounts.create_post(&partner.id, "staying").await.unwrap();

    // An unrelated notification that must survive the purge
    app.accounts.follow(&follower.id, &followed.id).await.unwrap();

    app.schedule_deletion_at(&expired.id, Utc::now() - Duration::hours(1))
        .await;

    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.removed, 1);
    assert_eq!(report.failed, 0);
    assert_eq!(report.outcomes[0].state, CandidateState::Done);
    assert!(report.outcomes[0].account_removed);

    // The account row is gone, the other accounts survive
    assert!(app.db.get_account(&expired.id).await.unwrap().is_none());
    for survivor in [&follower.id, &followed.id, &partner.id] {
        assert!(app.db.get_account(survivor).await.unwrap().is_some());
    }

    // No surviving relationship list holds the removed ID
    assert!(app.db.following_ids(&follower.id).await.unwrap().contains(&followed.id));
    assert!(!app.db.following_ids(&follower.id).await.unwrap().contains(&expired.id));
    assert!(!app.db.follower_ids(&followed.id).await.unwrap().contains(&expired.id));
    assert!(app.db.connection_peer_ids(&partner.id).await.unwrap().is_empty());

    // Connection records and posts referencing the account are gone
    assert!(
        app.db
            .get_connection_between(&expired.id, &partner.id)
            .await
            .unwrap()
            .is_none()
    );
    assert!(app.db.posts_by_author(&expired.id).await.unwrap().is_empty());
    assert_eq!(app.db.posts_by_author(&partner.id).await.unwrap().len(), 1);

    // Notifications to or from the account are gone, unrelated ones survive
    assert!(app.db.notifications_for(&expired.id, 10).await.unwrap().is_empty());
    assert!(app.db.notifications_for(&partner.id, 10).await.unwrap().is_empty());
    let followed_notifications = app.db.notifications_for(&followed.id, 10).await.unwrap();
    assert_eq!(followed_notifications.len(), 1);
    assert_eq!(followed_notifications[0].sender_id, follower.id);

    // A second run finds nothing left to do
    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 0);
}

#[tokio::test]
async fn test_unscheduled_and_future_accounts_are_untouched() {
    let app = TestApp::new().await;

    let expired = app.register("expired").await;
    let unscheduled = app.register("unscheduled").await;
    let future = app.register("future").await;

    app.accounts.create_post(&unscheduled.id, "keep me").await.unwrap();
    app.accounts.create_post(&future.id, "keep me too").await.unwrap();

    app.schedule_deletion_at(&expired.id, Utc::now() - Duration::days(2))
        .await;
    app.schedule_deletion_at(&future.id, Utc::now() + Duration::days(14))
        .await;

    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.removed, 1);

    assert!(app.db.get_account(&expired.id).await.unwrap().is_none());

    // Untouched, including their data and the future account's pending date
    assert!(app.db.get_account(&unscheduled.id).await.unwrap().is_some());
    assert_eq!(app.db.posts_by_author(&unscheduled.id).await.unwrap().len(), 1);
    let future_account = app.db.get_account(&future.id).await.unwrap().unwrap();
    assert!(future_account.scheduled_deletion_at.is_some());
    assert_eq!(app.db.posts_by_author(&future.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_grace_period_boundary() {
    let app = TestApp::new().await;

    let account = app.register("leaving").await;
    let scheduled_at = app.accounts.request_deletion(&account.id).await.unwrap();

    // Before the scheduled date nothing happens
    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 0);
    assert!(app.db.get_account(&account.id).await.unwrap().is_some());

    // At the scheduled date the account becomes a candidate
    let report = app.cleanup.run(scheduled_at).await.unwrap();
    assert_eq!(report.scanned, 1);
    assert_eq!(report.removed, 1);
    assert!(app.db.get_account(&account.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_cancelled_deletion_is_never_picked_up() {
    let app = TestApp::new().await;

    let account = app.register("staying").await;
    let scheduled_at = app.accounts.request_deletion(&account.id).await.unwrap();
    app.accounts.cancel_deletion(&account.id).await.unwrap();

    // Even well past the original date the account is invisible to the scan
    let report = app
        .cleanup
        .run(scheduled_at + Duration::days(365))
        .await
        .unwrap();
    assert_eq!(report.scanned, 0);
    assert!(app.db.get_account(&account.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_multiple_candidates_processed_in_one_run() {
    let app = TestApp::new().await;

    let first = app.register("first").await;
    let second = app.register("second").await;
    let survivor = app.register("survivor").await;

    // The candidates reference each other and the survivor
    app.accounts.follow(&first.id, &second.id).await.unwrap();
    app.accounts.follow(&second.id, &first.id).await.unwrap();
    app.accounts.follow(&survivor.id, &first.id).await.unwrap();
    app.accounts.follow(&survivor.id, &second.id).await.unwrap();
    app.connect(&first, &survivor).await;

    app.schedule_deletion_at(&first.id, Utc::now() - Duration::days(3))
        .await;
    app.schedule_deletion_at(&second.id, Utc::now() - Duration::days(1))
        .await;

    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.removed, 2);
    assert_eq!(report.failed, 0);

    // Candidates are ordered by their deletion date
    assert_eq!(report.outcomes[0].username, "first");
    assert_eq!(report.outcomes[1].username, "second");

    assert!(app.db.get_account(&first.id).await.unwrap().is_none());
    assert!(app.db.get_account(&second.id).await.unwrap().is_none());
    assert!(app.db.following_ids(&survivor.id).await.unwrap().is_empty());
    assert!(app.db.connection_peer_ids(&survivor.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_run_with_no_candidates_changes_nothing() {
    let app = TestApp::new().await;

    let alpha = app.register("alpha").await;
    let beta = app.register("beta").await;
    app.accounts.follow(&alpha.id, &beta.id).await.unwrap();
    app.accounts.create_post(&alpha.id, "still here").await.unwrap();
    app.notifications
        .dispatch(&alpha.id, &beta.id, NotificationKind::PostLiked, None, None)
        .await
        .unwrap();

    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(report.removed, 0);
    assert_eq!(report.failed, 0);
    assert!(report.outcomes.is_empty());

    // Everything is exactly where it was
    assert!(app.db.get_account(&alpha.id).await.unwrap().is_some());
    assert!(app.db.get_account(&beta.id).await.unwrap().is_some());
    assert_eq!(app.db.following_ids(&alpha.id).await.unwrap(), vec![beta.id.clone()]);
    assert_eq!(app.db.follower_ids(&beta.id).await.unwrap(), vec![alpha.id.clone()]);
    assert_eq!(app.db.posts_by_author(&alpha.id).await.unwrap().len(), 1);
    assert_eq!(app.db.notifications_for(&alpha.id, 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_candidate_in_every_list_role_is_pruned_everywhere() {
    let app = TestApp::new().await;

    let expired = app.register("expired").await;
    let holder = app.register("holder").await;

    // holder's three lists all contain the expired account
    app.accounts.follow(&holder.id, &expired.id).await.unwrap();
    app.accounts.follow(&expired.id, &holder.id).await.unwrap();
    app.connect(&holder, &expired).await;

    assert_eq!(app.db.following_ids(&holder.id).await.unwrap(), vec![expired.id.clone()]);
    assert_eq!(app.db.follower_ids(&holder.id).await.unwrap(), vec![expired.id.clone()]);
    assert_eq!(app.db.connection_peer_ids(&holder.id).await.unwrap(), vec![expired.id.clone()]);

    app.schedule_deletion_at(&expired.id, Utc::now() - Duration::minutes(5))
        .await;
    let report = app.cleanup.run(Utc::now()).await.unwrap();
    assert_eq!(report.removed, 1);
    assert!(report.outcomes[0].pruned_list_entries >= 3);

    assert!(app.db.following_ids(&holder.id).await.unwrap().is_empty());
    assert!(app.db.follower_ids(&holder.id).await.unwrap().is_empty());
    assert!(app.db.connection_peer_ids(&holder.id).await.unwrap().is_empty());
}
