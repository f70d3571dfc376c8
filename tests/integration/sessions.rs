//! Integration tests for the search and detail sessions over a paced client.

use crate::integration::test_utils::{
    anime, not_found, paced_client, search_page, ScriptedTransport,
};
use jikan_relay::session::{DetailSession, LoadStatus, SearchSession};
use serde_json::json;
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_new_submission_supersedes_in_flight_search() {
    let transport = ScriptedTransport::new()
        .respond(200, search_page(&["Naruto"], 1, 1, 1))
        .respond(200, search_page(&["One Piece"], 1, 1, 1))
        .with_latency(Duration::from_secs(3))
        .into_arc();
    let session = SearchSession::new(paced_client(transport.clone()));

    session.set_term("naruto");
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.submit().await })
    };

    sleep(Duration::from_secs(1)).await;
    assert_eq!(session.status(), LoadStatus::Pending);

    session.set_term("one piece");
    let second = session.submit().await;

    assert_eq!(first.await.unwrap(), LoadStatus::Cancelled);
    assert_eq!(second, LoadStatus::Succeeded);

    let snap = session.snapshot();
    assert_eq!(snap.term, "one piece");
    assert_eq!(snap.results.len(), 1);
    assert_eq!(snap.results[0].title, "One Piece");
    assert!(snap.error.is_none());
    assert_eq!(transport.search_terms(), vec!["naruto", "one piece"]);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_ends_in_explicit_cancelled_state() {
    let transport = ScriptedTransport::new()
        .respond(200, search_page(&["Bleach"], 1, 2, 30))
        .respond(200, search_page(&["Bleach"], 2, 2, 30))
        .with_latency(Duration::from_secs(3))
        .into_arc();
    let session = SearchSession::new(paced_client(transport.clone()));

    session.set_term("bleach");
    assert_eq!(session.submit().await, LoadStatus::Succeeded);

    let paging = {
        let session = session.clone();
        tokio::spawn(async move { session.go_to_page(2).await })
    };
    sleep(Duration::from_secs(1)).await;
    session.cancel();

    assert_eq!(paging.await.unwrap().unwrap(), LoadStatus::Cancelled);
    let snap = session.snapshot();
    assert_eq!(snap.status, LoadStatus::Cancelled);
    assert!(snap.error.is_none(), "cancellation is never reported as an error");
    // Previous page stays visible.
    assert_eq!(snap.results[0].title, "Bleach");
    assert_eq!(snap.pagination.unwrap().current_page, 1);
}

#[tokio::test(start_paused = true)]
async fn test_failed_search_clears_results_and_records_message() {
    let transport = ScriptedTransport::new()
        .respond(200, search_page(&["Monster"], 1, 1, 1))
        .respond(500, json!({ "message": "Internal Server Error" }))
        .into_arc();
    let session = SearchSession::new(paced_client(transport));

    session.set_term("monster");
    session.submit().await;
    session.set_term("monsters");
    assert_eq!(session.submit().await, LoadStatus::Failed);

    let snap = session.snapshot();
    assert!(snap.results.is_empty());
    assert!(snap.pagination.is_none());
    assert_eq!(
        snap.error.as_deref(),
        Some("HTTP error! status: 500 (Internal Server Error)")
    );
}

#[tokio::test(start_paused = true)]
async fn test_blank_term_cancels_pending_and_goes_idle() {
    let transport = ScriptedTransport::new()
        .always(200, search_page(&["x"], 1, 1, 1))
        .with_latency(Duration::from_secs(3))
        .into_arc();
    let session = SearchSession::new(paced_client(transport.clone()));

    session.set_term("x");
    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.submit().await })
    };
    sleep(Duration::from_millis(500)).await;

    session.set_term("");
    assert_eq!(session.submit().await, LoadStatus::Idle);
    assert_eq!(pending.await.unwrap(), LoadStatus::Cancelled);
    assert_eq!(session.status(), LoadStatus::Idle);
    assert_eq!(transport.call_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_letter_search_sends_initial() {
    let transport = ScriptedTransport::new()
        .always(200, search_page(&["Kanon"], 1, 1, 1))
        .into_arc();
    let session = SearchSession::new(paced_client(transport.clone()));

    assert_eq!(session.select_letter('k').await.unwrap(), LoadStatus::Succeeded);
    assert_eq!(transport.search_terms(), vec!["K"]);
    assert_eq!(session.snapshot().query(), "K");
}

#[tokio::test(start_paused = true)]
async fn test_detail_session_lifecycle() {
    let transport = ScriptedTransport::new()
        .respond(200, json!({ "data": anime(1, "Cowboy Bebop") }))
        .respond(404, not_found())
        .into_arc();
    let session = DetailSession::new(paced_client(transport));

    assert_eq!(session.status(), LoadStatus::Idle);
    assert_eq!(session.load(1).await, LoadStatus::Succeeded);
    assert_eq!(session.snapshot().detail.unwrap().title, "Cowboy Bebop");

    assert_eq!(session.load(999).await, LoadStatus::Failed);
    let snap = session.snapshot();
    assert!(snap.detail.is_none());
    assert_eq!(
        snap.error.as_deref(),
        Some("HTTP error! status: 404 (Resource does not exist)")
    );
}

#[tokio::test(start_paused = true)]
async fn test_detail_clear_discards_in_flight_result() {
    let transport = ScriptedTransport::new()
        .always(200, json!({ "data": anime(5, "Trigun") }))
        .with_latency(Duration::from_secs(2))
        .into_arc();
    let session = DetailSession::new(paced_client(transport));

    let loading = {
        let session = session.clone();
        tokio::spawn(async move { session.load(5).await })
    };
    sleep(Duration::from_millis(500)).await;
    session.clear();

    assert_eq!(loading.await.unwrap(), LoadStatus::Cancelled);
    let snap = session.snapshot();
    assert_eq!(snap.status, LoadStatus::Idle);
    assert!(snap.id.is_none());
}
