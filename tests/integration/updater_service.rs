//! The event queue around the lifecycle, driven from concurrent producers.

use std::time::Duration;

use desktop_updater::update::{
    LifecycleState, ReleaseInfo, TransportEvent, UpdaterService, UserDecision, spawn_poller,
    updater_channel,
};
use tokio_util::sync::CancellationToken;

use crate::helpers::{Failures, Journal, journal_lifecycle};

#[tokio::test]
async fn concurrent_check_requests_start_one_check() {
    let journal = Journal::default();
    let (handle, inbox) = updater_channel(16);
    let service = tokio::spawn(
        UpdaterService::new(inbox, journal_lifecycle(false, &[], Failures::default(), &journal))
            .run(),
    );

    let mut producers = Vec::new();
    for _ in 0..5 {
        let handle = handle.clone();
        producers.push(tokio::spawn(async move { handle.start_check().await }));
    }
    for producer in producers {
        producer.await.unwrap().unwrap();
    }

    let snap = handle.status().await.unwrap();
    assert_eq!(snap.state, LifecycleState::Checking);
    let checks = journal
        .entries()
        .iter()
        .filter(|e| e.starts_with("check:"))
        .count();
    assert_eq!(checks, 1);

    drop(handle);
    service.await.unwrap();
}

#[tokio::test]
async fn transport_events_from_sync_callbacks_are_applied_in_order() {
    let journal = Journal::default();
    let (handle, inbox) = updater_channel(16);
    let service = tokio::spawn(
        UpdaterService::new(inbox, journal_lifecycle(false, &[4], Failures::default(), &journal))
            .run(),
    );

    handle.start_check().await.unwrap();
    let callback = handle.clone();
    std::thread::spawn(move || {
        callback
            .try_transport_event(TransportEvent::Available(ReleaseInfo::new("5.0.0")))
            .unwrap();
        callback
            .try_transport_event(TransportEvent::Downloaded(ReleaseInfo::new("5.0.0")))
            .unwrap();
    })
    .join()
    .unwrap();

    let snap = handle.status().await.unwrap();
    assert_eq!(snap.state, LifecycleState::Confirming);
    assert_eq!(snap.release, Some(ReleaseInfo::new("5.0.0")));

    handle.decide(UserDecision::Confirm).await.unwrap();
    let last = service.await.unwrap();
    assert_eq!(last.state, LifecycleState::Installing);
    assert_eq!(journal.entries().last().map(String::as_str), Some("exit"));
}

#[tokio::test(start_paused = true)]
async fn poller_drives_checks_until_cancelled() {
    let journal = Journal::default();
    let (handle, inbox) = updater_channel(16);
    let service = tokio::spawn(
        UpdaterService::new(inbox, journal_lifecycle(false, &[], Failures::default(), &journal))
            .run(),
    );
    let cancel = CancellationToken::new();
    let poller = spawn_poller(
        handle.clone(),
        Duration::from_secs(300),
        Duration::from_secs(60),
        cancel.clone(),
    );

    tokio::time::sleep(Duration::from_secs(301)).await;
    assert_eq!(handle.status().await.unwrap().state, LifecycleState::Checking);

    handle
        .transport_event(TransportEvent::NotAvailable)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(handle.status().await.unwrap().state, LifecycleState::Checking);

    cancel.cancel();
    poller.await.unwrap();
    drop(handle);
    service.await.unwrap();

    let checks = journal
        .entries()
        .iter()
        .filter(|e| e.starts_with("check:"))
        .count();
    assert_eq!(checks, 2);
}
