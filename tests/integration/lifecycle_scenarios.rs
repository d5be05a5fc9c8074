//! End-to-end lifecycle scenarios through the public API.

use desktop_updater::update::{
    ErrorDetail, ErrorStage, LifecycleState, ReleaseInfo, Transition, TransportEvent,
    UpdateChannel, UserDecision,
};

use crate::helpers::{Failures, Journal, journal_lifecycle};

#[test]
fn stable_update_confirmed_installs_after_closing_windows() {
    let journal = Journal::default();
    let mut lifecycle = journal_lifecycle(false, &[1, 2], Failures::default(), &journal);
    assert_eq!(journal.take(), vec!["configure:stable"]);

    lifecycle.start_check();
    lifecycle.handle_transport_event(TransportEvent::Available(ReleaseInfo::new("10.2.0")));
    lifecycle.handle_transport_event(TransportEvent::Downloaded(ReleaseInfo::new("10.2.0")));
    assert_eq!(lifecycle.state(), LifecycleState::Confirming);

    let t = lifecycle.handle_decision(UserDecision::Confirm);
    assert_eq!(
        t,
        Transition::Applied {
            from: LifecycleState::Confirming,
            to: LifecycleState::Installing,
        }
    );
    assert_eq!(
        journal.entries(),
        vec![
            "check:stable",
            "download",
            "stat:update-check:needs-update",
            "prompt:10.2.0",
            "stat:update-download",
            "stat:update:confirm",
            "disarm",
            "close:1",
            "close:2",
            "auto_install:true",
            "install_and_quit",
            "exit",
        ]
    );
    assert!(lifecycle.session().release().is_none());
}

#[test]
fn beta_user_with_no_update_returns_to_idle() {
    let journal = Journal::default();
    let mut lifecycle = journal_lifecycle(true, &[], Failures::default(), &journal);
    assert_eq!(lifecycle.policy().channel, UpdateChannel::Beta);

    lifecycle.start_check();
    let t = lifecycle.on_transport_not_available();

    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(
        journal.entries(),
        vec![
            "configure:beta",
            "check:beta",
            "stat:update-check:no-update",
        ]
    );
}

#[test]
fn cancel_abandons_download_and_allows_next_check() {
    let journal = Journal::default();
    let mut lifecycle = journal_lifecycle(false, &[1], Failures::default(), &journal);

    lifecycle.start_check();
    lifecycle.on_transport_available(ReleaseInfo::new("3.0.0"));
    lifecycle.on_transport_downloaded(ReleaseInfo::new("3.0.0"));
    journal.take();

    let t = lifecycle.on_user_cancel();
    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(journal.take(), vec!["stat:update:cancel"]);
    assert!(lifecycle.session().release().is_none());

    assert!(lifecycle.start_check().is_applied());
    assert_eq!(journal.take(), vec!["check:stable"]);
}

#[test]
fn error_mid_download_resets_and_keeps_detail() {
    let journal = Journal::default();
    let mut lifecycle = journal_lifecycle(false, &[], Failures::default(), &journal);

    lifecycle.start_check();
    lifecycle.on_transport_available(ReleaseInfo::new("3.0.0"));
    journal.take();

    lifecycle.on_transport_error(ErrorDetail::at(ErrorStage::Download, "checksum mismatch"));

    let snap = lifecycle.snapshot();
    assert_eq!(snap.state, LifecycleState::Idle);
    assert!(snap.release.is_none());
    assert_eq!(
        snap.last_error,
        Some(ErrorDetail::at(ErrorStage::Download, "checksum mismatch"))
    );
    assert_eq!(journal.take(), vec!["stat:update:error"]);
}

#[test]
fn events_out_of_order_are_ignored_without_side_effects() {
    let journal = Journal::default();
    let mut lifecycle = journal_lifecycle(false, &[1], Failures::default(), &journal);
    journal.take();

    assert!(!lifecycle.on_user_confirm().is_applied());
    assert!(!lifecycle.on_transport_downloaded(ReleaseInfo::new("1.0.0")).is_applied());
    assert!(!lifecycle.on_transport_not_available().is_applied());

    lifecycle.start_check();
    assert!(!lifecycle.start_check().is_applied());

    assert_eq!(journal.take(), vec!["check:stable"]);
    assert_eq!(lifecycle.state(), LifecycleState::Checking);
}

#[test]
fn rejected_check_goes_through_error_edge() {
    let journal = Journal::default();
    let failures = Failures {
        check: true,
        ..Failures::default()
    };
    let mut lifecycle = journal_lifecycle(false, &[], failures, &journal);
    journal.take();

    let t = lifecycle.start_check();

    assert_eq!(t.state(), LifecycleState::Idle);
    assert_eq!(
        lifecycle.snapshot().last_error.and_then(|e| e.stage),
        Some(ErrorStage::Check)
    );
    assert_eq!(journal.take(), vec!["check:stable", "stat:update:error"]);
}

#[test]
fn failing_prompt_reports_error_instead_of_waiting() {
    let journal = Journal::default();
    let failures = Failures {
        notify: true,
        ..Failures::default()
    };
    let mut lifecycle = journal_lifecycle(false, &[], failures, &journal);

    lifecycle.start_check();
    lifecycle.on_transport_available(ReleaseInfo::new("2.0.0"));
    journal.take();
    lifecycle.on_transport_downloaded(ReleaseInfo::new("2.0.0"));

    assert_eq!(lifecycle.state(), LifecycleState::Idle);
    assert_eq!(
        journal.take(),
        vec!["prompt:2.0.0", "stat:update:error"]
    );
}

#[test]
fn window_that_refuses_to_close_still_ends_the_process() {
    let journal = Journal::default();
    let failures = Failures {
        close: Some(2),
        ..Failures::default()
    };
    let mut lifecycle = journal_lifecycle(false, &[1, 2, 3], failures, &journal);

    lifecycle.start_check();
    lifecycle.on_transport_available(ReleaseInfo::new("2.0.0"));
    lifecycle.on_transport_downloaded(ReleaseInfo::new("2.0.0"));
    journal.take();
    lifecycle.on_user_confirm();

    assert_eq!(
        journal.take(),
        vec!["stat:update:confirm", "disarm", "close:1", "close:2", "exit"]
    );
    assert_eq!(lifecycle.state(), LifecycleState::Installing);
    assert!(!lifecycle.on_transport_error(ErrorDetail::new("late")).is_applied());
}
