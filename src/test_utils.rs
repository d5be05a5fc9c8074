//! Recording collaborator doubles shared by unit tests.
//!
//! Every double appends to one [`CallLog`] so tests can assert the order of
//! calls across transport, notifier, analytics, and host.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use crate::error::{Result, UpdaterError};
use crate::update::analytics::{AnalyticsEvent, AnalyticsRecord, AnalyticsReporter};
use crate::update::channel::{ChannelPolicy, UpdateChannel};
use crate::update::notifier::Notifier;
use crate::update::quit::{ApplicationHost, WindowId};
use crate::update::session::ReleaseInfo;
use crate::update::transport::{TransportConfig, UpdateTransport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Configure(TransportConfig),
    CheckForUpdates(UpdateChannel),
    Download,
    SetAutoInstallOnQuit(bool),
    InstallAndQuit,
    PresentConfirmCancel(String),
    DebugMessage(String),
    Analytics(AnalyticsEvent),
    DisarmExitGuards,
    CloseWindow(WindowId),
    Exit,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    pub(crate) fn push(&self, call: Call) {
        self.0.lock().expect("lock call log").push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.0.lock().expect("lock call log").clone()
    }

    pub(crate) fn analytics(&self) -> Vec<AnalyticsEvent> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Analytics(event) => Some(event),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn count(&self, call: &Call) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }
}

pub(crate) struct RecordingTransport {
    log: CallLog,
    fail_check: bool,
    fail_download: bool,
    fail_install: bool,
}

impl RecordingTransport {
    pub(crate) fn new(log: CallLog) -> Self {
        Self {
            log,
            fail_check: false,
            fail_download: false,
            fail_install: false,
        }
    }

    pub(crate) fn failing_check(mut self) -> Self {
        self.fail_check = true;
        self
    }

    pub(crate) fn failing_download(mut self) -> Self {
        self.fail_download = true;
        self
    }

    pub(crate) fn failing_install(mut self) -> Self {
        self.fail_install = true;
        self
    }
}

impl UpdateTransport for RecordingTransport {
    fn configure(&self, config: &TransportConfig) -> Result<()> {
        self.log.push(Call::Configure(*config));
        Ok(())
    }

    fn check_for_updates(&self, policy: &ChannelPolicy) -> Result<()> {
        self.log.push(Call::CheckForUpdates(policy.channel));
        if self.fail_check {
            return Err(UpdaterError::Transport("offline".to_owned()));
        }
        Ok(())
    }

    fn download(&self) -> Result<()> {
        self.log.push(Call::Download);
        if self.fail_download {
            return Err(UpdaterError::Transport("no space left".to_owned()));
        }
        Ok(())
    }

    fn set_auto_install_on_quit(&self, enabled: bool) -> Result<()> {
        self.log.push(Call::SetAutoInstallOnQuit(enabled));
        Ok(())
    }

    fn install_and_quit(&self) -> Result<()> {
        self.log.push(Call::InstallAndQuit);
        if self.fail_install {
            return Err(UpdaterError::Transport("installer missing".to_owned()));
        }
        Ok(())
    }
}

pub(crate) struct RecordingNotifier {
    log: CallLog,
    fail: bool,
}

impl RecordingNotifier {
    pub(crate) fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl Notifier for RecordingNotifier {
    fn present_confirm_cancel(&self, release: &ReleaseInfo) -> Result<()> {
        self.log
            .push(Call::PresentConfirmCancel(release.version.clone()));
        if self.fail {
            return Err(UpdaterError::Notifier("no display".to_owned()));
        }
        Ok(())
    }

    fn debug_message(&self, message: &str) -> Result<()> {
        self.log.push(Call::DebugMessage(message.to_owned()));
        Ok(())
    }
}

pub(crate) struct RecordingAnalytics {
    log: CallLog,
    fail: bool,
}

impl RecordingAnalytics {
    pub(crate) fn new(log: CallLog) -> Self {
        Self { log, fail: false }
    }

    pub(crate) fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

impl AnalyticsReporter for RecordingAnalytics {
    fn record(&self, record: &AnalyticsRecord) -> Result<()> {
        self.log.push(Call::Analytics(record.event));
        if self.fail {
            return Err(UpdaterError::Analytics("stats backend down".to_owned()));
        }
        Ok(())
    }
}

pub(crate) struct RecordingHost {
    log: CallLog,
    windows: Mutex<Vec<WindowId>>,
    failing_close: Option<WindowId>,
}

impl RecordingHost {
    pub(crate) fn with_windows(log: CallLog, windows: &[WindowId]) -> Self {
        Self {
            log,
            windows: Mutex::new(windows.to_vec()),
            failing_close: None,
        }
    }

    pub(crate) fn failing_close(mut self, id: WindowId) -> Self {
        self.failing_close = Some(id);
        self
    }
}

impl ApplicationHost for RecordingHost {
    fn disarm_exit_guards(&self) -> Result<()> {
        self.log.push(Call::DisarmExitGuards);
        Ok(())
    }

    fn open_windows(&self) -> Vec<WindowId> {
        self.windows.lock().expect("lock windows").clone()
    }

    fn close_window(&self, id: WindowId) -> Result<()> {
        self.log.push(Call::CloseWindow(id));
        if self.failing_close == Some(id) {
            return Err(UpdaterError::Host(format!("window {id} refused to close")));
        }
        self.windows.lock().expect("lock windows").retain(|w| *w != id);
        Ok(())
    }

    fn exit(&self) {
        self.log.push(Call::Exit);
    }
}
