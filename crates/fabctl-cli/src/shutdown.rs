//! # Shutdown Coordinator
//!
//! A background task that waits for SIGINT or SIGTERM and then closes the
//! factory's network session so in-flight calls fail fast instead of
//! leaving the connection open.
//!
//! The coordinator only ever closes a session that already exists: it
//! asks the factory for its cached session and never opens one. It acts at
//! most once, however many times it is notified, and it never returns an
//! error; anything that goes wrong while shutting down is logged.
//!
//! The signal source is a plain future, so tests drive the coordinator
//! with a oneshot channel instead of real signals.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use fabctl_client::Factory;
use fabctl_core::{NoticeTarget, Output};
use tokio::task::JoinHandle;

/// The signal that triggered shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Interrupt => f.write_str("SIGINT"),
            Self::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Registered interest in the process shutdown signals.
///
/// The OS handlers are installed by [`SignalListener::install`], not on
/// first poll, so a signal delivered any time after it returns is seen.
#[derive(Debug)]
pub struct SignalListener {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
    #[cfg(windows)]
    ctrl_c: tokio::signal::windows::CtrlC,
}

impl SignalListener {
    /// Install handlers for SIGINT and SIGTERM.
    #[cfg(unix)]
    pub fn install() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Install a Ctrl-C handler.
    #[cfg(windows)]
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c()?,
        })
    }

    /// Wait for the first signal.
    #[cfg(unix)]
    pub async fn recv(mut self) -> ShutdownSignal {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownSignal::Interrupt,
            _ = self.terminate.recv() => ShutdownSignal::Terminate,
        }
    }

    /// Wait for Ctrl-C.
    #[cfg(windows)]
    pub async fn recv(mut self) -> ShutdownSignal {
        self.ctrl_c.recv().await;
        ShutdownSignal::Interrupt
    }
}

/// Closes the factory's cached session once a shutdown signal arrives.
pub struct ShutdownCoordinator {
    factory: Option<Arc<dyn Factory>>,
    notices: NoticeTarget,
    out: Output,
    fired: AtomicBool,
}

impl ShutdownCoordinator {
    /// `out` receives notices when `notices` is [`NoticeTarget::Output`].
    pub fn new(factory: Option<Arc<dyn Factory>>, notices: NoticeTarget, out: Output) -> Self {
        Self {
            factory,
            notices,
            out,
            fired: AtomicBool::new(false),
        }
    }

    /// Spawn the coordinator on process signals. The handlers are in
    /// place when this returns.
    pub fn spawn(self) -> JoinHandle<()> {
        match SignalListener::install() {
            Ok(listener) => self.spawn_with(async move { Some(listener.recv().await) }),
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for shutdown signals");
                self.spawn_with(std::future::ready(None))
            }
        }
    }

    /// Spawn the coordinator on an arbitrary notifier. A notifier that
    /// resolves to `None` ends the task without shutting anything down.
    pub fn spawn_with<F>(self, notifier: F) -> JoinHandle<()>
    where
        F: Future<Output = Option<ShutdownSignal>> + Send + 'static,
    {
        tokio::spawn(async move {
            tracing::debug!("awaiting shutdown signal");
            match notifier.await {
                Some(signal) => {
                    self.shutdown(signal);
                }
                None => tracing::debug!("shutdown notifier gone, coordinator idle"),
            }
        })
    }

    /// Close the cached session. Returns `false` if shutdown already ran.
    pub fn shutdown(&self, signal: ShutdownSignal) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            tracing::debug!(%signal, "shutdown already handled");
            return false;
        }

        self.notice(format_args!("received {signal}, exiting"));
        match self.factory.as_ref().and_then(|factory| factory.cached_sdk()) {
            Some(session) => {
                self.notice("closing network session");
                session.close();
            }
            None => tracing::debug!("no network session to close"),
        }
        self.notice("shutdown complete");
        true
    }

    fn notice(&self, message: impl fmt::Display) {
        match self.notices {
            NoticeTarget::Log => tracing::info!("{message}"),
            NoticeTarget::Output => {
                if let Err(e) = self.out.line(&message) {
                    tracing::warn!(error = %e, "failed to write shutdown notice");
                }
            }
        }
    }
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("has_factory", &self.factory.is_some())
            .field("notices", &self.notices)
            .field("fired", &self.fired.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabctl_client::mock::MockFactory;
    use fabctl_client::Session;
    use fabctl_core::SharedBuffer;
    use tokio::sync::oneshot;

    fn coordinator(
        factory: Option<Arc<MockFactory>>,
        notices: NoticeTarget,
    ) -> (ShutdownCoordinator, SharedBuffer) {
        let buffer = SharedBuffer::new();
        let factory = factory.map(|f| f as Arc<dyn Factory>);
        let coordinator = ShutdownCoordinator::new(factory, notices, Output::new(buffer.clone()));
        (coordinator, buffer)
    }

    #[tokio::test]
    async fn closes_cached_session_once() {
        let factory = Arc::new(MockFactory::new());
        assert!(factory.sdk().await.is_ok());
        let (coordinator, _) = coordinator(Some(factory.clone()), NoticeTarget::Log);

        assert!(coordinator.shutdown(ShutdownSignal::Interrupt));
        assert!(!coordinator.shutdown(ShutdownSignal::Terminate));

        let session = factory.mock_session().unwrap();
        assert_eq!(session.close_calls(), 1);
        assert!(session.is_closed());
    }

    #[test]
    fn never_opens_a_session() {
        let factory = Arc::new(MockFactory::new());
        let (coordinator, _) = coordinator(Some(factory.clone()), NoticeTarget::Log);

        assert!(coordinator.shutdown(ShutdownSignal::Terminate));
        assert_eq!(factory.session_creations(), 0);
        assert!(factory.cached_sdk().is_none());
    }

    #[test]
    fn without_factory_only_notices() {
        let (coordinator, buffer) = coordinator(None, NoticeTarget::Output);
        assert!(coordinator.shutdown(ShutdownSignal::Interrupt));
        assert_eq!(buffer.contents(), "received SIGINT, exiting\nshutdown complete\n");
    }

    #[tokio::test]
    async fn output_notices_name_the_signal() {
        let factory = Arc::new(MockFactory::new());
        assert!(factory.sdk().await.is_ok());
        let (coordinator, buffer) = coordinator(Some(factory), NoticeTarget::Output);

        coordinator.shutdown(ShutdownSignal::Terminate);
        assert_eq!(
            buffer.contents(),
            "received SIGTERM, exiting\nclosing network session\nshutdown complete\n"
        );
    }

    #[test]
    fn log_notices_stay_off_the_output_stream() {
        let (coordinator, buffer) = coordinator(None, NoticeTarget::Log);
        coordinator.shutdown(ShutdownSignal::Interrupt);
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn explicit_close_then_signal_does_not_fault() {
        let factory = Arc::new(MockFactory::new());
        let session = factory.sdk().await.unwrap_or_else(|e| panic!("{e}"));
        session.close();

        let (coordinator, _) = coordinator(Some(factory.clone()), NoticeTarget::Log);
        assert!(coordinator.shutdown(ShutdownSignal::Interrupt));
        assert!(session.is_closed());
        assert_eq!(factory.mock_session().unwrap().close_calls(), 2);
    }

    #[tokio::test]
    async fn spawned_task_fires_on_notifier() {
        let factory = Arc::new(MockFactory::new());
        assert!(factory.sdk().await.is_ok());
        let (coordinator, buffer) = coordinator(Some(factory.clone()), NoticeTarget::Output);

        let (tx, rx) = oneshot::channel();
        let handle = coordinator.spawn_with(async move { rx.await.ok() });
        tx.send(ShutdownSignal::Interrupt).unwrap();
        handle.await.unwrap();

        assert!(factory.mock_session().unwrap().is_closed());
        assert!(buffer.contents().starts_with("received SIGINT"));
    }

    #[tokio::test]
    async fn dropped_notifier_leaves_session_open() {
        let factory = Arc::new(MockFactory::new());
        assert!(factory.sdk().await.is_ok());
        let (coordinator, buffer) = coordinator(Some(factory.clone()), NoticeTarget::Output);

        let (tx, rx) = oneshot::channel::<ShutdownSignal>();
        let handle = coordinator.spawn_with(async move { rx.await.ok() });
        drop(tx);
        handle.await.unwrap();

        assert!(!factory.mock_session().unwrap().is_closed());
        assert!(buffer.contents().is_empty());
    }
}
