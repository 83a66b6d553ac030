//! Signal handling for the record command

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tracing::debug;

/// Why the recorder was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// SIGINT: Ctrl+C or `nova-replay stop`
    Interrupt,
    /// SIGTERM: session logout, service manager
    Terminate,
}

impl StopSignal {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        }
    }
}

/// Recorder signal handler.
///
/// Both SIGINT and SIGTERM request a graceful stop so the clip is saved.
pub struct StopSignalHandler {
    receiver: mpsc::Receiver<StopSignal>,
}

impl StopSignalHandler {
    /// Install handlers for SIGINT and SIGTERM
    pub fn new() -> Result<Self, std::io::Error> {
        let (tx, rx) = mpsc::channel(4);

        let tx_int = tx.clone();
        let mut sigint = signal(SignalKind::interrupt())?;
        tokio::spawn(async move {
            while sigint.recv().await.is_some() {
                debug!("Received SIGINT");
                if tx_int.send(StopSignal::Interrupt).await.is_err() {
                    break;
                }
            }
        });

        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::spawn(async move {
            while sigterm.recv().await.is_some() {
                debug!("Received SIGTERM");
                if tx.send(StopSignal::Terminate).await.is_err() {
                    break;
                }
            }
        });

        Ok(Self { receiver: rx })
    }

    /// Wait for the next stop request
    pub async fn recv(&mut self) -> Option<StopSignal> {
        self.receiver.recv().await
    }
}
