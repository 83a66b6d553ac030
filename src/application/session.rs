//! Recording session controller
//!
//! Owns one capture subprocess at a time: starts it, supervises it on a
//! dedicated task, stops it gracefully (escalating to a kill after the
//! grace period) and turns its output into a registered clip. A capture
//! that dies on its own is salvaged and reported through [`SessionEvent`].

use std::collections::VecDeque;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration as StdDuration, Instant};

use chrono::{DateTime, Local, Utc};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr};
use tokio::sync::{broadcast, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::domain::clip::Clip;
use crate::domain::error::ErrorCategory;
use crate::domain::recording::{render_file_name, unique_path, Duration, InvalidTemplate};
use crate::domain::session::{SessionMachine, SessionState};

use super::clip_store::{ClipStore, ClipStoreError};
use super::ports::{BackendResolver, CaptureBackend};
use super::thumbnails::ThumbnailService;

/// Default readiness window after spawning the capture tool
pub const DEFAULT_STARTUP_WINDOW: StdDuration = StdDuration::from_millis(500);

const STDERR_TAIL_LINES: usize = 8;
const EVENT_CAPACITY: usize = 16;

/// How a capture process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureExit {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl CaptureExit {
    fn from_status(status: ExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;

        Self {
            code: status.code(),
            signal: status.signal(),
        }
    }

    /// Exit reported when the process could not be waited on
    fn unknown() -> Self {
        Self {
            code: None,
            signal: None,
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for CaptureExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "exit code {}", code),
            (None, Some(signal)) => write!(f, "signal {}", signal),
            (None, None) => write!(f, "unknown exit status"),
        }
    }
}

/// Errors from [`RecordingSession::start`]
#[derive(Debug, Clone, Error)]
pub enum StartError {
    #[error("No capture backend available: {0}")]
    BackendUnavailable(String),

    #[error("A recording is already in progress")]
    AlreadyRecording,

    #[error("Recordings directory {path} is not writable: {message}")]
    DirectoryUnwritable { path: String, message: String },

    #[error(transparent)]
    InvalidTemplate(#[from] InvalidTemplate),

    #[error("Failed to launch capture tool: {0}")]
    SpawnFailed(String),

    #[error("Capture tool exited immediately ({exit}){}", stderr_suffix(.stderr))]
    ExitedImmediately { exit: CaptureExit, stderr: String },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {}", stderr)
    }
}

impl StartError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BackendUnavailable(_) | Self::InvalidTemplate(_) => ErrorCategory::Configuration,
            Self::DirectoryUnwritable { .. } => ErrorCategory::Configuration,
            Self::AlreadyRecording | Self::SpawnFailed(_) | Self::ExitedImmediately { .. } => {
                ErrorCategory::Process
            }
        }
    }
}

/// Errors from [`RecordingSession::stop`]
#[derive(Debug, Clone, Error)]
pub enum StopError {
    #[error("Not recording")]
    NotRecording,

    #[error("Capture produced no output at {0}")]
    EmptyOutput(String),

    #[error("Failed to register clip: {0}")]
    Register(#[from] ClipStoreError),

    #[error("Capture supervisor ended without reporting a result")]
    SupervisorLost,
}

impl StopError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NotRecording | Self::EmptyOutput(_) | Self::SupervisorLost => {
                ErrorCategory::Process
            }
            Self::Register(_) => ErrorCategory::FileSystem,
        }
    }
}

/// Settings read once per `start`
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time between the graceful stop signal and a forced kill
    pub grace_period: Duration,
    /// An exit inside this window fails `start`
    pub startup_window: StdDuration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::default_stop_timeout(),
            startup_window: DEFAULT_STARTUP_WINDOW,
        }
    }
}

/// Identifies a running capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub backend: String,
    pub output_path: PathBuf,
    pub started_at: DateTime<Utc>,
    pub pid: Option<u32>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub state: SessionState,
    pub backend: Option<String>,
    pub output_path: Option<PathBuf>,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed: Option<StdDuration>,
    pub pid: Option<u32>,
}

/// Lifecycle notifications for observers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Started(SessionHandle),
    Stopped {
        clip: Clip,
    },
    CaptureCrashed {
        exit: CaptureExit,
        salvaged: Option<Clip>,
    },
    StopFailed {
        error: StopError,
    },
}

/// Last few stderr lines of the capture tool
#[derive(Clone, Default)]
struct StderrTail(Arc<Mutex<VecDeque<String>>>);

impl StderrTail {
    fn push(&self, line: String) {
        let mut lines = self.0.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() == STDERR_TAIL_LINES {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn last(&self) -> String {
        let lines = self.0.lock().unwrap_or_else(|e| e.into_inner());
        lines.back().cloned().unwrap_or_default()
    }

    fn follow(&self, stderr: ChildStderr) {
        let tail = self.clone();
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                debug!(target: "nova_replay::capture", "{}", line);
                tail.push(line);
            }
        });
    }
}

struct ActiveCapture {
    backend: String,
    output_path: PathBuf,
    started_at: DateTime<Utc>,
    started: Instant,
    pid: Option<u32>,
    stop_tx: Option<oneshot::Sender<()>>,
    done_rx: Option<oneshot::Receiver<Result<Clip, StopError>>>,
}

struct SessionInner {
    machine: SessionMachine,
    active: Option<ActiveCapture>,
}

struct Shared {
    inner: Mutex<SessionInner>,
    store: Arc<ClipStore>,
    thumbnails: Option<ThumbnailService>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SessionInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        // No receivers is fine
        let _ = self.events.send(event);
    }

    fn request_thumbnail(&self, clip: &Clip) {
        if let Some(thumbnails) = &self.thumbnails {
            thumbnails.request(clip.clone());
        }
    }
}

/// Recording session controller.
///
/// One instance per application; a second `start` while a capture runs is
/// rejected, not queued.
pub struct RecordingSession {
    shared: Arc<Shared>,
    resolver: Arc<dyn BackendResolver>,
    config: SessionConfig,
}

impl RecordingSession {
    pub fn new(
        resolver: Arc<dyn BackendResolver>,
        store: Arc<ClipStore>,
        thumbnails: Option<ThumbnailService>,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(SessionInner {
                    machine: SessionMachine::new(),
                    active: None,
                }),
                store,
                thumbnails,
                events,
            }),
            resolver,
            config,
        }
    }

    /// Get current session state
    pub fn state(&self) -> SessionState {
        self.shared.lock().machine.state()
    }

    /// Snapshot of the running capture, if any
    pub fn status(&self) -> SessionStatus {
        let inner = self.shared.lock();
        let active = inner.active.as_ref();
        SessionStatus {
            state: inner.machine.state(),
            backend: active.map(|a| a.backend.clone()),
            output_path: active.map(|a| a.output_path.clone()),
            started_at: active.map(|a| a.started_at),
            elapsed: active.map(|a| a.started.elapsed()),
            pid: active.and_then(|a| a.pid),
        }
    }

    /// Subscribe to lifecycle events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Start capturing into `output_directory` with a timestamped file name
    pub async fn start(
        &self,
        output_directory: &Path,
        filename_template: &str,
    ) -> Result<SessionHandle, StartError> {
        self.shared
            .lock()
            .machine
            .begin_start()
            .map_err(|_| StartError::AlreadyRecording)?;

        // Rolls back to Idle on error or if this future is dropped
        let mut guard = StartGuard {
            shared: &self.shared,
            output_path: None,
            armed: true,
        };

        let handle = self
            .launch(output_directory, filename_template, &mut guard)
            .await?;
        guard.armed = false;

        info!(
            backend = %handle.backend,
            output = %handle.output_path.display(),
            "Recording started"
        );
        self.shared.emit(SessionEvent::Started(handle.clone()));
        Ok(handle)
    }

    async fn launch(
        &self,
        output_directory: &Path,
        filename_template: &str,
        guard: &mut StartGuard<'_>,
    ) -> Result<SessionHandle, StartError> {
        let backend = self
            .resolver
            .resolve()
            .await
            .map_err(|e| StartError::BackendUnavailable(e.to_string()))?;

        let file_name = render_file_name(filename_template, &Local::now())?;
        ensure_writable(output_directory).await?;
        let output_path = unique_path(output_directory, &file_name, |p| p.exists());

        self.shared.store.mark_pending(&output_path);
        guard.output_path = Some(output_path.clone());

        match self.spawn_and_watch(Arc::clone(&backend), output_path.clone()).await {
            Err(StartError::ExitedImmediately { exit, stderr }) => {
                let Some(fallback) = self.resolver.fallback(backend.kind()).await else {
                    return Err(StartError::ExitedImmediately { exit, stderr });
                };
                warn!(
                    "{} exited at startup ({}), retrying with {}",
                    backend.name(),
                    exit,
                    fallback.name()
                );
                remove_if_empty(&output_path).await;
                self.spawn_and_watch(fallback, output_path).await
            }
            result => result,
        }
    }

    async fn spawn_and_watch(
        &self,
        backend: Arc<dyn CaptureBackend>,
        output_path: PathBuf,
    ) -> Result<SessionHandle, StartError> {
        let started = Instant::now();
        let started_at = Utc::now();
        let mut child = backend
            .start(&output_path)
            .map_err(|e| StartError::SpawnFailed(e.to_string()))?;
        let pid = child.id();

        let tail = StderrTail::default();
        if let Some(stderr) = child.stderr.take() {
            tail.follow(stderr);
        }

        if let Ok(waited) = timeout(self.config.startup_window, child.wait()).await {
            let exit = waited
                .map(CaptureExit::from_status)
                .map_err(|e| StartError::SpawnFailed(e.to_string()))?;
            // Let the reader drain what the tool printed before dying
            tokio::task::yield_now().await;
            return Err(StartError::ExitedImmediately {
                exit,
                stderr: tail.last(),
            });
        }

        let handle = SessionHandle {
            backend: backend.name(),
            output_path: output_path.clone(),
            started_at,
            pid,
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut inner = self.shared.lock();
            if inner.machine.confirm_started().is_err() {
                return Err(StartError::AlreadyRecording);
            }
            inner.active = Some(ActiveCapture {
                backend: handle.backend.clone(),
                output_path,
                started_at: handle.started_at,
                started,
                pid,
                stop_tx: Some(stop_tx),
                done_rx: Some(done_rx),
            });
        }

        tokio::spawn(supervise(
            Arc::clone(&self.shared),
            backend,
            child,
            Supervision {
                stop_rx,
                done_tx,
                tail,
                started,
                grace: self.config.grace_period.as_std(),
            },
        ));

        Ok(handle)
    }

    /// Stop the capture and register its output as a clip.
    ///
    /// Fails with [`StopError::NotRecording`] without side effects unless a
    /// capture is running. The supervisor task finishes the stop even if
    /// this future is dropped.
    pub async fn stop(&self) -> Result<Clip, StopError> {
        let (stop_tx, done_rx) = {
            let mut inner = self.shared.lock();
            inner
                .machine
                .begin_stop()
                .map_err(|_| StopError::NotRecording)?;
            match inner.active.as_mut() {
                Some(active) => (active.stop_tx.take(), active.done_rx.take()),
                None => {
                    let _ = inner.machine.finish_stop();
                    return Err(StopError::NotRecording);
                }
            }
        };

        info!("Stopping recording");
        if let Some(tx) = stop_tx {
            let _ = tx.send(());
        }

        match done_rx {
            Some(rx) => rx.await.unwrap_or_else(|_| {
                error!("Capture supervisor ended without reporting a result");
                Err(StopError::SupervisorLost)
            }),
            None => Err(StopError::SupervisorLost),
        }
    }
}

/// Undoes a `start` that failed or was abandoned before the capture was up
struct StartGuard<'a> {
    shared: &'a Shared,
    output_path: Option<PathBuf>,
    armed: bool,
}

impl Drop for StartGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(path) = &self.output_path {
            if std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.len() == 0) {
                let _ = std::fs::remove_file(path);
            }
            self.shared.store.clear_pending(path);
        }
        let _ = self.shared.lock().machine.abort_start();
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        // Ask a still-running capture to finalize its file
        let mut inner = self.shared.lock();
        if inner.machine.begin_stop().is_err() {
            return;
        }
        if let Some(tx) = inner.active.as_mut().and_then(|a| a.stop_tx.take()) {
            let _ = tx.send(());
        }
    }
}

/// Channels and timing handed to the supervisor task
struct Supervision {
    stop_rx: oneshot::Receiver<()>,
    done_tx: oneshot::Sender<Result<Clip, StopError>>,
    tail: StderrTail,
    started: Instant,
    grace: StdDuration,
}

/// Wait for the capture to exit, either on request or on its own, and
/// settle the session state either way.
async fn supervise(
    shared: Arc<Shared>,
    backend: Arc<dyn CaptureBackend>,
    mut child: Child,
    supervision: Supervision,
) {
    let Supervision {
        stop_rx,
        done_tx,
        tail,
        started,
        grace,
    } = supervision;

    let exited = tokio::select! {
        status = child.wait() => Some(status),
        _ = stop_rx => None,
    };
    let elapsed = started.elapsed().as_secs_f64();

    let exit = match exited {
        Some(Ok(status)) => CaptureExit::from_status(status),
        Some(Err(e)) => {
            error!("Lost track of capture process: {}", e);
            CaptureExit::unknown()
        }
        None => shutdown(backend.as_ref(), &mut child, grace).await,
    };

    let crashed = {
        let mut inner = shared.lock();
        inner.machine.mark_crashed().is_ok()
    };

    if crashed {
        handle_crash(&shared, exit, &tail).await;
        return;
    }

    debug!("Capture exited with {}", exit);
    let result = finish_stop(&shared, elapsed).await;
    // The caller may have given up waiting
    let _ = done_tx.send(result);
}

/// Register the output of a requested stop and return to Idle
async fn finish_stop(shared: &Shared, elapsed: f64) -> Result<Clip, StopError> {
    let output_path = shared.lock().active.as_ref().map(|a| a.output_path.clone());

    let result = match &output_path {
        Some(path) => finalize(shared, path, elapsed).await,
        None => Err(StopError::SupervisorLost),
    };

    {
        let mut inner = shared.lock();
        inner.active = None;
        let _ = inner.machine.finish_stop();
    }

    match &result {
        Ok(clip) => {
            info!(path = %clip.path.display(), "Recording saved");
            shared.request_thumbnail(clip);
            shared.emit(SessionEvent::Stopped { clip: clip.clone() });
        }
        Err(e) => {
            warn!("Recording could not be saved: {}", e);
            shared.emit(SessionEvent::StopFailed { error: e.clone() });
        }
    }
    result
}

async fn finalize(shared: &Shared, output_path: &Path, elapsed: f64) -> Result<Clip, StopError> {
    let store = &shared.store;
    let size = match fs::metadata(output_path).await {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            store.clear_pending(output_path);
            return Err(StopError::EmptyOutput(output_path.display().to_string()));
        }
        Err(e) => {
            store.clear_pending(output_path);
            return Err(StopError::Register(ClipStoreError::Io {
                path: output_path.display().to_string(),
                message: e.to_string(),
            }));
        }
    };

    if size == 0 {
        remove_if_empty(output_path).await;
        store.clear_pending(output_path);
        return Err(StopError::EmptyOutput(output_path.display().to_string()));
    }

    Ok(store.register(output_path, Some(elapsed)).await?)
}

/// Graceful stop, escalating to a kill once the grace period runs out
async fn shutdown(backend: &dyn CaptureBackend, child: &mut Child, grace: StdDuration) -> CaptureExit {
    if let Err(e) = backend.request_stop(child) {
        warn!("{}", e);
    }

    match timeout(grace, child.wait()).await {
        Ok(Ok(status)) => CaptureExit::from_status(status),
        Ok(Err(e)) => {
            error!("Lost track of capture process: {}", e);
            CaptureExit::unknown()
        }
        Err(_) => {
            warn!(
                "Capture did not exit within {:?}, killing it",
                grace
            );
            if let Err(e) = child.kill().await {
                error!("Failed to kill capture process: {}", e);
            }
            child
                .wait()
                .await
                .map(CaptureExit::from_status)
                .unwrap_or_else(|_| CaptureExit::unknown())
        }
    }
}

/// The capture died while recording: salvage what it wrote.
async fn handle_crash(shared: &Shared, exit: CaptureExit, tail: &StderrTail) {
    let active = shared.lock().active.take();
    warn!("Capture process exited unexpectedly ({}): {}", exit, tail.last());

    let salvaged = match active {
        Some(active) => salvage(shared, &active.output_path, active.started).await,
        None => None,
    };

    {
        let mut inner = shared.lock();
        let _ = inner.machine.finish_crash();
    }

    if let Some(clip) = &salvaged {
        warn!(path = %clip.path.display(), "Salvaged partial recording");
        shared.request_thumbnail(clip);
    }
    shared.emit(SessionEvent::CaptureCrashed { exit, salvaged });
}

async fn salvage(shared: &Shared, output_path: &Path, started: Instant) -> Option<Clip> {
    let size = fs::metadata(output_path).await.map(|m| m.len()).unwrap_or(0);
    if size == 0 {
        remove_if_empty(output_path).await;
        shared.store.clear_pending(output_path);
        return None;
    }

    let elapsed = started.elapsed().as_secs_f64();
    match shared.store.register(output_path, Some(elapsed)).await {
        Ok(clip) => Some(clip),
        Err(e) => {
            warn!("Could not register partial recording: {}", e);
            None
        }
    }
}

/// Create the directory and prove it is writable with a probe file
async fn ensure_writable(dir: &Path) -> Result<(), StartError> {
    let unwritable = |e: std::io::Error| StartError::DirectoryUnwritable {
        path: dir.display().to_string(),
        message: e.to_string(),
    };

    fs::create_dir_all(dir).await.map_err(unwritable)?;
    let probe = dir.join(format!(".nova-replay-write-test-{}", std::process::id()));
    fs::write(&probe, b"").await.map_err(unwritable)?;
    let _ = fs::remove_file(&probe).await;
    Ok(())
}

async fn remove_if_empty(path: &Path) {
    if let Ok(metadata) = fs::metadata(path).await {
        if metadata.is_file() && metadata.len() == 0 {
            let _ = fs::remove_file(path).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_exit_display() {
        let code = CaptureExit {
            code: Some(1),
            signal: None,
        };
        assert_eq!(code.to_string(), "exit code 1");
        assert!(!code.success());

        let killed = CaptureExit {
            code: None,
            signal: Some(9),
        };
        assert_eq!(killed.to_string(), "signal 9");
        assert_eq!(CaptureExit::unknown().to_string(), "unknown exit status");
    }

    #[test]
    fn start_error_categories() {
        assert_eq!(
            StartError::BackendUnavailable("none".into()).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(StartError::AlreadyRecording.category(), ErrorCategory::Process);
        let exited = StartError::ExitedImmediately {
            exit: CaptureExit::unknown(),
            stderr: "cannot open display".into(),
        };
        assert_eq!(exited.category(), ErrorCategory::Process);
        assert!(exited.to_string().ends_with(": cannot open display"));
    }

    #[test]
    fn stop_error_categories() {
        assert_eq!(StopError::NotRecording.category(), ErrorCategory::Process);
        assert_eq!(
            StopError::EmptyOutput("/x.mp4".into()).category(),
            ErrorCategory::Process
        );
    }

    #[test]
    fn default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.grace_period.as_secs(), 5);
        assert_eq!(config.startup_window, StdDuration::from_millis(500));
    }

    #[tokio::test]
    async fn unwritable_directory_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let err = ensure_writable(&blocker.join("sub")).await.unwrap_err();
        assert!(matches!(err, StartError::DirectoryUnwritable { .. }));
    }
}
