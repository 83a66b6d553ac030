//! Recording session integration tests
//!
//! Capture tools are `sh` scripts run through the custom command backend;
//! the output path arrives as `$0`.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration as StdDuration, Instant};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::time::timeout;

use nova_replay::application::ports::{
    BackendResolver, CaptureBackend, MediaProbe, ProbeError, StreamCopier, StreamCopyError,
};
use nova_replay::application::{
    ClipStore, RecordingSession, SessionConfig, SessionEvent, StartError, StopError, TrimEngine,
};
use nova_replay::domain::capture::{BackendSelectionError, CaptureBackendKind};
use nova_replay::domain::clip::TrimRange;
use nova_replay::domain::recording::{Duration, DEFAULT_FILENAME_TEMPLATE};
use nova_replay::domain::SessionState;
use nova_replay::infrastructure::{CommandBackend, FixedBackendResolver};

/// 10 s for recordings; trims come back widened to the keyframe before
/// their start, as a stream copy does
struct ClipProbe;

#[async_trait]
impl MediaProbe for ClipProbe {
    async fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
        let name = path.file_name().unwrap().to_string_lossy();
        Ok(if name.contains("_trim_") { 4.6 } else { 10.0 })
    }
}

/// Every file is unreadable, so durations fall back to elapsed time
struct BrokenProbe;

#[async_trait]
impl MediaProbe for BrokenProbe {
    async fn duration(&self, path: &Path) -> Result<f64, ProbeError> {
        Err(ProbeError::Unreadable(path.display().to_string()))
    }
}

/// Writes a marker instead of cutting video
struct MarkerCopier;

#[async_trait]
impl StreamCopier for MarkerCopier {
    async fn copy_range(
        &self,
        _input: &Path,
        range: TrimRange,
        output: &Path,
    ) -> Result<(), StreamCopyError> {
        let marker = format!("{}-{}", range.start(), range.end());
        tokio::fs::write(output, marker)
            .await
            .map_err(|e| StreamCopyError::Io(e.to_string()))
    }
}

fn script_backend(script: &str) -> Arc<dyn CaptureBackend> {
    Arc::new(CommandBackend::new(
        "sh",
        vec!["-c".to_string(), script.to_string()],
    ))
}

/// Resolves to `primary` and offers `fallback` once it fails
struct FallbackResolver {
    primary: Arc<dyn CaptureBackend>,
    fallback: Arc<dyn CaptureBackend>,
    failed: Mutex<Vec<CaptureBackendKind>>,
}

#[async_trait]
impl BackendResolver for FallbackResolver {
    async fn resolve(&self) -> Result<Arc<dyn CaptureBackend>, BackendSelectionError> {
        Ok(Arc::clone(&self.primary))
    }

    async fn fallback(&self, failed: CaptureBackendKind) -> Option<Arc<dyn CaptureBackend>> {
        self.failed.lock().unwrap().push(failed);
        Some(Arc::clone(&self.fallback))
    }
}

struct Fixture {
    dir: TempDir,
    store: Arc<ClipStore>,
    session: RecordingSession,
}

impl Fixture {
    async fn new(script: &str, probe: Arc<dyn MediaProbe>) -> Self {
        Self::with_grace(script, probe, Duration::from_secs(5)).await
    }

    async fn with_grace(script: &str, probe: Arc<dyn MediaProbe>, grace: Duration) -> Self {
        let resolver = Arc::new(FixedBackendResolver::new(script_backend(script)));
        Self::with_resolver(resolver, probe, grace).await
    }

    async fn with_resolver(
        resolver: Arc<dyn BackendResolver>,
        probe: Arc<dyn MediaProbe>,
        grace: Duration,
    ) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(ClipStore::open(dir.path(), probe).await.unwrap());
        let session = RecordingSession::new(
            resolver,
            Arc::clone(&store),
            None,
            SessionConfig {
                grace_period: grace,
                ..Default::default()
            },
        );
        Self {
            dir,
            store,
            session,
        }
    }

    async fn start(&self) -> Result<PathBuf, StartError> {
        self.session
            .start(self.dir.path(), DEFAULT_FILENAME_TEMPLATE)
            .await
            .map(|handle| handle.output_path)
    }

    fn media_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|x| x == "mp4"))
            .collect();
        files.sort();
        files
    }
}

const WRITES_THEN_WAITS: &str = r#"printf 'frames' > "$0"; exec sleep 30"#;

#[tokio::test]
async fn start_then_stop_registers_clip() {
    let fixture = Fixture::new(WRITES_THEN_WAITS, Arc::new(ClipProbe)).await;
    let mut events = fixture.session.subscribe();

    let output = fixture.start().await.unwrap();
    assert_eq!(fixture.session.state(), SessionState::Recording);

    let status = fixture.session.status();
    assert_eq!(status.output_path.as_deref(), Some(output.as_path()));
    assert_eq!(status.backend.as_deref(), Some("custom (sh)"));
    assert!(status.pid.is_some());

    tokio::time::sleep(StdDuration::from_millis(300)).await;
    let clip = fixture.session.stop().await.unwrap();

    assert_eq!(clip.path, output);
    assert_eq!(clip.duration_secs, 10.0);
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert_eq!(fixture.store.get(&output), Some(clip.clone()));

    assert!(matches!(events.recv().await.unwrap(), SessionEvent::Started(_)));
    match events.recv().await.unwrap() {
        SessionEvent::Stopped { clip: stopped } => assert_eq!(stopped, clip),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn stop_when_idle_changes_nothing() {
    let fixture = Fixture::new(WRITES_THEN_WAITS, Arc::new(ClipProbe)).await;

    let err = fixture.session.stop().await.unwrap_err();
    assert!(matches!(err, StopError::NotRecording));
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.media_files().is_empty());
    assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn second_stop_is_rejected() {
    let fixture = Fixture::new(WRITES_THEN_WAITS, Arc::new(ClipProbe)).await;
    fixture.start().await.unwrap();
    fixture.session.stop().await.unwrap();

    let err = fixture.session.stop().await.unwrap_err();
    assert!(matches!(err, StopError::NotRecording));
    assert_eq!(fixture.store.len(), 1);
}

#[tokio::test]
async fn second_start_is_rejected() {
    let fixture = Fixture::new(WRITES_THEN_WAITS, Arc::new(ClipProbe)).await;
    let first = fixture.start().await.unwrap();

    let err = fixture.start().await.unwrap_err();
    assert!(matches!(err, StartError::AlreadyRecording));
    assert_eq!(fixture.session.state(), SessionState::Recording);

    let clip = fixture.session.stop().await.unwrap();
    assert_eq!(clip.path, first);
}

#[tokio::test]
async fn tool_exiting_at_startup_fails_start() {
    let fixture = Fixture::new(
        r#"echo "cannot open display" >&2; exit 3"#,
        Arc::new(ClipProbe),
    )
    .await;

    match fixture.start().await {
        Err(StartError::ExitedImmediately { exit, .. }) => assert_eq!(exit.code, Some(3)),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.media_files().is_empty());
}

#[tokio::test]
async fn crash_salvages_partial_recording() {
    let fixture = Fixture::new(
        r#"printf 'frames' > "$0"; sleep 2; kill -9 $$"#,
        Arc::new(BrokenProbe),
    )
    .await;
    let mut events = fixture.session.subscribe();
    let output = fixture.start().await.unwrap();

    let crashed = timeout(StdDuration::from_secs(10), async {
        loop {
            if let SessionEvent::CaptureCrashed { exit, salvaged } = events.recv().await.unwrap() {
                return (exit, salvaged);
            }
        }
    })
    .await
    .expect("capture crash was not reported");

    let (exit, salvaged) = crashed;
    assert_eq!(exit.signal, Some(9));
    let clip = salvaged.expect("partial file should be salvaged");
    assert_eq!(clip.path, output);
    assert!(
        (1.5..4.0).contains(&clip.duration_secs),
        "duration {} should approximate the recording time",
        clip.duration_secs
    );
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.store.get(&output).is_some());

    let err = fixture.session.stop().await.unwrap_err();
    assert!(matches!(err, StopError::NotRecording));
}

#[tokio::test]
async fn stubborn_tool_is_killed_after_grace_period() {
    let fixture = Fixture::with_grace(
        IGNORES_SIGINT,
        Arc::new(ClipProbe),
        Duration::from_secs(1),
    )
    .await;
    fixture.start().await.unwrap();

    let started = Instant::now();
    let clip = fixture.session.stop().await.unwrap();
    assert!(started.elapsed() < StdDuration::from_secs(5));
    assert!(clip.path.exists());
    assert_eq!(fixture.session.state(), SessionState::Idle);
}

const IGNORES_SIGINT: &str = r#"trap '' INT; printf 'frames' > "$0"; while :; do sleep 1; done"#;

#[tokio::test]
async fn abandoned_stop_still_finalizes() {
    let fixture = Fixture::with_grace(
        IGNORES_SIGINT,
        Arc::new(ClipProbe),
        Duration::from_secs(1),
    )
    .await;
    let output = fixture.start().await.unwrap();

    // Caller gives up long before the grace period ends
    let abandoned = timeout(StdDuration::from_millis(100), fixture.session.stop()).await;
    assert!(abandoned.is_err());

    tokio::time::sleep(StdDuration::from_secs(3)).await;
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert_eq!(fixture.store.get(&output).map(|c| c.duration_secs), Some(10.0));

    let next = fixture.start().await.unwrap();
    assert_ne!(next, output);
    assert_eq!(fixture.session.state(), SessionState::Recording);
    fixture.session.stop().await.unwrap();
    assert_eq!(fixture.store.len(), 2);
}

#[tokio::test]
async fn abandoned_start_rolls_back() {
    let fixture = Fixture::new("exec sleep 30", Arc::new(ClipProbe)).await;

    // Gives up inside the startup window
    let abandoned = timeout(StdDuration::from_millis(100), fixture.start()).await;
    assert!(abandoned.is_err());
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.media_files().is_empty());
    assert!(fixture.session.status().output_path.is_none());

    fixture.start().await.unwrap();
    assert_eq!(fixture.session.state(), SessionState::Recording);
}

#[tokio::test]
async fn startup_failure_retries_with_fallback_backend() {
    let resolver = Arc::new(FallbackResolver {
        primary: script_backend(r#"echo "failed to connect to wayland" >&2; exit 1"#),
        fallback: script_backend(WRITES_THEN_WAITS),
        failed: Mutex::new(Vec::new()),
    });
    let fixture = Fixture::with_resolver(
        Arc::clone(&resolver) as Arc<dyn BackendResolver>,
        Arc::new(ClipProbe),
        Duration::from_secs(5),
    )
    .await;

    let output = fixture.start().await.unwrap();
    assert_eq!(fixture.session.state(), SessionState::Recording);
    assert_eq!(*resolver.failed.lock().unwrap(), vec![CaptureBackendKind::Custom]);

    tokio::time::sleep(StdDuration::from_millis(200)).await;
    let clip = fixture.session.stop().await.unwrap();
    assert_eq!(clip.path, output);
    assert_eq!(fixture.media_files(), vec![output]);
}

#[tokio::test]
async fn failing_fallback_fails_start() {
    let resolver = Arc::new(FallbackResolver {
        primary: script_backend("exit 1"),
        fallback: script_backend(r#"echo "x11grab unavailable" >&2; exit 2"#),
        failed: Mutex::new(Vec::new()),
    });
    let fixture =
        Fixture::with_resolver(resolver, Arc::new(ClipProbe), Duration::from_secs(5)).await;

    match fixture.start().await {
        Err(StartError::ExitedImmediately { exit, .. }) => assert_eq!(exit.code, Some(2)),
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.media_files().is_empty());
}

#[tokio::test]
async fn empty_output_is_not_registered() {
    let fixture = Fixture::new("exec sleep 30", Arc::new(ClipProbe)).await;
    fixture.start().await.unwrap();

    let err = fixture.session.stop().await.unwrap_err();
    assert!(matches!(err, StopError::EmptyOutput(_)));
    assert_eq!(fixture.session.state(), SessionState::Idle);
    assert!(fixture.media_files().is_empty());
    assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn trim_creates_distinct_clip() {
    let fixture = Fixture::new(WRITES_THEN_WAITS, Arc::new(ClipProbe)).await;
    fixture.start().await.unwrap();
    let original = fixture.session.stop().await.unwrap();
    let original_bytes = std::fs::read(&original.path).unwrap();

    let engine = TrimEngine::new(Arc::clone(&fixture.store), Arc::new(MarkerCopier), None);
    let trimmed = engine.trim(&original, 3.0, 7.0).await.unwrap();

    assert_ne!(trimmed.path, original.path);
    assert_eq!(trimmed.duration_secs, 4.6);
    assert_eq!(std::fs::read(&trimmed.path).unwrap(), b"3-7");
    assert_eq!(std::fs::read(&original.path).unwrap(), original_bytes);
    assert_eq!(fixture.store.get(&original.path), Some(original));
    assert_eq!(fixture.store.len(), 2);
}
