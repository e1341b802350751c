use crate::pipeline::ChangePipeline;
use crate::watch::{WatchLoop, run_worker};
use anyhow::Result;
use async_trait::async_trait;
use gitscribe_core::{ChangeFingerprint, ChangeSet, fingerprint_change_set};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// Distinct, deterministic fingerprint derived from a label.
fn fp(label: &str) -> ChangeFingerprint {
    let changes = ChangeSet {
        added: vec![label.to_string()],
        ..ChangeSet::default()
    };
    fingerprint_change_set(Path::new("/nonexistent"), &changes)
}

/// Pipeline whose fingerprint and analyze outcomes the test scripts.
struct MockPipeline {
    fingerprint: Mutex<Option<ChangeFingerprint>>,
    analyze_results: Mutex<VecDeque<Result<()>>>,
    analyses: AtomicUsize,
    delay: Duration,
}

impl MockPipeline {
    fn with_fingerprint(label: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            fingerprint: Mutex::new(label.map(fp)),
            analyze_results: Mutex::new(VecDeque::new()),
            analyses: AtomicUsize::new(0),
            delay: Duration::ZERO,
        })
    }

    fn set_fingerprint(&self, label: &str) {
        *self.fingerprint.lock().unwrap() = Some(fp(label));
    }

    fn analyses(&self) -> usize {
        self.analyses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangePipeline for MockPipeline {
    fn fingerprint(&self) -> Result<Option<ChangeFingerprint>> {
        Ok(self.fingerprint.lock().unwrap().clone())
    }

    async fn analyze(&self) -> Result<()> {
        self.analyses.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match self.analyze_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(()),
        }
    }
}

struct Harness {
    trigger_tx: mpsc::UnboundedSender<()>,
    shutdown_tx: oneshot::Sender<()>,
    worker: tokio::task::JoinHandle<crate::watch::SessionStats>,
}

fn spawn(pipeline: Arc<MockPipeline>, debounce: Duration) -> Harness {
    let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let worker = tokio::spawn(run_worker(pipeline, trigger_rx, shutdown_rx, debounce));
    Harness {
        trigger_tx,
        shutdown_tx,
        worker,
    }
}

impl Harness {
    fn trigger(&self) {
        self.trigger_tx.send(()).unwrap();
    }

    async fn stop(self) -> crate::watch::SessionStats {
        let _ = self.shutdown_tx.send(());
        self.worker.await.unwrap()
    }
}

#[tokio::test]
async fn preexisting_changes_run_an_initial_pass() {
    let pipeline = MockPipeline::with_fingerprint(Some("initial"));
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = harness.stop().await;

    assert_eq!(pipeline.analyses(), 1);
    assert_eq!(stats.passes, 1);
}

#[tokio::test]
async fn clean_tree_skips_the_initial_pass() {
    let pipeline = MockPipeline::with_fingerprint(None);
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(20));

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stats = harness.stop().await;

    assert_eq!(pipeline.analyses(), 0);
    assert_eq!(stats.passes, 0);
    assert_eq!(stats.skipped, 1);
}

#[tokio::test]
async fn event_bursts_coalesce_into_one_pass() {
    let pipeline = MockPipeline::with_fingerprint(None);
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(10)).await;

    pipeline.set_fingerprint("burst");
    for _ in 0..10 {
        harness.trigger();
    }
    tokio::time::sleep(Duration::from_millis(150)).await;
    let stats = harness.stop().await;

    assert_eq!(pipeline.analyses(), 1);
    assert_eq!(stats.passes, 1);
}

#[tokio::test]
async fn unchanged_fingerprint_suppresses_repeat_passes() {
    let pipeline = MockPipeline::with_fingerprint(None);
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(10)).await;

    pipeline.set_fingerprint("same");
    harness.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Same tree state triggers again; no second analysis.
    harness.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A genuinely new state does analyze.
    pipeline.set_fingerprint("different");
    harness.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = harness.stop().await;
    assert_eq!(pipeline.analyses(), 2);
    assert_eq!(stats.passes, 2);
    assert!(stats.skipped >= 1);
}

#[tokio::test]
async fn triggers_during_a_pass_do_not_queue_another() {
    let pipeline = Arc::new(MockPipeline {
        fingerprint: Mutex::new(Some(fp("slow"))),
        analyze_results: Mutex::new(VecDeque::new()),
        analyses: AtomicUsize::new(0),
        delay: Duration::from_millis(200),
    });
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(10));

    // The initial pass is now in flight; pile on triggers mid-analysis.
    tokio::time::sleep(Duration::from_millis(50)).await;
    for _ in 0..5 {
        harness.trigger();
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    let stats = harness.stop().await;
    assert_eq!(pipeline.analyses(), 1);
    assert_eq!(stats.passes, 1);
}

#[tokio::test]
async fn failed_passes_are_retried_on_the_next_trigger() {
    let pipeline = MockPipeline::with_fingerprint(None);
    pipeline
        .analyze_results
        .lock()
        .unwrap()
        .push_back(Err(anyhow::anyhow!("backend down")));
    let harness = spawn(Arc::clone(&pipeline), Duration::from_millis(20));
    tokio::time::sleep(Duration::from_millis(10)).await;

    pipeline.set_fingerprint("retry-me");
    harness.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Fingerprint was not recorded on failure, so the same state analyzes
    // again and succeeds.
    harness.trigger();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let stats = harness.stop().await;
    assert_eq!(pipeline.analyses(), 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.passes, 1);
}

#[tokio::test]
async fn watch_loop_reacts_to_real_filesystem_writes() {
    let dir = tempfile::TempDir::new().unwrap();
    let pipeline = MockPipeline::with_fingerprint(None);

    let watch = WatchLoop::new(
        pipeline.clone() as Arc<dyn ChangePipeline>,
        Duration::from_millis(50),
        vec![".git/".to_string()],
    );
    let handle = watch.start(dir.path()).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    pipeline.set_fingerprint("on-disk");
    std::fs::write(dir.path().join("newfile.rs"), "fn main() {}\n").unwrap();

    // Poll rather than sleep a fixed amount; event delivery latency varies.
    let mut analyzed = false;
    for _ in 0..40 {
        if pipeline.analyses() >= 1 {
            analyzed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let stats = handle.stop().await;

    assert!(analyzed, "filesystem write never triggered a pass");
    assert_eq!(stats.passes, 1);
}

#[test]
fn ignored_paths_do_not_wake_the_loop() {
    use notify::EventKind;
    use notify::event::{CreateKind, ModifyKind};

    let ignore = vec![".git/".to_string(), "target/".to_string()];

    let mut event = notify::Event::new(EventKind::Create(CreateKind::File));
    event.paths.push("/repo/.git/index.lock".into());
    assert!(!crate::watch::event_is_relevant(&event, &ignore));

    let mut event = notify::Event::new(EventKind::Modify(ModifyKind::Any));
    event.paths.push("/repo/src/main.rs".into());
    assert!(crate::watch::event_is_relevant(&event, &ignore));

    let mut event = notify::Event::new(EventKind::Access(notify::event::AccessKind::Read));
    event.paths.push("/repo/src/main.rs".into());
    assert!(!crate::watch::event_is_relevant(&event, &ignore));
}
