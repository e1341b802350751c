//! Debounced, single-flight watch loop

use crate::pipeline::ChangePipeline;
use anyhow::{Context, Result};
use gitscribe_core::ChangeFingerprint;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// How long `stop` waits for the worker to wind down before giving up on
/// a clean join.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Counters for one watch session, reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Analysis passes that ran to completion.
    pub passes: usize,
    /// Passes that failed; the loop keeps running after each.
    pub errors: usize,
    /// Debounce windows that closed onto an unchanged or clean tree.
    pub skipped: usize,
}

/// Running watch session. Dropping the handle without calling [`stop`]
/// aborts the worker and drops the filesystem subscription.
///
/// [`stop`]: WatchHandle::stop
pub struct WatchHandle {
    shutdown_tx: oneshot::Sender<()>,
    worker: JoinHandle<SessionStats>,
    // Held so the subscription lives as long as the session.
    _watcher: RecommendedWatcher,
}

impl WatchHandle {
    /// Signal shutdown and join the worker, bounded by a timeout.
    pub async fn stop(self) -> SessionStats {
        let _ = self.shutdown_tx.send(());
        match tokio::time::timeout(STOP_TIMEOUT, self.worker).await {
            Ok(Ok(stats)) => stats,
            Ok(Err(e)) => {
                tracing::error!("Watch worker panicked: {}", e);
                SessionStats::default()
            }
            Err(_) => {
                tracing::warn!("Watch worker did not stop within {:?}", STOP_TIMEOUT);
                SessionStats::default()
            }
        }
    }
}

/// Debounced watch loop over one working tree.
pub struct WatchLoop {
    pipeline: Arc<dyn ChangePipeline>,
    debounce: Duration,
    ignore_patterns: Vec<String>,
}

impl WatchLoop {
    pub fn new(
        pipeline: Arc<dyn ChangePipeline>,
        debounce: Duration,
        ignore_patterns: Vec<String>,
    ) -> Self {
        Self {
            pipeline,
            debounce,
            ignore_patterns,
        }
    }

    /// Subscribe to filesystem events under `root` and spawn the worker.
    /// Runs one initial pass immediately when changes already exist.
    pub fn start(self, root: &Path) -> Result<WatchHandle> {
        let (trigger_tx, trigger_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let ignore = self.ignore_patterns.clone();
        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
                Ok(event) => {
                    if event_is_relevant(&event, &ignore) {
                        // Coalescing happens in the worker; the callback
                        // only records that something happened.
                        let _ = trigger_tx.send(());
                    }
                }
                Err(e) => tracing::error!("Filesystem watch error: {}", e),
            })
            .context("failed to create filesystem watcher")?;
        watcher
            .watch(root, RecursiveMode::Recursive)
            .with_context(|| format!("failed to watch {}", root.display()))?;
        tracing::info!("Watching {} for changes", root.display());

        let worker = tokio::spawn(run_worker(
            self.pipeline,
            trigger_rx,
            shutdown_rx,
            self.debounce,
        ));

        Ok(WatchHandle {
            shutdown_tx,
            worker,
            _watcher: watcher,
        })
    }
}

/// Whether a notify event should wake the loop at all.
pub(crate) fn event_is_relevant(event: &notify::Event, ignore_patterns: &[String]) -> bool {
    use notify::EventKind;
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        let path = path.to_string_lossy();
        !ignore_patterns.iter().any(|pat| path.contains(pat.as_str()))
    })
}

/// Worker state machine: Idle until a trigger arrives, Debouncing while
/// triggers keep restarting the quiet window, Analyzing once it closes.
/// Exactly one pass runs at a time; triggers that arrive during a pass are
/// drained and dropped afterwards so a burst never queues a second pass.
pub(crate) async fn run_worker(
    pipeline: Arc<dyn ChangePipeline>,
    mut trigger_rx: mpsc::UnboundedReceiver<()>,
    mut shutdown_rx: oneshot::Receiver<()>,
    debounce: Duration,
) -> SessionStats {
    let mut stats = SessionStats::default();
    let mut last_fingerprint: Option<ChangeFingerprint> = None;

    // Changes may predate the session; analyze them without waiting for an
    // event.
    run_pass(&*pipeline, &mut last_fingerprint, &mut stats).await;
    drain(&mut trigger_rx);

    loop {
        // Idle: nothing pending, block until a trigger or shutdown.
        tokio::select! {
            _ = &mut shutdown_rx => break,
            received = trigger_rx.recv() => {
                if received.is_none() {
                    break;
                }
            }
        }

        // Debouncing: every further trigger restarts the quiet window.
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    tracing::info!(
                        "Watch session done: {} passes, {} errors, {} skipped",
                        stats.passes, stats.errors, stats.skipped
                    );
                    return stats;
                }
                received = trigger_rx.recv() => {
                    if received.is_none() {
                        return stats;
                    }
                }
                _ = tokio::time::sleep(debounce) => break,
            }
        }

        drain(&mut trigger_rx);
        run_pass(&*pipeline, &mut last_fingerprint, &mut stats).await;
        // Events raised by the pass itself (cache writes, editors reacting)
        // must not retrigger it.
        drain(&mut trigger_rx);
    }

    tracing::info!(
        "Watch session done: {} passes, {} errors, {} skipped",
        stats.passes,
        stats.errors,
        stats.skipped
    );
    stats
}

async fn run_pass(
    pipeline: &dyn ChangePipeline,
    last_fingerprint: &mut Option<ChangeFingerprint>,
    stats: &mut SessionStats,
) {
    let fingerprint = match pipeline.fingerprint() {
        Ok(Some(fp)) => fp,
        Ok(None) => {
            stats.skipped += 1;
            tracing::debug!("Tree is clean; skipping pass");
            return;
        }
        Err(e) => {
            stats.errors += 1;
            tracing::error!("Fingerprint failed: {:#}", e);
            return;
        }
    };

    if last_fingerprint.as_ref() == Some(&fingerprint) {
        stats.skipped += 1;
        tracing::debug!("Change set {} already analyzed; skipping", fingerprint.short());
        return;
    }

    match pipeline.analyze().await {
        Ok(()) => {
            stats.passes += 1;
            // Recorded only on success so a failed pass is retried on the
            // next trigger.
            *last_fingerprint = Some(fingerprint);
        }
        Err(e) => {
            stats.errors += 1;
            tracing::error!("Analysis pass failed: {:#}", e);
        }
    }
}

fn drain(rx: &mut mpsc::UnboundedReceiver<()>) {
    while rx.try_recv().is_ok() {}
}
