//! End-to-end pipeline tests
//!
//! Drive the full scan, chunk, generate path against a real on-disk
//! repository, with only the model behind a mock backend.

use gitscribe_ai::{BackendError, CommitAnalyzer, GenerationBackend};
use gitscribe_core::Settings;
use gitscribe_git::{ChangeScanner, DiffChunker, GitRepo};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

struct MockBackend {
    calls: Arc<AtomicUsize>,
    reply: &'static str,
}

#[async_trait::async_trait]
impl GenerationBackend for MockBackend {
    async fn generate(
        &self,
        _prompt: &str,
        _system_prompt: Option<&str>,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.to_string())
    }

    fn name(&self) -> &str {
        "Mock"
    }
}

fn commit_all(dir: &Path, message: &str) {
    let repo = git2::Repository::open(dir).unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = git2::Signature::now("Tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}

fn settings_for(dir: &TempDir) -> Settings {
    Settings {
        cache_dir: dir.path().join(".cache"),
        ..Settings::default()
    }
}

#[tokio::test]
async fn edit_to_commit_message_end_to_end() {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    std::fs::write(
        dir.path().join("calculator.py"),
        "def add(a, b):\n    return a + b\n",
    )
    .unwrap();
    commit_all(dir.path(), "initial commit");

    // The edit under analysis: a new subtract function.
    std::fs::write(
        dir.path().join("calculator.py"),
        "def add(a, b):\n    return a + b\n\ndef subtract(a, b):\n    return a - b\n",
    )
    .unwrap();

    let settings = settings_for(&dir);
    let repo = GitRepo::discover(dir.path()).unwrap();
    let changes = ChangeScanner::new(&repo, &settings).scan().unwrap();
    assert_eq!(changes.modified, vec!["calculator.py"]);

    let chunks = DiffChunker::new(&repo, &settings).chunk(&changes);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].content.contains("+def subtract(a, b):"));

    let calls = Arc::new(AtomicUsize::new(0));
    let analyzer = CommitAnalyzer::new(
        Box::new(MockBackend {
            calls: Arc::clone(&calls),
            reply: "feat: add subtract function",
        }),
        &settings,
    );

    let message = analyzer.generate_commit_message(&chunks).await.unwrap();
    assert_eq!(message, "feat: add subtract function");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Unchanged tree: a second run is answered from the cache.
    let again = analyzer.generate_commit_message(&chunks).await.unwrap();
    assert_eq!(again, message);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn review_covers_source_files_only() {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    std::fs::write(dir.path().join("app.py"), "def run():\n    pass\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "remember the milk\n").unwrap();
    commit_all(dir.path(), "initial commit");

    std::fs::write(
        dir.path().join("app.py"),
        "def run():\n    launch()\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.txt"), "remember the milk\nand eggs\n").unwrap();

    let settings = settings_for(&dir);
    let repo = GitRepo::discover(dir.path()).unwrap();
    let changes = ChangeScanner::new(&repo, &settings).scan().unwrap();
    let chunks = DiffChunker::new(&repo, &settings).chunk(&changes);
    assert_eq!(chunks.len(), 2);

    let analyzer = CommitAnalyzer::new(
        Box::new(MockBackend {
            calls: Arc::new(AtomicUsize::new(0)),
            reply: "looks reasonable",
        }),
        &settings,
    );
    let reviews = analyzer.review_changes(&chunks).await.unwrap();

    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].file, "app.py");
    assert_eq!(reviews[0].review, "looks reasonable");
}
