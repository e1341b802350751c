//! Shared helpers for tests that need a real repository on disk.

use crate::repo::GitRepo;
use git2::Signature;
use std::path::Path;
use tempfile::TempDir;

/// Fresh repository in a temp directory with one initial commit, so HEAD
/// exists and diffs run against a real tree.
pub fn temp_repo() -> (TempDir, GitRepo) {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    let repo = GitRepo::discover(dir.path()).unwrap();
    write_file(dir.path(), "README.md", "# test\n");
    stage_and_commit(&repo, &["README.md"], "initial commit");
    (dir, repo)
}

/// Bare-bones repository with no commits yet (unborn HEAD).
pub fn temp_repo_unborn() -> (TempDir, GitRepo) {
    let dir = TempDir::new().unwrap();
    git2::Repository::init(dir.path()).unwrap();
    let repo = GitRepo::discover(dir.path()).unwrap();
    (dir, repo)
}

pub fn write_file(root: &Path, rel: &str, content: &str) {
    let full = root.join(rel);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full, content).unwrap();
}

pub fn stage(repo: &GitRepo, paths: &[&str]) {
    let mut index = repo.inner().index().unwrap();
    for path in paths {
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();
}

pub fn stage_removal(repo: &GitRepo, path: &str) {
    let mut index = repo.inner().index().unwrap();
    index.remove_path(Path::new(path)).unwrap();
    index.write().unwrap();
}

pub fn stage_and_commit(repo: &GitRepo, paths: &[&str], message: &str) {
    stage(repo, paths);
    commit(repo, message);
}

pub fn commit(repo: &GitRepo, message: &str) {
    let inner = repo.inner();
    let mut index = inner.index().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = inner.find_tree(tree_id).unwrap();
    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let parent = inner
        .head()
        .ok()
        .and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    inner
        .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap();
}
