//! Common test helper functions shared across test modules.
//!
//! Provides local git repositories standing in for downstream repositories
//! and small fixtures for forge types.
use std::path::{Path, PathBuf};

use crate::forge::request::{PullRequest, RepositoryInfo};

/// Contents of the `go.mod` committed by [`init_upstream`].
pub const UPSTREAM_GO_MOD: &str = r#"module github.com/acme/widgets

go 1.22

require (
	github.com/acme/lib v1.0.0
	github.com/other/thing v0.3.0 // indirect
)
"#;

/// Creates a bare repository at `<root>/<owner>/<name>.git` with a single
/// commit on `main` containing `README.md` and `go.mod`. Bare so that clones
/// can push branches back to it.
///
/// # Example
/// ```ignore
/// let upstream = init_upstream(tmp.path(), "acme", "widgets");
/// let url = upstream.to_str().unwrap();
/// ```
pub fn init_upstream(root: &Path, owner: &str, name: &str) -> PathBuf {
    let path = root.join(owner).join(format!("{name}.git"));
    std::fs::create_dir_all(&path).unwrap();

    let mut opts = git2::RepositoryInitOptions::new();
    opts.bare(true).initial_head("main");
    let repo = git2::Repository::init_opts(&path, &opts).unwrap();

    let readme = repo.blob(b"# widgets\n").unwrap();
    let go_mod = repo.blob(UPSTREAM_GO_MOD.as_bytes()).unwrap();

    let mut builder = repo.treebuilder(None).unwrap();
    builder.insert("README.md", readme, 0o100644).unwrap();
    builder.insert("go.mod", go_mod, 0o100644).unwrap();
    let tree_id = builder.write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let sig = git2::Signature::now("test", "test@example.com").unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, "initial commit", &tree, &[])
        .unwrap();

    path
}

/// Reads `file` from the tip of `branch` in the repository at `path`.
/// Returns None when the branch or file does not exist.
pub fn read_upstream_file(
    path: &Path,
    branch: &str,
    file: &str,
) -> Option<String> {
    let repo = git2::Repository::open(path).unwrap();
    let reference = repo.find_reference(&format!("refs/heads/{branch}")).ok()?;
    let tree = reference.peel_to_tree().ok()?;
    let entry = tree.get_path(Path::new(file)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).to_string())
}

/// Lists the local branch names of the repository at `path`.
pub fn upstream_branches(path: &Path) -> Vec<String> {
    let repo = git2::Repository::open(path).unwrap();
    repo.branches(Some(git2::BranchType::Local))
        .unwrap()
        .filter_map(|b| b.ok())
        .filter_map(|(b, _)| b.name().ok().flatten().map(|n| n.to_string()))
        .collect()
}

/// Creates a test PullRequest.
pub fn create_test_pull_request(number: u64, head_branch: &str) -> PullRequest {
    PullRequest {
        number,
        sha: format!("sha-{number}"),
        head_branch: head_branch.to_string(),
        title: format!("pull request {number}"),
        link: format!("https://github.com/acme/widgets/pull/{number}"),
        labels: vec![],
    }
}

/// Creates a test RepositoryInfo for a GitHub hosted repository.
pub fn create_test_repository(owner: &str, name: &str) -> RepositoryInfo {
    RepositoryInfo {
        owner: owner.to_string(),
        name: name.to_string(),
        clone_url: format!("https://github.com/{owner}/{name}.git"),
        archived: false,
    }
}
