use shadowgit_gateway::config::GatewaySettings;
use shadowgit_gateway::git::{
    GitExecutor, RepositoryEntry, RepositoryResolver, RepositorySnapshot, SHADOW_STORE_MARKER,
};
use shadowgit_gateway::Gateway;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git against a shadow store the same way the gateway does
fn shadow_git(repo_path: &Path) -> Command {
    let mut command = Command::new("git");
    command
        .current_dir(repo_path)
        .env("GIT_DIR", repo_path.join(SHADOW_STORE_MARKER))
        .env("GIT_WORK_TREE", repo_path);
    command
}

/// Helper to create a working tree with an initialised shadow store
pub fn create_shadow_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().join("project");
    fs::create_dir(&repo_path).unwrap();

    shadow_git(&repo_path)
        .args(["init"])
        .output()
        .expect("Failed to init shadow store");

    shadow_git(&repo_path)
        .args(["config", "user.name", "Test User"])
        .output()
        .expect("Failed to set git user.name");

    shadow_git(&repo_path)
        .args(["config", "user.email", "test@example.com"])
        .output()
        .expect("Failed to set git user.email");

    (temp_dir, repo_path)
}

/// Helper to create a commit in the shadow store
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");

    shadow_git(repo_path)
        .args(["add", file])
        .output()
        .expect("Failed to add file");

    shadow_git(repo_path)
        .args(["commit", "-m", message])
        .output()
        .expect("Failed to commit");
}

/// Build a gateway that knows the repository as "app" and runs real git
pub fn gateway_for(repo_path: &Path, settings: GatewaySettings) -> Gateway {
    let snapshot = RepositorySnapshot::new(vec![RepositoryEntry::new(
        "app",
        repo_path.to_string_lossy(),
    )]);
    let runner = GitExecutor::from_settings(&settings);
    Gateway::new(
        settings,
        RepositoryResolver::with_home(snapshot, None),
        Box::new(runner),
    )
}
