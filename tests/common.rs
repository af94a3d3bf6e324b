#![allow(dead_code)]

use nix::unistd::{Group, User, getgid, getuid};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub const INITIAL_PLAYLIST: &str = "#EXTM3U\n# === live ===\n";

/// A working clone with a bare remote as its upstream, one commit in.
pub struct TestRepo {
    // TempDir is kept so both repositories are removed on drop
    _temp: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let remote = temp.path().join("remote.git");
        let work = temp.path().join("work");
        fs::create_dir_all(&work).expect("Failed to create work dir");

        git_in(temp.path(), &["init", "--quiet", "--bare", "remote.git"]);
        git_in(&work, &["init", "--quiet"]);
        git_in(&work, &["config", "user.email", "sync@example.com"]);
        git_in(&work, &["config", "user.name", "Playlist Sync"]);
        git_in(&work, &["config", "commit.gpgsign", "false"]);

        fs::write(work.join("main.m3u"), INITIAL_PLAYLIST).expect("Failed to write playlist");
        git_in(&work, &["add", "main.m3u"]);
        git_in(&work, &["commit", "--quiet", "-m", "Initial playlist"]);
        git_in(
            &work,
            &["remote", "add", "origin", remote.to_str().expect("utf-8 path")],
        );
        git_in(&work, &["push", "--quiet", "-u", "origin", "HEAD"]);

        Self {
            _temp: temp,
            work,
            remote,
        }
    }

    pub fn git(&self, args: &[&str]) -> String {
        git_in(&self.work, args)
    }

    pub fn commit_count(&self) -> usize {
        self.git(&["rev-list", "--count", "HEAD"])
            .parse()
            .expect("numeric count")
    }

    pub fn branch(&self) -> String {
        self.git(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn remote_head(&self) -> String {
        let branch = self.branch();
        git_in(&self.remote, &["rev-parse", &branch])
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.work.join(name);
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}

pub fn git_in(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper invocation that writes `content` to main.m3u, like the real
/// sync script does.
pub fn helper_writing(content: &str) -> Vec<String> {
    vec![
        "sh".to_string(),
        "-c".to_string(),
        "printf '%s' \"$1\" > main.m3u".to_string(),
        "helper".to_string(),
        content.to_string(),
    ]
}

/// User and group names of the test process, falling back to numeric ids.
pub fn current_owner_names() -> (String, String) {
    let user = User::from_uid(getuid())
        .ok()
        .flatten()
        .map(|user| user.name)
        .unwrap_or_else(|| getuid().to_string());
    let group = Group::from_gid(getgid())
        .ok()
        .flatten()
        .map(|group| group.name)
        .unwrap_or_else(|| getgid().to_string());
    (user, group)
}
