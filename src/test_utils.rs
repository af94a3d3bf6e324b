//! Serialises tests that touch process-wide state (cwd and environment).

use std::env;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

static PROCESS_MUTEX: Mutex<()> = Mutex::new(());

/// Holds the process lock and restores cwd and touched variables on drop.
#[must_use]
pub struct TestProcess {
    _lock: MutexGuard<'static, ()>,
    original_cwd: PathBuf,
    saved_vars: Vec<(OsString, Option<OsString>)>,
}

impl TestProcess {
    pub fn new() -> Self {
        let lock = PROCESS_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        Self {
            _lock: lock,
            original_cwd: env::current_dir().expect("current dir"),
            saved_vars: Vec::new(),
        }
    }

    pub fn chdir(&mut self, path: impl AsRef<Path>) -> std::io::Result<()> {
        env::set_current_dir(path)
    }

    pub fn set_var(&mut self, key: impl Into<OsString>, value: impl AsRef<OsStr>) {
        let key = self.save(key.into());
        unsafe {
            env::set_var(key, value);
        }
    }

    pub fn remove_var(&mut self, key: impl Into<OsString>) {
        let key = self.save(key.into());
        unsafe {
            env::remove_var(key);
        }
    }

    fn save(&mut self, key: OsString) -> OsString {
        if !self.saved_vars.iter().any(|(saved, _)| *saved == key) {
            let previous = env::var_os(&key);
            self.saved_vars.push((key.clone(), previous));
        }
        key
    }
}

impl Drop for TestProcess {
    fn drop(&mut self) {
        for (key, previous) in self.saved_vars.drain(..).rev() {
            unsafe {
                match previous {
                    Some(value) => env::set_var(&key, value),
                    None => env::remove_var(&key),
                }
            }
        }
        let _ = env::set_current_dir(&self.original_cwd);
    }
}
