use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const SLACKVAULT_DIR: &str = ".slackvault";
const RESPONSES_DIR: &str = "responses";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the work directory.
pub const SLACKVAULT_DIR_ENV: &str = "SLACKVAULT_DIR";

/// Resolve the work directory.
/// Priority: SLACKVAULT_DIR env var > ~/.slackvault/
pub fn resolve_work_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(SLACKVAULT_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(SLACKVAULT_DIR))
        .ok_or_else(|| Error::Config("failed to determine home directory".to_string()))
}

/// Response artifacts directory under `work_dir`, created if missing.
pub fn responses_dir(work_dir: &Path) -> Result<PathBuf> {
    ensure_subdir(work_dir, RESPONSES_DIR)
}

/// Log directory under `work_dir`, created if missing.
pub fn logs_dir(work_dir: &Path) -> Result<PathBuf> {
    ensure_subdir(work_dir, LOGS_DIR)
}

fn ensure_subdir(work_dir: &Path, name: &str) -> Result<PathBuf> {
    let dir = work_dir.join(name);
    std::fs::create_dir_all(&dir).map_err(|e| Error::io("failed to create directory", e))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(())).lock().unwrap()
    }

    #[test]
    fn test_default_work_dir() {
        let _lock = env_lock();
        unsafe { std::env::remove_var(SLACKVAULT_DIR_ENV) };
        let dir = resolve_work_dir().unwrap();
        assert!(dir.ends_with(SLACKVAULT_DIR));
    }

    #[test]
    fn test_env_override() {
        let _lock = env_lock();
        unsafe { std::env::set_var(SLACKVAULT_DIR_ENV, "/tmp/test-slackvault") };
        let dir = resolve_work_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/test-slackvault"));
        unsafe { std::env::remove_var(SLACKVAULT_DIR_ENV) };
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let _lock = env_lock();
        unsafe { std::env::set_var(SLACKVAULT_DIR_ENV, "  ") };
        let dir = resolve_work_dir().unwrap();
        assert!(dir.ends_with(SLACKVAULT_DIR));
        unsafe { std::env::remove_var(SLACKVAULT_DIR_ENV) };
    }

    #[test]
    fn test_subdirs_are_created() {
        let temp = tempfile::tempdir().unwrap();
        let responses = responses_dir(temp.path()).unwrap();
        let logs = logs_dir(temp.path()).unwrap();

        assert!(responses.is_dir());
        assert!(logs.is_dir());
        assert_eq!(responses, temp.path().join("responses"));
    }
}
