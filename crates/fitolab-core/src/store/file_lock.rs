use crate::error::FitolabError;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const LOCK_TIMEOUT: Duration = Duration::from_secs(10);
const RETRY_INTERVAL: Duration = Duration::from_millis(20);

/// Exclusive advisory lock on a sidecar file, released on drop.
///
/// The lock file is left in place after release. Deleting it would let one
/// process hold a lock on an unlinked file while another locks a new one.
///
/// On non-unix targets no cross-process lock is taken.
#[derive(Debug)]
pub(crate) struct FileLock {
    file: File,
}

impl FileLock {
    /// `<db_path>.lock`
    pub(crate) fn path_for(db_path: &Path) -> PathBuf {
        let mut name = db_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    pub(crate) fn acquire(path: &Path) -> Result<FileLock, FitolabError> {
        Self::acquire_within(path, LOCK_TIMEOUT)
    }

    pub(crate) fn acquire_within(path: &Path, timeout: Duration) -> Result<FileLock, FitolabError> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| {
                FitolabError::Repository(format!(
                    "cannot open lock file {}: {}",
                    path.display(),
                    e
                ))
            })?;

        let deadline = Instant::now() + timeout;
        loop {
            let locked = try_lock(&file).map_err(|e| {
                FitolabError::Repository(format!("cannot lock {}: {}", path.display(), e))
            })?;
            if locked {
                return Ok(FileLock { file });
            }
            if Instant::now() >= deadline {
                return Err(FitolabError::Repository(format!(
                    "timed out waiting for lock {} after {}ms",
                    path.display(),
                    timeout.as_millis()
                )));
            }
            std::thread::sleep(RETRY_INTERVAL);
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        unlock(&self.file);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;

    let ret = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if ret == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(unix)]
fn unlock(file: &File) {
    use std::os::unix::io::AsRawFd;

    unsafe {
        libc::flock(file.as_raw_fd(), libc::LOCK_UN);
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> io::Result<bool> {
    Ok(true)
}

#[cfg(not(unix))]
fn unlock(_file: &File) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_path_appends_suffix() {
        assert_eq!(
            FileLock::path_for(Path::new("/data/fitolab-db.json")),
            PathBuf::from("/data/fitolab-db.json.lock")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_second_holder_waits_until_release() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json.lock");

        let first = FileLock::acquire(&path).unwrap();
        let err = FileLock::acquire_within(&path, Duration::from_millis(60)).unwrap_err();
        assert!(err.to_string().contains("timed out"));

        drop(first);
        let _second = FileLock::acquire_within(&path, Duration::from_millis(500)).unwrap();
        assert!(path.exists());
    }
}
