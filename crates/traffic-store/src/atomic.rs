//! Atomic file replacement.
//!
//! Content goes to a sibling `<name>.tmp` file first. Only once that file has
//! been written, flushed and synced without error is it renamed over the
//! target, so readers see either the old file or the new one, never a torn
//! write. On any failure the temporary file is removed and the target is left
//! untouched.
//!
//! The one exception is the cross-filesystem fallback in [`write_atomic`]:
//! when the rename is refused because the two paths are on different
//! filesystems, the temporary file is copied onto the target instead, and a
//! failure partway through that copy can leave the target torn. Since the
//! temporary file is always a sibling of the target this only happens when the
//! target itself is a mount point of its own.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Suffix appended to the target file name for the temporary copy.
pub const TEMP_SUFFIX: &str = ".tmp";

/// The temporary path used while saving `path`.
///
/// The suffix is appended to the whole file name, so `history.dat` becomes
/// `history.dat.tmp`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(TEMP_SUFFIX);
    PathBuf::from(name)
}

/// Write a file atomically using `write` to produce its content.
///
/// Atomic whenever the final rename succeeds, which is always the case when
/// `path` and its `.tmp` sibling share a filesystem. See the module docs for
/// the copy fallback.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    // Create parent directories if needed
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    let tmp_path = temp_path_for(path);
    let persist_err = |source| Error::Persist {
        path: path.to_path_buf(),
        source,
    };

    // Nothing has been created yet if this fails, so there is nothing to clean up.
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&tmp_path)
        .map_err(persist_err)?;

    let written = fill_and_sync(&mut file, write);
    drop(file);

    if let Err(e) = written.and_then(|()| replace(&tmp_path, path)) {
        discard(&tmp_path);
        return Err(persist_err(e));
    }

    debug!("Replaced {} atomically", path.display());
    Ok(())
}

fn fill_and_sync<F>(file: &mut File, write: F) -> io::Result<()>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> io::Result<()>,
{
    {
        let mut writer = BufWriter::new(&mut *file);
        write(&mut writer)?;
        writer.flush()?;
    }
    file.sync_all()
}

/// Move `tmp` over `target`, copying when they live on different filesystems.
///
/// The copy path writes straight into `target` and is not atomic.
fn replace(tmp: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(tmp, target) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(
                "Rename across filesystems for {}, copying instead",
                target.display()
            );
            fs::copy(tmp, target)?;
            File::open(target)?.sync_all()?;
            fs::remove_file(tmp)
        }
        Err(e) => Err(e),
    }
}

fn discard(tmp: &Path) {
    if let Err(e) = fs::remove_file(tmp) {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to remove temporary file {}: {e}", tmp.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_appends_suffix() {
        assert_eq!(
            temp_path_for(Path::new("/data/history.dat")),
            PathBuf::from("/data/history.dat.tmp")
        );
        assert_eq!(
            temp_path_for(Path::new("history")),
            PathBuf::from("history.tmp")
        );
    }

    #[test]
    fn test_write_creates_file_and_removes_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.txt");

        write_atomic(&path, |w| w.write_all(b"hello\n")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_failed_write_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "original").unwrap();

        let result = write_atomic(&path, |w| {
            w.write_all(b"partial")?;
            Err(io::Error::other("disk full"))
        });

        assert!(matches!(result, Err(Error::Persist { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn test_unopenable_temp_leaves_target_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "original").unwrap();
        // A directory squatting on the temp path cannot be opened for writing.
        fs::create_dir(temp_path_for(&path)).unwrap();

        let result = write_atomic(&path, |w| w.write_all(b"new"));

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "original");
        assert!(temp_path_for(&path).is_dir());
    }
}
