use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Atomically replace `dst` with `content` using write-to-temp-then-rename.
///
/// The destination is never left half written: a crash leaves either the old
/// file or the new one. The parent directory must already exist.
pub fn atomic_write(dst: &Path, content: &[u8]) -> std::io::Result<()> {
    // SEC-009: Randomized temp filename so the temp path cannot be predicted
    // and pre-created as a symlink.
    let random_suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let temp_path = dst.with_extension(format!("tmp.{:016x}", random_suffix));

    let result = (|| {
        let mut temp_file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&temp_path)?;
        temp_file.write_all(content)?;
        temp_file.sync_all()?;
        drop(temp_file);

        // On Windows, rename fails if destination exists
        #[cfg(windows)]
        if dst.exists() {
            std::fs::remove_file(dst)?;
        }

        std::fs::rename(&temp_path, dst)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&temp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atomic_write_creates_and_replaces() {
        let dir = std::env::temp_dir().join("flurry_fs_test_replace");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.json");

        atomic_write(&path, b"first").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"first");

        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");

        // No temp files left behind
        let leftovers = std::fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("tmp."))
            .count();
        assert_eq!(leftovers, 0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_atomic_write_missing_parent_fails() {
        let path = std::env::temp_dir()
            .join("flurry_fs_test_missing_parent")
            .join("nested")
            .join("file.json");
        assert!(atomic_write(&path, b"x").is_err());
    }
}
