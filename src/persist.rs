//! Atomic file output.

use std::io;
use std::path::Path;

/// Write bytes atomically: write `<name>.tmp` beside the target, then rename.
///
/// Missing parent directories are created. A crash mid-write leaves the
/// previous file intact.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&tmp_path, bytes)?;
    std::fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("nested").join("out.json");
        write_atomic(&path, b"{}").expect("write");
        assert_eq!(std::fs::read_to_string(&path).expect("read"), "{}");
        assert!(!dir.path().join("nested").join("out.json.tmp").exists());
    }

    #[test]
    fn test_overwrite_replaces_contents() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let path = dir.path().join("plot.svg");
        write_atomic(&path, b"first").expect("write");
        write_atomic(&path, b"second").expect("write");
        assert_eq!(std::fs::read(&path).expect("read"), b"second");
    }
}
