use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting materialized files.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Copy the tree under `src` into `dst`, creating only files that are
/// missing at the destination. Existing destination files are never touched,
/// so a user-modified file survives byte for byte and a partial prior copy
/// is filled in rather than redone.
///
/// Returns the destination paths that were actually created.
pub fn copy_missing(src: &Path, dst: &Path) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    copy_missing_inner(src, dst, &mut created)?;
    Ok(created)
}

fn copy_missing_inner(src: &Path, dst: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_missing_inner(&entry.path(), &target, created)?;
        } else if !target.exists() {
            std::fs::copy(entry.path(), &target)?;
            created.push(target);
        }
    }
    Ok(())
}

/// Set the executable bits on a file (0o755).
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

/// Symlink `target` into `dir` under its own file name, if not already
/// present. Returns true if a new link was created.
#[cfg(unix)]
pub fn link_into(target: &Path, dir: &Path) -> Result<bool> {
    std::fs::create_dir_all(dir)?;
    let Some(name) = target.file_name() else {
        return Ok(false);
    };
    let link = dir.join(name);
    if link.symlink_metadata().is_ok() {
        return Ok(false);
    }
    std::os::unix::fs::symlink(target, &link)?;
    Ok(true)
}

/// Replace content between `start_marker` and `end_marker` (inclusive) in a
/// file, or append the replacement if the markers are not present yet.
/// Creates the file when missing. Keeps repeated runs from stacking copies
/// of a managed block.
pub fn upsert_marked_block(
    path: &Path,
    start_marker: &str,
    end_marker: &str,
    replacement: &str,
) -> Result<()> {
    let content = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };

    if let Some(start_pos) = content.find(start_marker) {
        let search_from = start_pos + start_marker.len();
        if let Some(end_offset) = content[search_from..].find(end_marker) {
            let end_pos = search_from + end_offset + end_marker.len();
            let mut updated = String::with_capacity(content.len());
            updated.push_str(&content[..start_pos]);
            updated.push_str(replacement);
            updated.push_str(&content[end_pos..]);
            return atomic_write(path, updated.as_bytes());
        }
    }

    let sep = if content.is_empty() || content.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{sep}{replacement}")?;
    Ok(())
}

/// Append one line to a file, creating it if needed.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/test.txt");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn copy_missing_copies_tree() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(src.join("hooks")).unwrap();
        std::fs::write(src.join("settings.json"), "{}").unwrap();
        std::fs::write(src.join("hooks/pre-commit.sh"), "#!/bin/sh\n").unwrap();

        let created = copy_missing(&src, &dst).unwrap();
        assert_eq!(created.len(), 2);
        assert!(dst.join("settings.json").exists());
        assert!(dst.join("hooks/pre-commit.sh").exists());
    }

    #[test]
    fn copy_missing_preserves_existing_files() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(src.join("settings.json"), "template").unwrap();
        std::fs::write(dst.join("settings.json"), "user edited").unwrap();

        let created = copy_missing(&src, &dst).unwrap();
        assert!(created.is_empty());
        assert_eq!(
            std::fs::read_to_string(dst.join("settings.json")).unwrap(),
            "user edited"
        );
    }

    #[test]
    fn copy_missing_fills_in_partial_copy() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dst = dir.path().join("dst");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("one"), "1").unwrap();
        std::fs::write(src.join("two"), "2").unwrap();
        std::fs::create_dir_all(&dst).unwrap();
        std::fs::write(dst.join("one"), "1").unwrap();

        let created = copy_missing(&src, &dst).unwrap();
        assert_eq!(created, vec![dst.join("two")]);
    }

    #[test]
    fn upsert_marked_block_appends_then_replaces() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".bashrc");
        std::fs::write(&path, "export PS1='$ '\n").unwrap();

        upsert_marked_block(&path, "# >>> x >>>", "# <<< x <<<", "# >>> x >>>\nfirst\n# <<< x <<<")
            .unwrap();
        upsert_marked_block(&path, "# >>> x >>>", "# <<< x <<<", "# >>> x >>>\nsecond\n# <<< x <<<")
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("export PS1"));
        assert!(content.contains("second"));
        assert!(!content.contains("first"));
        assert_eq!(content.matches("# >>> x >>>").count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn link_into_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("helper.sh");
        std::fs::write(&target, "#!/bin/sh\n").unwrap();
        let bin = dir.path().join("bin");

        assert!(link_into(&target, &bin).unwrap());
        assert!(!link_into(&target, &bin).unwrap());
        assert!(bin.join("helper.sh").symlink_metadata().is_ok());
    }
}
