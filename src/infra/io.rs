use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use memmap2::Mmap;

const MMAP_THRESHOLD: u64 = 1024 * 1024; // 1 MiB

/// Source content, memory-mapped above the threshold.
pub enum FileContent {
    Mapped(Mmap),
    Buffered(String),
}

impl AsRef<str> for FileContent {
    fn as_ref(&self) -> &str {
        match self {
            // UTF-8 was validated when the map was created.
            FileContent::Mapped(mmap) => std::str::from_utf8(mmap).unwrap_or_default(),
            FileContent::Buffered(s) => s.as_str(),
        }
    }
}

pub fn read_file_smart<P: AsRef<Path>>(path: P) -> Result<FileContent> {
    let path = path.as_ref();
    let metadata = std::fs::metadata(path)
        .with_context(|| format!("Failed to read metadata for {}", path.display()))?;

    if metadata.len() > MMAP_THRESHOLD {
        let file =
            File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;

        // Safety: the map is only read, never resized or written through.
        let mmap = unsafe { Mmap::map(&file) }
            .with_context(|| format!("Failed to memory-map {}", path.display()))?;

        std::str::from_utf8(&mmap)
            .with_context(|| format!("{} is not valid UTF-8", path.display()))?;

        Ok(FileContent::Mapped(mmap))
    } else {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file {}", path.display()))?;

        Ok(FileContent::Buffered(content))
    }
}

/// Replace `path` with `content` atomically: the file is either fully old
/// or fully new, never a torn mix.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let dir = dir.unwrap_or_else(|| Path::new("."));

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file next to {}", path.display()))?;
    tmp.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    // Keep the original permissions across the rename.
    if let Ok(metadata) = std::fs::metadata(path) {
        let _ = std::fs::set_permissions(tmp.path(), metadata.permissions());
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_small_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.txt");
        std::fs::write(&path, "hello\n").unwrap();
        let content = read_file_smart(&path).unwrap();
        assert_eq!(content.as_ref(), "hello\n");
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "old\n").unwrap();

        write_atomic(&path, "new\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn write_atomic_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.txt");
        write_atomic(&path, "content\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "content\n");
    }
}
