use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("failed to read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] std::io::Error),
}

/// Read the full content of a source file, distinguishing a missing path
/// from a read failure.
pub fn read_source(path: &Path) -> Result<String, IoError> {
    if !path.exists() {
        return Err(IoError::NotFound(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| IoError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Where sorted output goes: a file path (overwritten atomically) or the
/// standard output stream.
#[derive(Debug)]
pub enum Sink<'a> {
    Path(&'a Path),
    Stdout,
}

pub fn write_sink(sink: &Sink<'_>, content: &str) -> Result<(), IoError> {
    match sink {
        Sink::Path(path) => write_atomic(path, content),
        Sink::Stdout => {
            let mut out = std::io::stdout().lock();
            out.write_all(content.as_bytes())
                .and_then(|_| out.flush())
                .map_err(IoError::Stdout)
        }
    }
}

/// Writes via a temp file in the destination directory and renames it into
/// place, so a failed write never leaves the destination truncated.
fn write_atomic(path: &Path, content: &str) -> Result<(), IoError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|source| IoError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tmp.write_all(content.as_bytes())
        .map_err(|source| IoError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    tmp.persist(path).map_err(|e| IoError::Write {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn read_missing_file_is_not_found() {
        let result = read_source(Path::new("/no/such/file.tf"));
        assert!(matches!(result, Err(IoError::NotFound(_))));
    }

    #[test]
    fn read_returns_full_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("main.tf");
        fs::write(&path, "locals {\n  x = 1\n}\n").unwrap();
        assert_eq!(read_source(&path).unwrap(), "locals {\n  x = 1\n}\n");
    }

    #[test]
    fn write_creates_the_destination() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tf");
        write_sink(&Sink::Path(&path), "content\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "content\n");
    }

    #[test]
    fn write_overwrites_existing_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.tf");
        fs::write(&path, "old content that is longer\n").unwrap();
        write_sink(&Sink::Path(&path), "new\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new\n");
    }

    #[test]
    fn write_into_missing_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("out.tf");
        let result = write_sink(&Sink::Path(&path), "content\n");
        assert!(matches!(result, Err(IoError::Write { .. })));
        assert!(!path.exists());
    }
}
