//! Immutable source byte buffer backing sample payloads.

use crate::{Error, Result};
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// The whole source file, loaded once and shared read-only for the run.
///
/// Sample payloads are borrowed from it with [`SourceBuffer::slice`], which
/// checks every range against the real size of the file.
#[derive(Debug, Clone)]
pub struct SourceBuffer {
    data: Bytes,
    path: Option<PathBuf>,
}

impl SourceBuffer {
    /// Load the source file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::io(path, e))?;
        tracing::debug!(path = %path.display(), size = data.len(), "Loaded source file");
        Ok(Self {
            data: Bytes::from(data),
            path: Some(path.to_path_buf()),
        })
    }

    /// Wrap bytes that are already in memory.
    pub fn from_bytes(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            path: None,
        }
    }

    /// Size of the source in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Path the buffer was loaded from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Borrow `len` bytes starting at `offset`.
    ///
    /// `index` identifies the sample for error reporting.
    pub fn slice(&self, index: usize, offset: u64, len: u64) -> Result<&[u8]> {
        let out_of_range = || Error::SourceRange {
            index,
            offset,
            len,
            size: self.len(),
        };
        let end = offset.checked_add(len).ok_or_else(out_of_range)?;
        if end > self.len() {
            return Err(out_of_range());
        }
        Ok(&self.data[offset as usize..end as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_slice_in_bounds() {
        let src = SourceBuffer::from_bytes(vec![0u8, 1, 2, 3, 4, 5]);
        assert_eq!(src.slice(0, 2, 3).unwrap(), &[2, 3, 4]);
        assert_eq!(src.slice(0, 6, 0).unwrap(), &[] as &[u8]);
        assert_eq!(src.slice(0, 0, 6).unwrap().len(), 6);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let src = SourceBuffer::from_bytes(vec![0u8; 4]);
        let err = src.slice(7, 2, 3).unwrap_err();
        assert!(matches!(
            err,
            Error::SourceRange {
                index: 7,
                offset: 2,
                len: 3,
                size: 4
            }
        ));
    }

    #[test]
    fn test_slice_offset_overflow() {
        let src = SourceBuffer::from_bytes(vec![0u8; 4]);
        assert!(src.slice(0, u64::MAX, 2).is_err());
    }

    #[test]
    fn test_open_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"payload").unwrap();

        let src = SourceBuffer::open(file.path()).unwrap();
        assert_eq!(src.len(), 7);
        assert_eq!(src.path(), Some(file.path()));
        assert_eq!(src.slice(0, 3, 4).unwrap(), b"load");
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        let err = SourceBuffer::open(&missing).unwrap_err();
        assert!(matches!(err, Error::Io { ref path, .. } if path == &missing));
    }
}
