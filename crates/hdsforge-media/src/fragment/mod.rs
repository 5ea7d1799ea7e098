//! Fragment files: descriptors, sinks, and the segmentation loop.
//!
//! A fragment file is a single `mdat` box whose content is a run of tags:
//!
//! ```text
//! u32 size | "mdat" | tag | tag | ...
//! ```

mod fragmenter;

pub use fragmenter::Fragmenter;

use crate::boxes::box_header;
use crate::timeline::to_millis;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// A closed fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Segment number (1-based).
    pub segment: u32,
    /// Fragment number (1-based, contiguous).
    pub index: u32,
    /// Start time in seconds.
    pub start: f64,
    /// Duration in seconds. Zero only for a terminal last fragment.
    pub duration: f64,
    /// Size of the tag stream, excluding the `mdat` header.
    pub data_size: u64,
    /// Where the sink stored the fragment.
    pub path: PathBuf,
}

impl Fragment {
    pub fn start_ms(&self) -> u64 {
        to_millis(self.start)
    }

    pub fn duration_ms(&self) -> u64 {
        to_millis(self.duration)
    }

    /// End time in seconds.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// File name of a fragment, as requested by HDS clients.
pub fn fragment_file_name(segment: u32, fragment: u32) -> String {
    format!("Seg{segment}-Frag{fragment}")
}

/// Destination for finished fragments.
pub trait FragmentSink {
    /// Store one fragment's tag stream, wrapped in an `mdat` box.
    ///
    /// Returns the location the fragment was written to.
    fn flush(&mut self, segment: u32, fragment: u32, tags: &[u8]) -> Result<PathBuf>;
}

/// Writes each fragment to `<dir>/Seg<S>-Frag<F>`, overwriting existing files.
#[derive(Debug, Clone)]
pub struct FileFragmentWriter {
    dir: PathBuf,
}

impl FileFragmentWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FragmentSink for FileFragmentWriter {
    fn flush(&mut self, segment: u32, fragment: u32, tags: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(fragment_file_name(segment, fragment));
        let header = box_header(b"mdat", tags.len())?;

        let file = File::create(&path).map_err(|e| Error::io(&path, e))?;
        let mut out = BufWriter::new(file);
        out.write_all(&header)
            .and_then(|_| out.write_all(tags))
            .and_then(|_| out.flush())
            .map_err(|e| Error::io(&path, e))?;

        Ok(path)
    }
}

/// A fragment kept in memory by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFragment {
    pub segment: u32,
    pub fragment: u32,
    /// Complete file contents, `mdat` header included.
    pub data: Vec<u8>,
}

/// Collects fragments in memory instead of writing files.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub fragments: Vec<StoredFragment>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes across all stored fragments.
    pub fn total_bytes(&self) -> u64 {
        self.fragments.iter().map(|f| f.data.len() as u64).sum()
    }
}

impl FragmentSink for MemorySink {
    fn flush(&mut self, segment: u32, fragment: u32, tags: &[u8]) -> Result<PathBuf> {
        let header = box_header(b"mdat", tags.len())?;
        let mut data = Vec::with_capacity(header.len() + tags.len());
        data.extend_from_slice(&header);
        data.extend_from_slice(tags);
        self.fragments.push(StoredFragment {
            segment,
            fragment,
            data,
        });
        Ok(PathBuf::from(fragment_file_name(segment, fragment)))
    }
}
