//! Bootstrap index (`abst`) generation.
//!
//! The bootstrap box tells an HDS client how many fragments exist and where
//! each one starts, so it can request `Seg1-FragN` directly:
//!
//! ```text
//! abst
//! ├── header fields (version 14, timescale 1000, current media time, ...)
//! ├── asrt  segment run table: (first segment 1, N fragments)
//! └── afrt  fragment run table: (index, start ms, duration ms) per fragment
//! ```

mod parse;

pub use parse::parse_bootstrap;

use crate::boxes::{fullbox_header, write_box};
use crate::fragment::Fragment;
use crate::timeline::to_millis;
use crate::{Error, Result};
use bytes::{BufMut, BytesMut};
use std::path::Path;

/// Bootstrap info version written into every `abst`.
pub const BOOTSTRAP_INFO_VERSION: u32 = 14;
/// Timescale of all times in the index (milliseconds).
pub const TIMESCALE: u32 = 1000;

/// One entry of the segment run table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentRunEntry {
    pub first_segment: u32,
    pub fragments_per_segment: u32,
}

/// One entry of the fragment run table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentRunEntry {
    /// Fragment number (1-based).
    pub first_fragment: u32,
    /// Start time in `timescale` units.
    pub timestamp: u64,
    /// Duration in `timescale` units. Zero marks the end of the index.
    pub duration: u32,
    /// Discontinuity indicator, present only when `duration` is zero.
    pub discontinuity: Option<u8>,
}

/// Bootstrap index for a recorded (non-live) presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapIndex {
    pub bootstrap_version: u32,
    /// Profile (bits 6-7), live (bit 5) and update (bit 4) flags.
    pub profile_flags: u8,
    pub timescale: u32,
    /// Presentation length in `timescale` units.
    pub current_media_time: u64,
    pub segment_runs: Vec<SegmentRunEntry>,
    /// Timescale of the fragment run table.
    pub fragment_timescale: u32,
    pub fragment_runs: Vec<FragmentRunEntry>,
}

impl BootstrapIndex {
    /// Build the index for a finished fragment list.
    ///
    /// Only the last fragment may round to a zero-millisecond duration.
    pub fn from_fragments(fragments: &[Fragment], total_duration: f64) -> Result<Self> {
        let fragment_count = u32::try_from(fragments.len()).map_err(|_| Error::Overflow {
            field: "fragment count",
            value: fragments.len() as u64,
        })?;

        let mut fragment_runs = Vec::with_capacity(fragments.len());
        for (i, fragment) in fragments.iter().enumerate() {
            let number = i as u32 + 1;
            let duration_ms = fragment.duration_ms();
            let duration = u32::try_from(duration_ms).map_err(|_| Error::Overflow {
                field: "fragment duration",
                value: duration_ms,
            })?;

            let discontinuity = if duration == 0 {
                if number != fragment_count {
                    return Err(Error::ZeroDuration { index: number });
                }
                Some(0)
            } else {
                None
            };

            fragment_runs.push(FragmentRunEntry {
                first_fragment: number,
                timestamp: fragment.start_ms(),
                duration,
                discontinuity,
            });
        }

        Ok(Self {
            bootstrap_version: BOOTSTRAP_INFO_VERSION,
            profile_flags: 0,
            timescale: TIMESCALE,
            current_media_time: to_millis(total_duration),
            segment_runs: vec![SegmentRunEntry {
                first_segment: 1,
                fragments_per_segment: fragment_count,
            }],
            fragment_timescale: TIMESCALE,
            fragment_runs,
        })
    }

    /// Total number of fragments described by the segment run table.
    pub fn fragment_count(&self) -> u64 {
        self.segment_runs
            .iter()
            .map(|r| r.fragments_per_segment as u64)
            .sum()
    }

    /// Serialize the complete `abst` box.
    pub fn to_bytes(&self) -> Vec<u8> {
        let asrt = self.write_asrt();
        let afrt = self.write_afrt();

        let mut buf = BytesMut::with_capacity(64 + asrt.len() + afrt.len());
        buf.put_slice(&fullbox_header(0, 0));
        buf.put_u32(self.bootstrap_version);
        buf.put_u8(self.profile_flags);
        buf.put_u32(self.timescale);
        buf.put_u64(self.current_media_time);
        buf.put_u64(0); // smpte time code offset
        buf.put_u8(0); // movie identifier ""
        buf.put_u8(0); // server entry count
        buf.put_u8(0); // quality entry count
        buf.put_u8(0); // drm data ""
        buf.put_u8(0); // metadata ""
        buf.put_u8(1); // segment run table count
        buf.put_slice(&asrt);
        buf.put_u8(1); // fragment run table count
        buf.put_slice(&afrt);

        write_box(b"abst", &buf)
    }

    /// Write the `abst` box to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let data = self.to_bytes();
        std::fs::write(path, &data).map_err(|e| Error::io(path, e))?;
        tracing::info!(
            path = %path.display(),
            bytes = data.len(),
            fragments = self.fragment_runs.len(),
            "Wrote bootstrap"
        );
        Ok(())
    }

    fn write_asrt(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(9 + self.segment_runs.len() * 8);
        buf.put_slice(&fullbox_header(0, 0));
        buf.put_u8(0); // quality entry count
        buf.put_u32(self.segment_runs.len() as u32);
        for run in &self.segment_runs {
            buf.put_u32(run.first_segment);
            buf.put_u32(run.fragments_per_segment);
        }
        write_box(b"asrt", &buf)
    }

    fn write_afrt(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(13 + self.fragment_runs.len() * 17);
        buf.put_slice(&fullbox_header(0, 0));
        buf.put_u32(self.fragment_timescale);
        buf.put_u8(0); // quality entry count
        buf.put_u32(self.fragment_runs.len() as u32);
        for entry in &self.fragment_runs {
            buf.put_u32(entry.first_fragment);
            buf.put_u64(entry.timestamp);
            buf.put_u32(entry.duration);
            if entry.duration == 0 {
                buf.put_u8(entry.discontinuity.unwrap_or(0));
            }
        }
        write_box(b"afrt", &buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fragment(index: u32, start: f64, duration: f64) -> Fragment {
        Fragment {
            segment: 1,
            index,
            start,
            duration,
            data_size: 100,
            path: PathBuf::new(),
        }
    }

    fn read_u32(data: &[u8], offset: usize) -> u32 {
        u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    }

    fn read_u64(data: &[u8], offset: usize) -> u64 {
        let mut b = [0u8; 8];
        b.copy_from_slice(&data[offset..offset + 8]);
        u64::from_be_bytes(b)
    }

    #[test]
    fn test_abst_layout() {
        let fragments = vec![fragment(1, 0.0, 12.0), fragment(2, 12.0, 3.5)];
        let index = BootstrapIndex::from_fragments(&fragments, 15.5).unwrap();
        let data = index.to_bytes();

        assert_eq!(read_u32(&data, 0) as usize, data.len());
        assert_eq!(&data[4..8], b"abst");
        assert_eq!(&data[8..12], &[0, 0, 0, 0]); // version + flags
        assert_eq!(read_u32(&data, 12), 14);
        assert_eq!(data[16], 0); // profile/live/update
        assert_eq!(read_u32(&data, 17), 1000);
        assert_eq!(read_u64(&data, 21), 15500);
        assert_eq!(read_u64(&data, 29), 0);
        assert_eq!(&data[37..42], &[0, 0, 0, 0, 0]);
        assert_eq!(data[42], 1); // segment run table count

        // asrt
        let asrt_size = read_u32(&data, 43) as usize;
        assert_eq!(&data[47..51], b"asrt");
        assert_eq!(asrt_size, 8 + 4 + 1 + 4 + 8);
        assert_eq!(read_u32(&data, 56), 1); // entry count
        assert_eq!(read_u32(&data, 60), 1); // first segment
        assert_eq!(read_u32(&data, 64), 2); // fragments per segment

        // afrt
        let afrt_at = 43 + asrt_size;
        assert_eq!(data[afrt_at], 1); // fragment run table count
        let afrt_size = read_u32(&data, afrt_at + 1) as usize;
        assert_eq!(&data[afrt_at + 5..afrt_at + 9], b"afrt");
        assert_eq!(afrt_size, 8 + 4 + 4 + 1 + 4 + 2 * 16);
        assert_eq!(afrt_at + 1 + afrt_size, data.len());

        let entries = afrt_at + 1 + 8 + 4 + 4 + 1;
        assert_eq!(read_u32(&data, entries), 2); // entry count
        assert_eq!(read_u32(&data, entries + 4), 1);
        assert_eq!(read_u64(&data, entries + 8), 0);
        assert_eq!(read_u32(&data, entries + 16), 12000);
        assert_eq!(read_u32(&data, entries + 20), 2);
        assert_eq!(read_u64(&data, entries + 24), 12000);
        assert_eq!(read_u32(&data, entries + 32), 3500);
    }

    #[test]
    fn test_terminal_zero_duration_gets_discontinuity_byte() {
        let fragments = vec![fragment(1, 0.0, 10.0), fragment(2, 10.0, 0.0)];
        let index = BootstrapIndex::from_fragments(&fragments, 10.0).unwrap();

        assert_eq!(index.fragment_runs[1].duration, 0);
        assert_eq!(index.fragment_runs[1].discontinuity, Some(0));
        assert_eq!(index.fragment_runs[0].discontinuity, None);

        let with_marker = index.to_bytes().len();
        let without = BootstrapIndex::from_fragments(&fragments[..1], 10.0)
            .unwrap()
            .to_bytes()
            .len();
        assert_eq!(with_marker, without + 17);
    }

    #[test]
    fn test_zero_duration_before_last_rejected() {
        let fragments = vec![
            fragment(1, 0.0, 10.0),
            fragment(2, 10.0, 0.0),
            fragment(3, 10.0, 5.0),
        ];
        let err = BootstrapIndex::from_fragments(&fragments, 15.0).unwrap_err();
        assert!(matches!(err, Error::ZeroDuration { index: 2 }));
    }

    #[test]
    fn test_empty_fragment_list() {
        let index = BootstrapIndex::from_fragments(&[], 0.0).unwrap();
        assert_eq!(index.fragment_count(), 0);
        assert!(index.fragment_runs.is_empty());

        let data = index.to_bytes();
        let tail = &data[data.len() - 4..];
        assert_eq!(tail, &[0, 0, 0, 0]); // fragmentrunentrycount
    }

    #[test]
    fn test_duration_overflow() {
        let fragments = vec![fragment(1, 0.0, 5_000_000.0)];
        let err = BootstrapIndex::from_fragments(&fragments, 5_000_000.0).unwrap_err();
        assert!(matches!(err, Error::Overflow { field: "fragment duration", .. }));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootstrapinfo");
        let index = BootstrapIndex::from_fragments(&[fragment(1, 0.0, 4.0)], 4.0).unwrap();

        index.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), index.to_bytes());
    }
}
