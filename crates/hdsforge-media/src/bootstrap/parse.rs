//! Reading a bootstrap box back.

use super::{BootstrapIndex, FragmentRunEntry, SegmentRunEntry};
use crate::boxes::BoxReader;
use crate::{Error, Result};

/// Parse a complete `abst` box.
///
/// Quality, server, DRM and metadata strings are skipped. When several run
/// tables are present, their entries are concatenated in file order; the
/// fragment timescale is taken from the first `afrt`.
pub fn parse_bootstrap(data: &[u8]) -> Result<BootstrapIndex> {
    let mut outer = BoxReader::new(data);
    let abst = outer.expect_box(b"abst")?;
    if outer.remaining() != 0 {
        return Err(Error::invalid_bootstrap(format!(
            "{} trailing bytes after abst",
            outer.remaining()
        )));
    }

    let mut r = BoxReader::new(abst);
    let _version_flags = r.read_u32()?;
    let bootstrap_version = r.read_u32()?;
    let profile_flags = r.read_u8()?;
    let timescale = r.read_u32()?;
    let current_media_time = r.read_u64()?;
    let _smpte_offset = r.read_u64()?;
    r.read_cstring()?; // movie identifier
    skip_strings(&mut r)?; // server entries
    skip_strings(&mut r)?; // quality entries
    r.read_cstring()?; // drm data
    r.read_cstring()?; // metadata

    let mut segment_runs = Vec::new();
    for _ in 0..r.read_u8()? {
        let asrt = r.expect_box(b"asrt")?;
        segment_runs.extend(parse_asrt(asrt)?);
    }

    let mut fragment_timescale = None;
    let mut fragment_runs = Vec::new();
    for _ in 0..r.read_u8()? {
        let afrt = r.expect_box(b"afrt")?;
        let (ts, entries) = parse_afrt(afrt)?;
        fragment_timescale.get_or_insert(ts);
        fragment_runs.extend(entries);
    }

    Ok(BootstrapIndex {
        bootstrap_version,
        profile_flags,
        timescale,
        current_media_time,
        segment_runs,
        fragment_timescale: fragment_timescale.unwrap_or(timescale),
        fragment_runs,
    })
}

fn skip_strings(r: &mut BoxReader<'_>) -> Result<()> {
    for _ in 0..r.read_u8()? {
        r.read_cstring()?;
    }
    Ok(())
}

fn parse_asrt(content: &[u8]) -> Result<Vec<SegmentRunEntry>> {
    let mut r = BoxReader::new(content);
    let _version_flags = r.read_u32()?;
    skip_strings(&mut r)?;

    let count = r.read_u32()?;
    let mut entries = Vec::with_capacity((count as usize).min(r.remaining() / 8));
    for _ in 0..count {
        entries.push(SegmentRunEntry {
            first_segment: r.read_u32()?,
            fragments_per_segment: r.read_u32()?,
        });
    }
    Ok(entries)
}

fn parse_afrt(content: &[u8]) -> Result<(u32, Vec<FragmentRunEntry>)> {
    let mut r = BoxReader::new(content);
    let _version_flags = r.read_u32()?;
    let timescale = r.read_u32()?;
    skip_strings(&mut r)?;

    let count = r.read_u32()?;
    let mut entries = Vec::with_capacity((count as usize).min(r.remaining() / 16));
    for _ in 0..count {
        let first_fragment = r.read_u32()?;
        let timestamp = r.read_u64()?;
        let duration = r.read_u32()?;
        let discontinuity = if duration == 0 {
            Some(r.read_u8()?)
        } else {
            None
        };
        entries.push(FragmentRunEntry {
            first_fragment,
            timestamp,
            duration,
            discontinuity,
        });
    }
    Ok((timescale, entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boxes::write_box;
    use crate::fragment::Fragment;
    use std::path::PathBuf;

    fn fragments(spans: &[(f64, f64)]) -> Vec<Fragment> {
        spans
            .iter()
            .enumerate()
            .map(|(i, &(start, duration))| Fragment {
                segment: 1,
                index: i as u32 + 1,
                start,
                duration,
                data_size: 0,
                path: PathBuf::new(),
            })
            .collect()
    }

    #[test]
    fn test_round_trip_fragment_runs() {
        let frags = fragments(&[(0.0, 10.01), (10.01, 9.99), (20.0, 10.5), (30.5, 0.0)]);
        let built = BootstrapIndex::from_fragments(&frags, 30.5).unwrap();

        let parsed = parse_bootstrap(&built.to_bytes()).unwrap();
        assert_eq!(parsed, built);

        let spans: Vec<(u64, u32)> = parsed
            .fragment_runs
            .iter()
            .map(|e| (e.timestamp, e.duration))
            .collect();
        assert_eq!(spans, vec![(0, 10010), (10010, 9990), (20000, 10500), (30500, 0)]);
        assert_eq!(parsed.fragment_count(), 4);
    }

    #[test]
    fn test_round_trip_empty() {
        let built = BootstrapIndex::from_fragments(&[], 0.0).unwrap();
        let parsed = parse_bootstrap(&built.to_bytes()).unwrap();
        assert!(parsed.fragment_runs.is_empty());
        assert_eq!(parsed.segment_runs.len(), 1);
    }

    #[test]
    fn test_rejects_other_box() {
        let data = write_box(b"moov", &[0; 16]);
        assert!(matches!(
            parse_bootstrap(&data),
            Err(Error::InvalidBootstrap(_))
        ));
    }

    #[test]
    fn test_rejects_truncated() {
        let built = BootstrapIndex::from_fragments(&fragments(&[(0.0, 4.0)]), 4.0).unwrap();
        let mut data = built.to_bytes();
        data.truncate(data.len() - 3);
        assert!(parse_bootstrap(&data).is_err());
    }

    #[test]
    fn test_rejects_trailing_bytes() {
        let built = BootstrapIndex::from_fragments(&[], 0.0).unwrap();
        let mut data = built.to_bytes();
        data.push(0);
        assert!(matches!(
            parse_bootstrap(&data),
            Err(Error::InvalidBootstrap(_))
        ));
    }
}
