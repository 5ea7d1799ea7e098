//! Keyframe-aligned segmentation of a timeline into fragment files.

use super::{Fragment, FragmentSink};
use crate::source::SourceBuffer;
use crate::tag::TagEncoder;
use crate::timeline::{to_millis, Timeline};
use crate::{Error, Result};
use bytes::BytesMut;

/// Only one segment is ever produced.
const SEGMENT_INDEX: u32 = 1;

/// Splits a timeline into fragments of roughly `window` seconds.
///
/// A fragment is closed only at a video keyframe whose timestamp has reached
/// the next boundary, so fragments never split a GOP and may run longer than
/// the window when keyframes are sparse. After each cut the boundary advances
/// by exactly one window.
#[derive(Debug, Clone)]
pub struct Fragmenter {
    window: f64,
}

impl Fragmenter {
    /// Create a fragmenter with the given segmentation window in seconds.
    pub fn new(window_secs: f64) -> Result<Self> {
        if !window_secs.is_finite() || window_secs <= 0.0 {
            return Err(Error::invalid_config(format!(
                "segmentation window must be a positive number of seconds, got {window_secs}"
            )));
        }
        Ok(Self {
            window: window_secs,
        })
    }

    /// Segmentation window in seconds.
    pub fn window(&self) -> f64 {
        self.window
    }

    /// Encode every sample of `timeline` and hand finished fragments to `sink`.
    ///
    /// Returns the fragments in timestamp order. Codec configuration tags are
    /// written once, ahead of the first sample of the run.
    pub fn run<S: FragmentSink>(
        &self,
        timeline: &Timeline,
        source: &SourceBuffer,
        sink: &mut S,
    ) -> Result<Vec<Fragment>> {
        let encoder = TagEncoder::new(source, &timeline.capabilities);
        let mut state = RunState::new(self.window);
        let mut previous_ts = f64::NEG_INFINITY;

        for (index, sample) in timeline.samples.iter().enumerate() {
            let now = sample.timestamp;
            if !(now >= previous_ts) {
                return Err(Error::Unordered {
                    index,
                    timestamp: now,
                    previous: previous_ts,
                });
            }
            previous_ts = now;

            if sample.is_video_keyframe() && now >= state.boundary_ts {
                tracing::debug!(
                    sample = index,
                    timestamp = now,
                    boundary = state.boundary_ts,
                    "Keyframe reached boundary, closing fragment {}",
                    state.fragment_index
                );
                state.close(sink, now, false)?;
                state.boundary_ts += self.window;
            }

            if !state.config_written {
                state.running_total += encoder.encode_config_tags(&mut state.accum)? as u64;
                state.config_written = true;
            }

            tracing::trace!(
                sample = index,
                timestamp = now,
                timestamp_ms = to_millis(now),
                size = sample.size,
                "Encoding sample"
            );
            state.running_total += encoder.encode_sample_tag(index, sample, &mut state.accum)? as u64;
        }

        state.close(sink, timeline.duration, true)?;

        tracing::debug!(
            fragments = state.fragments.len(),
            bytes = state.running_total,
            "Fragmentation finished"
        );
        Ok(state.fragments)
    }
}

/// Mutable state of one fragmentation pass.
struct RunState {
    fragment_index: u32,
    boundary_ts: f64,
    segment_start_ts: f64,
    accum: BytesMut,
    running_total: u64,
    config_written: bool,
    fragments: Vec<Fragment>,
}

impl RunState {
    fn new(window: f64) -> Self {
        Self {
            fragment_index: 1,
            boundary_ts: window,
            segment_start_ts: 0.0,
            accum: BytesMut::with_capacity(1 << 20),
            running_total: 0,
            config_written: false,
            fragments: Vec::new(),
        }
    }

    /// Flush the accumulated tags as a fragment ending at `end_ts`.
    ///
    /// An empty accumulation produces no fragment and consumes no index.
    fn close<S: FragmentSink>(&mut self, sink: &mut S, end_ts: f64, is_final: bool) -> Result<()> {
        if self.accum.is_empty() {
            return Ok(());
        }

        let duration = end_ts - self.segment_start_ts;
        if duration < 0.0 {
            return Err(Error::NegativeDuration {
                index: self.fragment_index,
                duration,
            });
        }
        if !is_final && to_millis(duration) == 0 {
            return Err(Error::ZeroDuration {
                index: self.fragment_index,
            });
        }

        let path = sink.flush(SEGMENT_INDEX, self.fragment_index, &self.accum)?;
        tracing::info!(
            path = %path.display(),
            bytes = self.accum.len(),
            start = self.segment_start_ts,
            duration,
            "Wrote fragment {}",
            self.fragment_index
        );

        self.fragments.push(Fragment {
            segment: SEGMENT_INDEX,
            index: self.fragment_index,
            start: self.segment_start_ts,
            duration,
            data_size: self.accum.len() as u64,
            path,
        });

        self.fragment_index = self.fragment_index.checked_add(1).ok_or(Error::Overflow {
            field: "fragment index",
            value: u64::from(u32::MAX) + 1,
        })?;
        self.accum.clear();
        self.segment_start_ts = end_ts;
        Ok(())
    }
}
