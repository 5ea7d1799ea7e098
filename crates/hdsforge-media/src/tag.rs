//! FLV-style tag encoding for fragment payloads.
//!
//! Every tag has the layout:
//!
//! ```text
//! type (u8) | data size (u24) | timestamp (u24) | timestamp ext (u8) | stream id (u24)
//! data (codec header + payload) | previous tag size (u32) = 11 + data size
//! ```

use crate::boxes::put_u24;
use crate::source::SourceBuffer;
use crate::timeline::{to_millis, Sample, TrackCapabilities, TrackKind};
use crate::{Error, Result};
use bytes::{BufMut, BytesMut};

/// Tag type for audio data.
pub const TAG_TYPE_AUDIO: u8 = 8;
/// Tag type for video data.
pub const TAG_TYPE_VIDEO: u8 = 9;
/// Fixed header before the tag data.
pub const TAG_HEADER_SIZE: usize = 11;
/// Trailing back-pointer after the tag data.
pub const PREVIOUS_TAG_SIZE_LEN: usize = 4;

/// AVC keyframe, NALU packet.
const VIDEO_KEYFRAME_NALU: [u8; 2] = [0x17, 0x01];
/// AVC inter frame, NALU packet.
const VIDEO_INTER_NALU: [u8; 2] = [0x27, 0x01];
/// AVC keyframe, sequence header, zero composition time.
const VIDEO_SEQUENCE_HEADER: [u8; 5] = [0x17, 0x00, 0x00, 0x00, 0x00];
/// AAC 44kHz 16-bit stereo, raw frame.
const AUDIO_RAW: [u8; 2] = [0xAF, 0x01];
/// AAC 44kHz 16-bit stereo, sequence header.
const AUDIO_SEQUENCE_HEADER: [u8; 2] = [0xAF, 0x00];

const MAX_U24: u64 = 0x00FF_FFFF;
const MIN_I24: i64 = -0x0080_0000;
const MAX_I24: i64 = 0x007F_FFFF;

/// Encodes samples of one source as tags.
pub struct TagEncoder<'a> {
    source: &'a SourceBuffer,
    capabilities: &'a TrackCapabilities,
}

impl<'a> TagEncoder<'a> {
    /// Create an encoder reading payloads from `source`.
    pub fn new(source: &'a SourceBuffer, capabilities: &'a TrackCapabilities) -> Self {
        Self {
            source,
            capabilities,
        }
    }

    /// Append the codec configuration tags: video first, then audio.
    ///
    /// Returns the number of bytes appended.
    pub fn encode_config_tags(&self, buf: &mut BytesMut) -> Result<usize> {
        let mut written = 0;
        if let Some(video) = &self.capabilities.video {
            written += write_tag(buf, TAG_TYPE_VIDEO, 0, &VIDEO_SEQUENCE_HEADER, &video.extradata)?;
        }
        if let Some(audio) = &self.capabilities.audio {
            written += write_tag(buf, TAG_TYPE_AUDIO, 0, &AUDIO_SEQUENCE_HEADER, &audio.extradata)?;
        }
        Ok(written)
    }

    /// Append the tag for the sample at `index`.
    ///
    /// Returns the number of bytes appended.
    pub fn encode_sample_tag(&self, index: usize, sample: &Sample, buf: &mut BytesMut) -> Result<usize> {
        let payload = self.source.slice(index, sample.offset, sample.size as u64)?;
        let timestamp_ms = to_millis(sample.timestamp);

        match sample.track {
            TrackKind::Video => {
                let frame = if sample.keyframe {
                    VIDEO_KEYFRAME_NALU
                } else {
                    VIDEO_INTER_NALU
                };
                let cts = composition_time_ms(
                    sample.composition_offset,
                    self.capabilities.timescale(TrackKind::Video),
                )?;
                let mut header = [0u8; 5];
                header[..2].copy_from_slice(&frame);
                header[2..].copy_from_slice(&cts.to_be_bytes()[1..]);
                write_tag(buf, TAG_TYPE_VIDEO, timestamp_ms, &header, payload)
            }
            TrackKind::Audio => write_tag(buf, TAG_TYPE_AUDIO, timestamp_ms, &AUDIO_RAW, payload),
        }
    }
}

/// Rescale a composition offset to milliseconds as a signed 24-bit value.
///
/// The result is returned in the low 24 bits of a `u32`.
fn composition_time_ms(offset: i64, timescale: u32) -> Result<u32> {
    let ms = (offset as f64 * 1000.0 / timescale as f64).round() as i64;
    if !(MIN_I24..=MAX_I24).contains(&ms) {
        return Err(Error::Overflow {
            field: "composition time offset",
            value: ms.unsigned_abs(),
        });
    }
    Ok((ms as i32 as u32) & MAX_U24 as u32)
}

/// Write one complete tag and return its length including the back-pointer.
fn write_tag(
    buf: &mut BytesMut,
    tag_type: u8,
    timestamp_ms: u64,
    codec_header: &[u8],
    payload: &[u8],
) -> Result<usize> {
    let data_size = (codec_header.len() + payload.len()) as u64;
    if data_size > MAX_U24 {
        return Err(Error::Overflow {
            field: "tag data size",
            value: data_size,
        });
    }
    let tag_size = TAG_HEADER_SIZE as u32 + data_size as u32;
    let ts = timestamp_ms as u32;

    buf.reserve(tag_size as usize + PREVIOUS_TAG_SIZE_LEN);
    buf.put_u8(tag_type);
    put_u24(buf, data_size as u32);
    put_u24(buf, ts);
    buf.put_u8((ts >> 24) as u8);
    put_u24(buf, 0); // stream id
    buf.put_slice(codec_header);
    buf.put_slice(payload);
    buf.put_u32(tag_size);

    Ok(tag_size as usize + PREVIOUS_TAG_SIZE_LEN)
}
