//! Demuxed media timeline handed over by the container parser.
//!
//! The parser itself lives outside this crate. It reports completion with a
//! [`ParseOutcome`]: either a ready [`Timeline`] (ordered samples plus track
//! capabilities) or a failure reason.

use serde::{Deserialize, Serialize};

/// Convert seconds to whole milliseconds, rounding to nearest.
///
/// Negative and NaN inputs map to zero.
pub fn to_millis(secs: f64) -> u64 {
    (secs * 1000.0).round() as u64
}

/// Media kind of a track or sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

/// A single demuxed sample.
///
/// Payload bytes are not owned: `offset`/`size` address the source buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Decode timestamp in seconds.
    pub timestamp: f64,
    /// Time until the next sample of the same track, in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Track this sample belongs to.
    pub track: TrackKind,
    /// Byte offset of the payload in the source file.
    pub offset: u64,
    /// Payload size in bytes.
    pub size: u32,
    /// Sync sample flag (video only).
    #[serde(default)]
    pub keyframe: bool,
    /// Presentation minus decode time, in track timescale units (video only).
    #[serde(default)]
    pub composition_offset: i64,
}

impl Sample {
    /// Whether this sample may start a new fragment.
    pub fn is_video_keyframe(&self) -> bool {
        self.track == TrackKind::Video && self.keyframe
    }
}

/// Per-track information reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackInfo {
    /// Track timescale (ticks per second).
    pub timescale: u32,
    /// Codec configuration record (avcC for video, AudioSpecificConfig for audio).
    #[serde(default, with = "hex_bytes")]
    pub extradata: Vec<u8>,
    /// Coded width in pixels (video only).
    #[serde(default)]
    pub width: u32,
    /// Coded height in pixels (video only).
    #[serde(default)]
    pub height: u32,
    /// Display width in pixels (video only).
    #[serde(default)]
    pub pwidth: u32,
    /// Display height in pixels (video only).
    #[serde(default)]
    pub pheight: u32,
    /// Sample rate in Hz (audio only).
    #[serde(default)]
    pub sample_rate: u32,
}

impl TrackInfo {
    /// Track info with the given timescale and codec configuration.
    pub fn new(timescale: u32, extradata: Vec<u8>) -> Self {
        Self {
            timescale,
            extradata,
            width: 0,
            height: 0,
            pwidth: 0,
            pheight: 0,
            sample_rate: 0,
        }
    }
}

/// Which tracks are present and how they are configured.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackCapabilities {
    #[serde(default)]
    pub video: Option<TrackInfo>,
    #[serde(default)]
    pub audio: Option<TrackInfo>,
    /// Overall bitrate in bits per second, if known.
    #[serde(default)]
    pub bitrate: u32,
}

impl TrackCapabilities {
    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Timescale of the given track, falling back to milliseconds.
    pub fn timescale(&self, kind: TrackKind) -> u32 {
        let track = match kind {
            TrackKind::Video => self.video.as_ref(),
            TrackKind::Audio => self.audio.as_ref(),
        };
        track.map(|t| t.timescale).filter(|&ts| ts > 0).unwrap_or(1000)
    }
}

/// A fully parsed source: samples in timestamp order plus track metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Total duration in seconds.
    pub duration: f64,
    #[serde(default)]
    pub capabilities: TrackCapabilities,
    #[serde(default)]
    pub samples: Vec<Sample>,
}

impl Timeline {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Sample at a zero-based index.
    pub fn get(&self, index: usize) -> Option<&Sample> {
        self.samples.get(index)
    }
}

/// Completion value of the upstream parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ParseOutcome {
    Ready(Timeline),
    Failed { reason: String },
}

impl ParseOutcome {
    /// Convert into a result, mapping a failed parse to [`crate::Error::Upstream`].
    pub fn into_timeline(self) -> crate::Result<Timeline> {
        match self {
            ParseOutcome::Ready(timeline) => Ok(timeline),
            ParseOutcome::Failed { reason } => Err(crate::Error::Upstream(reason)),
        }
    }
}

/// Serde adapter storing byte blobs as lowercase hex strings.
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex::decode(s.trim()).map_err(serde::de::Error::custom)
    }
}
