//! hdsforge-media: FLV tag encoding, HDS fragmentation, bootstrap and manifest generation
//!
//! This crate turns an already-demuxed media timeline into an Adobe HTTP
//! Dynamic Streaming output set that any static web server can serve.
//!
//! # Modules
//!
//! - `boxes` - Length-prefixed box writing and bounds-checked reading
//! - `timeline` - Samples, track capabilities and the upstream parse outcome
//! - `source` - Immutable, bounds-checked source byte buffer
//! - `tag` - FLV-style audio/video tag encoding
//! - `fragment` - Keyframe-aligned fragmentation and fragment sinks
//! - `bootstrap` - `abst`/`asrt`/`afrt` bootstrap index generation and parsing
//! - `manifest` - F4M manifest generation
//! - `packager` - The end-to-end run
//!
//! # Output
//!
//! ```text
//! <docroot>/<basedir>/
//! ├── manifest.f4m
//! ├── bootstrapinfo
//! └── samples/
//!     ├── Seg1-Frag1
//!     ├── Seg1-Frag2
//!     └── ...
//! ```
//!
//! Each run is single-threaded and synchronous. Fragments are written in
//! timestamp order, then the bootstrap, then the manifest.

pub mod bootstrap;
pub mod boxes;
pub mod config;
pub mod error;
pub mod fragment;
pub mod manifest;
pub mod packager;
pub mod source;
pub mod tag;
pub mod timeline;

pub use bootstrap::{parse_bootstrap, BootstrapIndex};
pub use config::PackagerConfig;
pub use error::{Error, Result};
pub use fragment::{FileFragmentWriter, Fragment, FragmentSink, Fragmenter, MemorySink};
pub use manifest::ManifestWriter;
pub use packager::{PackageReport, Packager};
pub use source::SourceBuffer;
pub use timeline::{ParseOutcome, Sample, Timeline, TrackCapabilities, TrackInfo, TrackKind};
